use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use promptboard_core::view::{CategoryFilter, SortOrder};
use promptboard_core::Category;

#[derive(Parser)]
#[command(name = "promptboard")]
#[command(about = "Browse, like and share AI prompts from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the client config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List prompts
    #[command(alias = "ls")]
    List {
        /// Only show one category (code, debug, sql, test or all)
        #[arg(short, long, value_name = "CATEGORY")]
        category: Option<CategoryFilter>,
        /// Sort order
        #[arg(short, long, default_value_t = SortOrder::Newest)]
        sort: SortOrder,
        /// Case-insensitive text matched against title, content and author
        #[arg(long, value_name = "TEXT")]
        search: Option<String>,
        /// Number of prompts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Follow the prompt library live until interrupted
    Watch {
        /// Only show one category (code, debug, sql, test or all)
        #[arg(short, long, value_name = "CATEGORY")]
        category: Option<CategoryFilter>,
        /// Sort order
        #[arg(short, long, default_value_t = SortOrder::Popular)]
        sort: SortOrder,
        /// Number of prompts to show per update
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Print one prompt in full
    Show {
        /// Prompt ID or unique ID prefix
        id: String,

        /// Output as JSON
        #[arg(long, conflicts_with = "raw")]
        json: bool,

        /// Print only the prompt text, for piping into a clipboard tool
        #[arg(long)]
        raw: bool,
    },
    /// Like a prompt, or remove your like if you already liked it
    Like {
        /// Prompt ID or unique ID prefix
        id: String,
    },
    /// Share a new prompt
    Submit {
        /// Prompt title
        #[arg(long)]
        title: String,
        /// Prompt text (read from piped stdin when omitted)
        #[arg(long)]
        content: Option<String>,
        /// Name shown as the author
        #[arg(long)]
        author: String,
        /// Prompt category
        #[arg(long, default_value_t = Category::Code)]
        category: Category,
    },
    /// Show the prompts liked on this device
    Liked {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage the client config file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the config file
    Init {
        /// Firestore project id
        #[arg(long, value_name = "ID")]
        project_id: Option<String>,
        /// Firestore web API key
        #[arg(long, value_name = "KEY")]
        api_key: Option<String>,
        /// Collection holding the prompts
        #[arg(long, value_name = "NAME")]
        collection: Option<String>,
    },
    /// Print the effective config, environment overrides included
    Show,
}
