//! promptboard CLI - browse, like and share community prompts from the terminal

mod cli;
mod commands;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use promptboard_core::view::ViewQuery;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::commands::common::{load_config, open_board, open_preferences, resolve_config_path};
use crate::commands::completions::run_completions;
use crate::commands::config::{run_config_init, run_config_show};
use crate::commands::like::run_like;
use crate::commands::liked::run_liked;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::submit::run_submit;
use crate::commands::watch::run_watch;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "promptboard=info"
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config)?;

    let Some(command) = cli.command else {
        Cli::command().print_help().map_err(CliError::Io)?;
        println!();
        return Ok(());
    };

    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Init {
                project_id,
                api_key,
                collection,
            } => run_config_init(&config_path, project_id, api_key, collection)?,
            ConfigCommands::Show => run_config_show(&config_path)?,
        },
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
        Commands::Liked { json } => {
            let config = load_config(&config_path)?;
            run_liked(open_preferences(&config)?, json)?;
        }
        Commands::List {
            category,
            sort,
            search,
            limit,
            json,
        } => {
            let config = load_config(&config_path)?;
            let board = open_board(&config)?;
            let query = ViewQuery {
                category: category.unwrap_or_default(),
                sort,
                search: search.unwrap_or_default(),
            };
            run_list(&board, &query, limit, json).await?;
        }
        Commands::Watch {
            category,
            sort,
            limit,
        } => {
            let config = load_config(&config_path)?;
            let board = open_board(&config)?;
            let query = ViewQuery {
                category: category.unwrap_or_default(),
                sort,
                ..Default::default()
            };
            run_watch(&board, &query, limit).await?;
        }
        Commands::Show { id, json, raw } => {
            let config = load_config(&config_path)?;
            let board = open_board(&config)?;
            run_show(&board, &id, json, raw).await?;
        }
        Commands::Like { id } => {
            let config = load_config(&config_path)?;
            let board = open_board(&config)?;
            run_like(&board, &id).await?;
        }
        Commands::Submit {
            title,
            content,
            author,
            category,
        } => {
            let config = load_config(&config_path)?;
            let board = open_board(&config)?;
            run_submit(&board, &title, content.as_deref(), &author, category).await?;
        }
    }

    Ok(())
}
