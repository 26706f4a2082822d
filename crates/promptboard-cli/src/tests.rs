use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use pretty_assertions::assert_eq;
use promptboard_core::board::ListedPrompt;
use promptboard_core::config::ClientConfig;
use promptboard_core::mirror::{ConnectionStatus, MirrorState};
use promptboard_core::models::{PromptDocument, RawTimestamp};
use promptboard_core::preferences::MemoryPreferenceBackend;
use promptboard_core::remote::MemoryCollection;
use promptboard_core::view::{CategoryFilter, SortOrder, ViewQuery};
use promptboard_core::{Category, Prompt, PromptBoard, PromptId};

use crate::cli::{Cli, Commands, CompletionShell, ConfigCommands};
use crate::commands::common::{
    format_prompt_detail, format_prompt_lines, format_relative_time, format_status_line, normalize_content,
    normalize_prompt_identifier, prompt_to_list_item, resolve_prompt_id, text_preview,
};
use crate::commands::completions::render_completions;
use crate::commands::config::{apply_init_values, redact_key, redacted, run_config_init};
use crate::commands::like::toggle_like;
use crate::commands::list::load_listing;
use crate::commands::show::load_prompt;
use crate::commands::watch::render_update;
use crate::error::CliError;

const MARCH_FIRST_2024_MS: i64 = 1_709_294_400_000;

fn prompt(id: &str, votes: i64) -> Prompt {
    PromptDocument {
        title: Some(format!("Prompt {id}")),
        content: Some("Explain the borrow checker".to_string()),
        author: Some("ferris".to_string()),
        category: Some("code".to_string()),
        votes: Some(votes),
        created_at: Some(RawTimestamp::Native {
            seconds: MARCH_FIRST_2024_MS / 1000,
            nanoseconds: 0,
        }),
    }
    .into_prompt(PromptId::from(id))
}

fn listed(prompt: Prompt, liked: bool, voting: bool) -> ListedPrompt {
    ListedPrompt {
        prompt,
        liked,
        voting,
    }
}

fn state_with(ids: &[&str]) -> MirrorState {
    let prompts = ids
        .iter()
        .map(|id| (PromptId::from(*id), prompt(id, 0)))
        .collect::<HashMap<_, _>>();
    MirrorState {
        prompts: Arc::new(prompts),
        status: ConnectionStatus::Online,
        loading: false,
        ..Default::default()
    }
}

fn seeded_board(
    ids: &[(&str, i64)],
) -> (
    MemoryCollection,
    PromptBoard<MemoryCollection, MemoryPreferenceBackend>,
) {
    let remote = MemoryCollection::new();
    for (id, votes) in ids {
        remote.insert(
            *id,
            PromptDocument {
                title: Some(format!("Prompt {id}")),
                votes: Some(*votes),
                ..Default::default()
            },
        );
    }
    let board = PromptBoard::new(
        remote.clone(),
        MemoryPreferenceBackend::default(),
        &ClientConfig::default(),
    );
    (remote, board)
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn list_arguments_parse_into_view_types() {
    let cli = Cli::try_parse_from([
        "promptboard",
        "list",
        "--category",
        "SQL",
        "--sort",
        "popular",
        "--limit",
        "5",
    ])
    .unwrap();

    match cli.command {
        Some(Commands::List {
            category,
            sort,
            limit,
            json,
            ..
        }) => {
            assert_eq!(category, Some(CategoryFilter::Only(Category::Sql)));
            assert_eq!(sort, SortOrder::Popular);
            assert_eq!(limit, 5);
            assert!(!json);
        }
        _ => panic!("expected list command"),
    }
}

#[test]
fn unknown_category_is_rejected_by_parser() {
    assert!(Cli::try_parse_from(["promptboard", "list", "--category", "poetry"]).is_err());
    assert!(Cli::try_parse_from([
        "promptboard",
        "submit",
        "--title",
        "t",
        "--author",
        "a",
        "--category",
        "poetry",
    ])
    .is_err());
}

#[test]
fn global_flags_apply_to_subcommands() {
    let cli =
        Cli::try_parse_from(["promptboard", "like", "abc", "--config", "/tmp/pb.json"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/pb.json")));
    assert!(matches!(cli.command, Some(Commands::Like { id }) if id == "abc"));

    let cli = Cli::try_parse_from(["promptboard", "config", "show"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Config {
            command: ConfigCommands::Show
        })
    ));
}

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn prompt_identifier_must_not_be_blank() {
    assert_eq!(normalize_prompt_identifier("  abc ").unwrap(), "abc");
    assert!(matches!(
        normalize_prompt_identifier("   "),
        Err(CliError::EmptyPromptId)
    ));
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn text_preview_collapses_whitespace_and_truncates() {
    assert_eq!(text_preview("  Refactor   this\nsecond line", 40), "Refactor this");
    assert_eq!(
        text_preview("abcdefghijklmnopqrstuvwxyz", 10),
        "abcdefg..."
    );
}

#[test]
fn resolve_prompt_id_accepts_exact_and_unique_prefix() {
    let state = state_with(&["abc123", "abd456", "zzz"]);

    assert_eq!(resolve_prompt_id("zzz", &state).unwrap(), PromptId::from("zzz"));
    assert_eq!(
        resolve_prompt_id("abd", &state).unwrap(),
        PromptId::from("abd456")
    );
}

#[test]
fn resolve_prompt_id_reports_ambiguous_and_missing() {
    let state = state_with(&["abc123", "abd456"]);

    let error = resolve_prompt_id("ab", &state).unwrap_err();
    assert_eq!(
        error.to_string(),
        "ID prefix 'ab' is ambiguous; matches: abc123, abd456"
    );
    assert!(matches!(
        resolve_prompt_id("nope", &state),
        Err(CliError::PromptNotFound(query)) if query == "nope"
    ));
}

#[test]
fn prompt_lines_mark_liked_and_voting_prompts() {
    let now = MARCH_FIRST_2024_MS + 3 * 60 * 60_000;
    let lines = format_prompt_lines(
        &[
            listed(prompt("liked", 4), true, false),
            listed(prompt("voting", 2), false, true),
            listed(prompt("plain", 0), false, false),
        ],
        now,
    );

    assert!(lines[0].starts_with("* liked"));
    assert!(lines[1].starts_with("~ voting"));
    assert!(lines[2].starts_with("  plain"));
    assert!(lines[0].contains("ferris"));
    assert!(lines[0].ends_with("3h ago"));
}

#[test]
fn list_item_omits_time_for_undated_prompts() {
    let mut undated = prompt("undated", 1);
    undated.created_at = None;
    undated.author = String::new();

    let item = prompt_to_list_item(&listed(undated, false, false), MARCH_FIRST_2024_MS);
    assert_eq!(item.created_at, None);
    assert_eq!(item.relative_time, None);
    assert_eq!(item.author, "Anonymous");

    let item = prompt_to_list_item(
        &listed(prompt("dated", 1), true, false),
        MARCH_FIRST_2024_MS,
    );
    assert_eq!(item.created_at.as_deref(), Some("2024-03-01T12:00:00.000Z"));
    assert_eq!(item.category.as_deref(), Some("code"));
    assert!(item.liked);
}

#[test]
fn show_arguments_parse() {
    let cli = Cli::try_parse_from(["promptboard", "show", "abc", "--raw"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Show { id, json: false, raw: true }) if id == "abc"
    ));

    assert!(Cli::try_parse_from(["promptboard", "show", "abc", "--raw", "--json"]).is_err());
}

#[test]
fn prompt_detail_shows_label_and_full_content() {
    let mut item = listed(prompt("full", 7), true, false);
    item.prompt.content = "First line\nSecond line".to_string();
    let detail = format_prompt_detail(&item, MARCH_FIRST_2024_MS + 2 * 24 * 60 * 60_000);

    assert_eq!(
        detail,
        "Prompt full\n\
         ID:       full\n\
         Author:   ferris\n\
         Category: Coding\n\
         Votes:    7 (liked)\n\
         Created:  2024-03-01 12:00 UTC (2d ago)\n\
         \n\
         First line\nSecond line"
    );
}

#[test]
fn prompt_detail_skips_missing_date_and_category() {
    let mut bare = prompt("bare", 0);
    bare.created_at = None;
    bare.category = None;
    let detail = format_prompt_detail(&listed(bare, false, false), MARCH_FIRST_2024_MS);

    assert!(detail.contains("Category: -"));
    assert!(detail.contains("Votes:    0\n"));
    assert!(!detail.contains("Created:"));
}

#[test]
fn status_line_includes_error_text() {
    assert_eq!(
        format_status_line(ConnectionStatus::Error, Some("permission denied")),
        "Connection error: permission denied"
    );
    assert_eq!(format_status_line(ConnectionStatus::Online, None), "Live");
}

#[test]
fn watch_update_shows_only_header_while_loading() {
    let loading = MirrorState::default();
    let lines = render_update(&loading, &[], MARCH_FIRST_2024_MS);
    assert_eq!(lines, vec!["[12:00:00] Connecting... - 0 prompts".to_string()]);

    let state = state_with(&["a"]);
    let prompts = vec![listed(prompt("a", 1), false, false)];
    let lines = render_update(&state, &prompts, MARCH_FIRST_2024_MS);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], "[12:00:00] Live - 1 prompts");
}

#[test]
fn config_init_values_ignore_blank_flags() {
    let existing = ClientConfig {
        project_id: Some("prompt-library".to_string()),
        ..Default::default()
    };

    let updated = apply_init_values(
        existing,
        Some("   ".to_string()),
        Some(" web-key ".to_string()),
        None,
    );
    assert_eq!(updated.project_id.as_deref(), Some("prompt-library"));
    assert_eq!(updated.api_key.as_deref(), Some("web-key"));
    assert_eq!(updated.collection, "prompts");
}

#[test]
fn config_init_writes_loadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    run_config_init(
        &path,
        Some("prompt-library".to_string()),
        Some("AIzaSyExample".to_string()),
        Some("shared_prompts".to_string()),
    )
    .unwrap();

    let config = ClientConfig::load_from_path(&path).unwrap();
    assert_eq!(config.project_id.as_deref(), Some("prompt-library"));
    assert_eq!(config.collection, "shared_prompts");
    assert!(config.validate_remote().is_ok());
}

#[test]
fn api_key_is_redacted_for_display() {
    assert_eq!(redact_key("short"), "****");
    assert_eq!(redact_key("AIzaSyExampleKey"), "AIza****");

    let config = redacted(ClientConfig {
        api_key: Some("AIzaSyExampleKey".to_string()),
        ..Default::default()
    });
    assert_eq!(config.api_key.as_deref(), Some("AIza****"));
}

#[test]
fn completions_reference_binary_name() {
    for shell in [CompletionShell::Bash, CompletionShell::Zsh, CompletionShell::Fish] {
        let script = String::from_utf8(render_completions(shell)).unwrap();
        assert!(script.contains("promptboard"), "{shell:?} script");
    }
}

#[tokio::test]
async fn load_listing_applies_query_and_limit() {
    let (_remote, board) = seeded_board(&[("a", 3), ("b", 10), ("c", 1)]);
    let query = ViewQuery {
        sort: SortOrder::Popular,
        ..Default::default()
    };

    let prompts = load_listing(&board, &query, 2).await.unwrap();
    assert_eq!(
        prompts
            .iter()
            .map(|item| item.prompt.votes)
            .collect::<Vec<_>>(),
        vec![10, 3]
    );
}

#[tokio::test]
async fn show_resolves_prefix_to_full_prompt() {
    let (remote, board) = seeded_board(&[("other", 0)]);
    remote.insert(
        "prompt-long",
        PromptDocument {
            title: Some("Long one".to_string()),
            content: Some("Line one\nLine two\nLine three".to_string()),
            category: Some("sql".to_string()),
            votes: Some(4),
            ..Default::default()
        },
    );

    let item = load_prompt(&board, " prompt-l ").await.unwrap();
    assert_eq!(item.prompt.id, PromptId::from("prompt-long"));
    assert_eq!(item.prompt.content, "Line one\nLine two\nLine three");
    assert_eq!(item.prompt.category.map(Category::label), Some("Database"));
    assert!(!item.liked);

    let error = load_prompt(&board, "missing").await.unwrap_err();
    assert!(matches!(error, CliError::PromptNotFound(_)));
}

#[tokio::test]
async fn like_by_prefix_updates_remote_and_blocks_until_settled() {
    let (remote, board) = seeded_board(&[("prompt-one", 5), ("other", 0)]);

    let (id, liked) = toggle_like(&board, "prompt-o").await.unwrap();
    assert_eq!(id, PromptId::from("prompt-one"));
    assert!(liked);
    assert_eq!(remote.votes(&id), Some(6));
    assert_eq!(board.liked(), vec![id]);

    let error = toggle_like(&board, "prompt-one").await.unwrap_err();
    assert!(matches!(error, CliError::VoteInProgress));
    assert_eq!(remote.increment_calls(), 1);
}

#[tokio::test]
async fn like_failure_reports_rollback() {
    let (remote, board) = seeded_board(&[("a", 1)]);
    remote.fail_increments(Some("unavailable"));

    let error = toggle_like(&board, "a").await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Vote was not recorded and has been reverted: Remote store error: unavailable"
    );
    assert!(board.liked().is_empty());
    assert_eq!(remote.votes(&PromptId::from("a")), Some(1));
}

#[tokio::test]
async fn like_unknown_prompt_does_not_touch_remote() {
    let (remote, board) = seeded_board(&[("a", 1)]);

    let error = toggle_like(&board, "missing").await.unwrap_err();
    assert!(matches!(error, CliError::PromptNotFound(_)));
    assert_eq!(remote.increment_calls(), 0);
}
