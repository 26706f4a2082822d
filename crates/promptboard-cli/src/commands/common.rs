use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use promptboard_core::board::ListedPrompt;
use promptboard_core::config::ClientConfig;
use promptboard_core::mirror::{ConnectionStatus, MirrorState};
use promptboard_core::preferences::{FilePreferenceBackend, PreferenceBackend};
use promptboard_core::remote::{FirestoreCollection, RemoteCollection};
use promptboard_core::{PromptBoard, PromptId};
use serde::Serialize;

use crate::error::CliError;

/// How long one-shot commands wait for the first snapshot.
pub const LOAD_TIMEOUT: Duration = Duration::from_secs(15);

const SHORT_ID_LEN: usize = 10;

#[derive(Debug, Serialize)]
pub struct PromptListItem {
    pub id: String,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub votes: i64,
    pub liked: bool,
    pub voting: bool,
    pub created_at: Option<String>,
    pub relative_time: Option<String>,
    pub content: String,
}

pub type CliBoard = PromptBoard<FirestoreCollection, FilePreferenceBackend>;

pub fn open_board(config: &ClientConfig) -> Result<CliBoard, CliError> {
    let remote = FirestoreCollection::from_config(config)?;
    let preferences = open_preferences(config)?;
    Ok(PromptBoard::new(remote, preferences, config))
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("promptboard").join("config.json"))
        .ok_or_else(|| CliError::Config("failed to resolve config directory".to_string()))
}

pub fn default_data_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("promptboard"))
        .ok_or_else(|| CliError::Config("failed to resolve data directory".to_string()))
}

pub fn resolve_config_path(cli_config_path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    cli_config_path.map_or_else(default_config_path, Ok)
}

/// Config file contents with `PROMPTBOARD_*` overrides applied.
pub fn load_config(path: &Path) -> Result<ClientConfig, CliError> {
    Ok(ClientConfig::load_from_path(path)?.with_env_overrides())
}

pub fn open_preferences(config: &ClientConfig) -> Result<FilePreferenceBackend, CliError> {
    match &config.preferences_path {
        Some(path) => Ok(FilePreferenceBackend::new(path.clone())),
        None => Ok(FilePreferenceBackend::in_dir(&default_data_dir()?)),
    }
}

/// Connect and wait for the first delivery.
///
/// Fails when the subscription reports an error before any data arrived.
pub async fn connect_and_load<R, B>(
    board: &PromptBoard<R, B>,
    timeout: Duration,
) -> Result<MirrorState, CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    board.connect();
    let state = tokio::time::timeout(timeout, board.wait_until_loaded())
        .await
        .map_err(|_| CliError::LoadTimeout(timeout))??;

    if state.status == ConnectionStatus::Error {
        board.disconnect().await;
        return Err(CliError::Disconnected(
            state.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    Ok(state)
}

pub fn normalize_prompt_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyPromptId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Find a mirrored prompt by full id or unique id prefix.
pub fn resolve_prompt_id(query: &str, state: &MirrorState) -> Result<PromptId, CliError> {
    let exact = PromptId::from(query);
    if state.prompts.contains_key(&exact) {
        return Ok(exact);
    }

    let mut matching_ids = state
        .prompts
        .keys()
        .filter(|id| id.as_str().starts_with(query))
        .collect::<Vec<_>>();
    matching_ids.sort();

    match matching_ids.as_slice() {
        [] => Err(CliError::PromptNotFound(query.to_string())),
        [id] => Ok((*id).clone()),
        ids => {
            let options = ids
                .iter()
                .take(3)
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");
            Err(CliError::AmbiguousPromptId(format!(
                "ID prefix '{query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

pub fn short_id(id: &PromptId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

pub fn format_prompt_lines(prompts: &[ListedPrompt], now_ms: i64) -> Vec<String> {
    prompts
        .iter()
        .map(|item| {
            let prompt = &item.prompt;
            let marker = match (item.liked, item.voting) {
                (_, true) => '~',
                (true, false) => '*',
                (false, false) => ' ',
            };
            let category = prompt.category.map_or("-", |category| category.as_str());
            let title = text_preview(&prompt.title, 40);
            let relative_time = prompt
                .created_at
                .map_or_else(String::new, |_| {
                    format_relative_time(prompt.created_at_millis(), now_ms)
                });

            format!(
                "{marker} {:<10}  {:>5}  {category:<5}  {title:<40}  {:<16}  {relative_time}",
                short_id(&prompt.id),
                prompt.votes,
                text_preview(prompt.display_author(), 16),
            )
        })
        .collect()
}

/// Full multi-line rendering of a single prompt.
pub fn format_prompt_detail(item: &ListedPrompt, now_ms: i64) -> String {
    let prompt = &item.prompt;
    let mut lines = vec![
        prompt.title.clone(),
        format!("ID:       {}", prompt.id),
        format!("Author:   {}", prompt.display_author()),
        format!(
            "Category: {}",
            prompt.category.map_or("-", |category| category.label())
        ),
        format!(
            "Votes:    {}{}",
            prompt.votes,
            if item.liked { " (liked)" } else { "" }
        ),
    ];
    if let Some(created_at) = prompt.created_at {
        lines.push(format!(
            "Created:  {} ({})",
            created_at.format("%Y-%m-%d %H:%M UTC"),
            format_relative_time(prompt.created_at_millis(), now_ms)
        ));
    }
    lines.push(String::new());
    lines.push(prompt.content.clone());
    lines.join("\n")
}

pub fn prompt_to_list_item(item: &ListedPrompt, now_ms: i64) -> PromptListItem {
    let prompt = &item.prompt;
    PromptListItem {
        id: prompt.id.to_string(),
        title: prompt.title.clone(),
        author: prompt.display_author().to_string(),
        category: prompt.category.map(|category| category.as_str().to_string()),
        votes: prompt.votes,
        liked: item.liked,
        voting: item.voting,
        created_at: prompt
            .created_at
            .map(|created_at| created_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)),
        relative_time: prompt
            .created_at
            .map(|_| format_relative_time(prompt.created_at_millis(), now_ms)),
        content: prompt.content.clone(),
    }
}

pub fn format_status_line(status: ConnectionStatus, error: Option<&str>) -> String {
    match status {
        ConnectionStatus::Connecting => "Connecting...".to_string(),
        ConnectionStatus::Online => "Live".to_string(),
        ConnectionStatus::Error => format!(
            "Connection error: {}",
            error.unwrap_or("unknown error")
        ),
    }
}

pub fn text_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}
