use chrono::Utc;
use promptboard_core::board::ListedPrompt;
use promptboard_core::mirror::{ConnectionStatus, MirrorState};
use promptboard_core::preferences::PreferenceBackend;
use promptboard_core::remote::RemoteCollection;
use promptboard_core::view::ViewQuery;
use promptboard_core::PromptBoard;

use crate::commands::common::{format_prompt_lines, format_status_line};
use crate::error::CliError;

/// Print the library every time it changes, until Ctrl-C or a subscription error.
pub async fn run_watch<R, B>(
    board: &PromptBoard<R, B>,
    query: &ViewQuery,
    limit: usize,
) -> Result<(), CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    let mut watcher = board.mirror().watch();
    board.connect();

    let mut last_rendered = None;
    let result = loop {
        let state = watcher.borrow_and_update().clone();
        let key = (state.revision, state.status);
        if last_rendered != Some(key) {
            let mut prompts = board.listing(query);
            prompts.truncate(limit);
            for line in render_update(&state, &prompts, Utc::now().timestamp_millis()) {
                println!("{line}");
            }
            last_rendered = Some(key);
        }

        if state.status == ConnectionStatus::Error {
            break Err(CliError::Disconnected(
                state.error.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        tokio::select! {
            signal = tokio::signal::ctrl_c() => break signal.map_err(CliError::Io),
            changed = watcher.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
            }
        }
    };

    board.disconnect().await;
    result
}

pub fn render_update(state: &MirrorState, prompts: &[ListedPrompt], now_ms: i64) -> Vec<String> {
    let timestamp = chrono::DateTime::from_timestamp_millis(now_ms)
        .map_or_else(String::new, |now| now.format("%H:%M:%S").to_string());
    let status = format_status_line(state.status, state.error.as_deref());

    let mut lines = vec![format!(
        "[{timestamp}] {status} - {} prompts",
        state.prompts.len()
    )];
    if !state.loading {
        lines.extend(format_prompt_lines(prompts, now_ms));
    }
    lines
}
