use chrono::Utc;
use promptboard_core::board::ListedPrompt;
use promptboard_core::preferences::PreferenceBackend;
use promptboard_core::remote::RemoteCollection;
use promptboard_core::PromptBoard;

use crate::commands::common::{
    connect_and_load, format_prompt_detail, normalize_prompt_identifier, prompt_to_list_item,
    resolve_prompt_id, LOAD_TIMEOUT,
};
use crate::error::CliError;

pub async fn run_show<R, B>(
    board: &PromptBoard<R, B>,
    id: &str,
    as_json: bool,
    raw: bool,
) -> Result<(), CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    let item = load_prompt(board, id).await?;
    let now_ms = Utc::now().timestamp_millis();

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&prompt_to_list_item(&item, now_ms))?
        );
    } else if raw {
        println!("{}", item.prompt.content);
    } else {
        println!("{}", format_prompt_detail(&item, now_ms));
    }

    Ok(())
}

/// Look up the prompt matching `query` in one snapshot of the library.
pub async fn load_prompt<R, B>(
    board: &PromptBoard<R, B>,
    query: &str,
) -> Result<ListedPrompt, CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    let query = normalize_prompt_identifier(query)?;
    let state = connect_and_load(board, LOAD_TIMEOUT).await?;
    let item = resolve_prompt_id(&query, &state).and_then(|id| {
        board
            .prompt(&id)
            .ok_or_else(|| CliError::PromptNotFound(id.to_string()))
    });
    board.disconnect().await;
    item
}
