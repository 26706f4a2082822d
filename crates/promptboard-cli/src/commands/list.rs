use chrono::Utc;
use promptboard_core::board::ListedPrompt;
use promptboard_core::preferences::PreferenceBackend;
use promptboard_core::remote::RemoteCollection;
use promptboard_core::view::ViewQuery;
use promptboard_core::PromptBoard;

use crate::commands::common::{
    connect_and_load, format_prompt_lines, prompt_to_list_item, PromptListItem, LOAD_TIMEOUT,
};
use crate::error::CliError;

pub async fn run_list<R, B>(
    board: &PromptBoard<R, B>,
    query: &ViewQuery,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    let prompts = load_listing(board, query, limit).await?;
    let now_ms = Utc::now().timestamp_millis();

    if as_json {
        let json_items = prompts
            .iter()
            .map(|item| prompt_to_list_item(item, now_ms))
            .collect::<Vec<PromptListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if prompts.is_empty() {
        println!("No prompts found");
    } else {
        for line in format_prompt_lines(&prompts, now_ms) {
            println!("{line}");
        }
    }

    Ok(())
}

/// One snapshot of the library, filtered and ordered.
pub async fn load_listing<R, B>(
    board: &PromptBoard<R, B>,
    query: &ViewQuery,
    limit: usize,
) -> Result<Vec<ListedPrompt>, CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    connect_and_load(board, LOAD_TIMEOUT).await?;
    let mut prompts = board.listing(query);
    prompts.truncate(limit);
    board.disconnect().await;
    Ok(prompts)
}
