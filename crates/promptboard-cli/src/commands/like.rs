use promptboard_core::preferences::PreferenceBackend;
use promptboard_core::remote::RemoteCollection;
use promptboard_core::votes::ToggleOutcome;
use promptboard_core::{PromptBoard, PromptId};

use crate::commands::common::{
    connect_and_load, normalize_prompt_identifier, resolve_prompt_id, LOAD_TIMEOUT,
};
use crate::error::CliError;

pub async fn run_like<R, B>(board: &PromptBoard<R, B>, id: &str) -> Result<(), CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    let (id, liked) = toggle_like(board, id).await?;
    if liked {
        println!("Liked {id}");
    } else {
        println!("Removed like from {id}");
    }
    Ok(())
}

/// Toggle the like on the prompt matching `query`, returning the new state.
pub async fn toggle_like<R, B>(
    board: &PromptBoard<R, B>,
    query: &str,
) -> Result<(PromptId, bool), CliError>
where
    R: RemoteCollection,
    B: PreferenceBackend,
{
    let query = normalize_prompt_identifier(query)?;
    let state = connect_and_load(board, LOAD_TIMEOUT).await?;
    let toggled = match resolve_prompt_id(&query, &state) {
        Ok(id) => {
            let outcome = board.toggle_like(&id).await;
            Ok((id, outcome))
        }
        Err(error) => Err(error),
    };
    board.disconnect().await;

    let (id, outcome) = toggled?;
    match outcome {
        ToggleOutcome::Committed { liked } => Ok((id, liked)),
        ToggleOutcome::RolledBack { error, .. } => Err(CliError::VoteFailed(error)),
        ToggleOutcome::Ignored => Err(CliError::VoteInProgress),
    }
}
