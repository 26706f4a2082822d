use std::io;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] promptboard_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Prompt ID cannot be empty")]
    EmptyPromptId,
    #[error("Prompt not found for id/prefix: {0}")]
    PromptNotFound(String),
    #[error("{0}")]
    AmbiguousPromptId(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Disconnected from prompt library: {0}")]
    Disconnected(String),
    #[error("Timed out after {0:?} waiting for the prompt library")]
    LoadTimeout(Duration),
    #[error("Vote was not recorded and has been reverted: {0}")]
    VoteFailed(String),
    #[error("A vote on this prompt is still settling; try again in a moment")]
    VoteInProgress,
}
