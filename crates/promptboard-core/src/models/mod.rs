//! Data models for promptboard

mod category;
mod prompt;
mod timestamp;

pub use category::Category;
pub use prompt::{NewPrompt, Prompt, PromptDocument, PromptDraft, PromptId};
pub use timestamp::RawTimestamp;
