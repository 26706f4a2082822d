//! promptboard-core - Core library for promptboard
//!
//! This crate contains the shared models, the realtime collection mirror,
//! optimistic voting, liked-prompt preferences and the submission gateway
//! used by every promptboard interface.

pub mod board;
pub mod config;
pub mod error;
pub mod mirror;
pub mod models;
pub mod preferences;
pub mod remote;
pub mod submission;
pub mod util;
pub mod view;
pub mod votes;

pub use board::PromptBoard;
pub use error::{Error, Result};
pub use models::{Category, NewPrompt, Prompt, PromptDraft, PromptId};
