pub mod common;
pub mod completions;
pub mod config;
pub mod like;
pub mod liked;
pub mod list;
pub mod show;
pub mod submit;
pub mod watch;
