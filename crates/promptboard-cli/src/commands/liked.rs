use promptboard_core::preferences::{LikeStore, PreferenceBackend};

use crate::error::CliError;

pub fn run_liked<B: PreferenceBackend>(backend: B, as_json: bool) -> Result<(), CliError> {
    let liked = LikeStore::load(backend).liked();

    if as_json {
        println!("{}", serde_json::to_string_pretty(&liked)?);
    } else if liked.is_empty() {
        println!("No liked prompts yet");
    } else {
        for id in liked {
            println!("{id}");
        }
    }

    Ok(())
}
