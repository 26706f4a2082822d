use std::path::Path;

use promptboard_core::config::ClientConfig;
use promptboard_core::util::normalize_text_option;

use crate::commands::common::load_config;
use crate::error::CliError;

pub fn run_config_init(
    path: &Path,
    project_id: Option<String>,
    api_key: Option<String>,
    collection: Option<String>,
) -> Result<(), CliError> {
    let existing = ClientConfig::load_from_path(path)?;
    let config = apply_init_values(existing, project_id, api_key, collection);
    config.save_to_path(path)?;
    println!("Config written to {}", path.display());

    match config.validate_remote() {
        Ok(()) => println!(
            "Ready to read '{}' from project '{}'. Run `promptboard list`.",
            config.collection,
            config.project_id.as_deref().unwrap_or_default()
        ),
        Err(error) => println!("Config is incomplete: {error}"),
    }

    Ok(())
}

pub fn run_config_show(path: &Path) -> Result<(), CliError> {
    let config = redacted(load_config(path)?);
    eprintln!("{}", path.display());
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Merge `config init` flags into an existing config; blank flags are ignored.
pub fn apply_init_values(
    mut config: ClientConfig,
    project_id: Option<String>,
    api_key: Option<String>,
    collection: Option<String>,
) -> ClientConfig {
    if let Some(value) = normalize_text_option(project_id) {
        config.project_id = Some(value);
    }
    if let Some(value) = normalize_text_option(api_key) {
        config.api_key = Some(value);
    }
    if let Some(value) = normalize_text_option(collection) {
        config.collection = value;
    }
    config
}

pub fn redacted(mut config: ClientConfig) -> ClientConfig {
    config.api_key = config.api_key.as_deref().map(redact_key);
    config
}

pub fn redact_key(key: &str) -> String {
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        let prefix = key.chars().take(4).collect::<String>();
        format!("{prefix}****")
    }
}
