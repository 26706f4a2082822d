//! Client configuration.
//!
//! Provides a `ClientConfig` struct used by every promptboard interface to
//! locate the remote collection and tune polling, timeouts and vote settling.
//! Values come from a JSON file and may be overridden by `PROMPTBOARD_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::normalize_text_option;

pub const DEFAULT_COLLECTION: &str = "prompts";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 500;

const ENV_PREFIX: &str = "PROMPTBOARD_";

/// Remote collection and client tuning.
///
/// The Firestore web API key is a public identifier, not a secret.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_submit_timeout_ms")]
    pub submit_timeout_ms: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default)]
    pub preferences_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            api_key: None,
            collection: default_collection(),
            database: default_database(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            submit_timeout_ms: DEFAULT_SUBMIT_TIMEOUT_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            preferences_path: None,
        }
    }
}

impl ClientConfig {
    /// Load a config file, returning defaults when it does not exist.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            Error::Config(format!(
                "failed to parse config at {}: {error}",
                path.display()
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        std::fs::write(path, serde_json::to_string_pretty(&normalized)?)?;
        Ok(())
    }

    /// Apply `PROMPTBOARD_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(format!("{ENV_PREFIX}{name}")).ok())
    }

    /// Apply overrides from an arbitrary lookup (keys without the prefix).
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = normalize_text_option(lookup("PROJECT_ID")) {
            self.project_id = Some(value);
        }
        if let Some(value) = normalize_text_option(lookup("API_KEY")) {
            self.api_key = Some(value);
        }
        if let Some(value) = normalize_text_option(lookup("COLLECTION")) {
            self.collection = value;
        }
        if let Some(value) = parse_millis(lookup("POLL_INTERVAL_MS")) {
            self.poll_interval_ms = value;
        }
        if let Some(value) = parse_millis(lookup("SUBMIT_TIMEOUT_MS")) {
            self.submit_timeout_ms = value;
        }
        if let Some(value) = parse_millis(lookup("SETTLE_DELAY_MS")) {
            self.settle_delay_ms = value;
        }
        if let Some(value) = normalize_text_option(lookup("PREFERENCES_PATH")) {
            self.preferences_path = Some(PathBuf::from(value));
        }
        self
    }

    /// Check that a remote connection can be built from this config.
    pub fn validate_remote(&self) -> Result<()> {
        let project_id = self
            .project_id
            .as_deref()
            .ok_or_else(|| Error::Config("project_id is required".to_string()))?;
        if !project_id_pattern().is_match(project_id) {
            return Err(Error::Config(format!(
                "project_id '{project_id}' is not a valid project identifier"
            )));
        }
        if self.api_key.is_none() {
            return Err(Error::Config("api_key is required".to_string()));
        }
        if self.collection.contains('/') {
            return Err(Error::Config(
                "collection must be a top-level collection name".to_string(),
            ));
        }
        Ok(())
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub const fn submit_timeout(&self) -> Duration {
        Duration::from_millis(self.submit_timeout_ms)
    }

    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    fn normalize(&mut self) {
        self.project_id = normalize_text_option(self.project_id.take());
        self.api_key = normalize_text_option(self.api_key.take());
        self.collection = normalize_text_option(Some(std::mem::take(&mut self.collection)))
            .unwrap_or_else(default_collection);
        self.database = normalize_text_option(Some(std::mem::take(&mut self.database)))
            .unwrap_or_else(default_database);
    }
}

// ---------------------------------------------------------------------------
// Private
// ---------------------------------------------------------------------------

fn project_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z][a-z0-9-]{4,28}[a-z0-9]$").expect("Invalid regex"))
}

fn parse_millis(value: Option<String>) -> Option<u64> {
    normalize_text_option(value)?.parse().ok()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

const fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

const fn default_submit_timeout_ms() -> u64 {
    DEFAULT_SUBMIT_TIMEOUT_MS
}

const fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load_from_path(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.settle_delay(), Duration::from_millis(500));
    }

    #[test]
    fn save_then_load_normalizes_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = ClientConfig {
            project_id: Some("  demo-project ".to_string()),
            collection: "  ".to_string(),
            ..Default::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = ClientConfig::load_from_path(&path).unwrap();
        assert_eq!(loaded.project_id.as_deref(), Some("demo-project"));
        assert_eq!(loaded.collection, "prompts");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"project_id": "demo-project", "unexpected": 1}"#).unwrap();

        let error = ClientConfig::load_from_path(&path).unwrap_err();
        assert!(error.to_string().contains("unknown field"));
    }

    #[test]
    fn overrides_replace_file_values() {
        let config = ClientConfig::default().with_overrides(|name| match name {
            "PROJECT_ID" => Some("override-project".to_string()),
            "SETTLE_DELAY_MS" => Some("250".to_string()),
            "POLL_INTERVAL_MS" => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(config.project_id.as_deref(), Some("override-project"));
        assert_eq!(config.settle_delay_ms, 250);
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn validate_remote_checks_project_id_shape() {
        let mut config = ClientConfig {
            project_id: Some("demo-project".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(config.validate_remote().is_ok());

        config.project_id = Some("Bad_Project".to_string());
        assert!(config.validate_remote().is_err());

        config.project_id = None;
        assert!(config.validate_remote().is_err());
    }
}
