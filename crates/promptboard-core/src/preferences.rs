//! Device-local liked-prompt preferences.
//!
//! The liked set lives in a single named slot as a JSON array of strings and
//! is rewritten in full on every change. It is never reconciled with the
//! remote vote counters.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::Result;
use crate::models::PromptId;
use crate::util::lock;

/// Name of the persisted slot holding liked prompt ids.
pub const LIKED_PROMPTS_SLOT: &str = "liked_prompts";

/// Raw storage for the liked-prompt slot.
pub trait PreferenceBackend: Send + Sync + 'static {
    /// Read the serialized slot, `None` when nothing has been stored yet.
    fn load_raw(&self) -> Result<Option<String>>;
    /// Overwrite the serialized slot.
    fn save_raw(&self, raw: &str) -> Result<()>;
}

/// Slot stored as a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FilePreferenceBackend {
    path: PathBuf,
}

impl FilePreferenceBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot file inside `dir`, named after the slot.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(format!("{LIKED_PROMPTS_SLOT}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceBackend for FilePreferenceBackend {
    fn load_raw(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn save_raw(&self, raw: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}

/// Slot kept in memory; clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferenceBackend {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryPreferenceBackend {
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// Current serialized slot contents.
    pub fn raw(&self) -> Option<String> {
        lock(&self.slot).clone()
    }
}

impl PreferenceBackend for MemoryPreferenceBackend {
    fn load_raw(&self) -> Result<Option<String>> {
        Ok(self.raw())
    }

    fn save_raw(&self, raw: &str) -> Result<()> {
        *lock(&self.slot) = Some(raw.to_string());
        Ok(())
    }
}

/// The liked set for this device, backed by a [`PreferenceBackend`].
pub struct LikeStore<B: PreferenceBackend> {
    backend: B,
    liked: Mutex<BTreeSet<PromptId>>,
}

impl<B: PreferenceBackend> LikeStore<B> {
    /// Load the liked set once. Unreadable or malformed slots start empty.
    pub fn load(backend: B) -> Self {
        let liked = match backend.load_raw() {
            Ok(Some(raw)) => parse_liked(&raw),
            Ok(None) => BTreeSet::new(),
            Err(error) => {
                tracing::warn!("Failed to read liked prompts: {}", error);
                BTreeSet::new()
            }
        };
        tracing::debug!("Loaded {} liked prompts", liked.len());

        Self {
            backend,
            liked: Mutex::new(liked),
        }
    }

    pub fn contains(&self, id: &PromptId) -> bool {
        lock(&self.liked).contains(id)
    }

    /// Set membership for `id`, persisting the whole set when it changes.
    ///
    /// Returns whether membership changed. The in-memory set is updated even
    /// when persisting fails. The set stays locked until the slot is written,
    /// so the last write always holds the latest set.
    pub fn set(&self, id: &PromptId, liked: bool) -> Result<bool> {
        let mut set = lock(&self.liked);
        let changed = if liked {
            set.insert(id.clone())
        } else {
            set.remove(id)
        };
        if !changed {
            return Ok(false);
        }

        self.backend.save_raw(&serialize_liked(&set)?)?;
        Ok(true)
    }

    /// Liked ids in stable order.
    pub fn liked(&self) -> Vec<PromptId> {
        lock(&self.liked).iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.liked).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a persisted slot, coercing every id to its canonical string form.
///
/// Anything other than a JSON array yields an empty set.
pub fn parse_liked(raw: &str) -> BTreeSet<PromptId> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(canonical_id)
            .map(PromptId::from)
            .collect(),
        Ok(_) => BTreeSet::new(),
        Err(error) => {
            tracing::warn!("Ignoring malformed liked prompts slot: {}", error);
            BTreeSet::new()
        }
    }
}

fn canonical_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(number) => Some(canonical_number(number)),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn canonical_number(number: &serde_json::Number) -> String {
    // 2.0 and 2 name the same id
    if number.is_f64() {
        if let Some(float) = number.as_f64().filter(|float| float.is_finite()) {
            if float.fract() == 0.0 {
                return format!("{float:.0}");
            }
        }
    }
    number.to_string()
}

fn serialize_liked(set: &BTreeSet<PromptId>) -> Result<String> {
    Ok(serde_json::to_string(
        &set.iter().map(PromptId::as_str).collect::<Vec<_>>(),
    )?)
}
