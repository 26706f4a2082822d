//! Prompt model

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{Category, RawTimestamp};

/// Opaque identifier assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptId(String);

impl PromptId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PromptId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PromptId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A shared prompt as mirrored from the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub id: PromptId,
    pub title: String,
    pub content: String,
    pub author: String,
    /// `None` when the stored category is missing or outside the known set
    pub category: Option<Category>,
    /// Net like count; never clamped
    pub votes: i64,
    /// Normalized creation instant
    pub created_at: Option<DateTime<Utc>>,
}

impl Prompt {
    /// Author for display, falling back for legacy documents without one.
    #[must_use]
    pub fn display_author(&self) -> &str {
        if self.author.trim().is_empty() {
            "Anonymous"
        } else {
            &self.author
        }
    }

    /// Creation instant used for ordering; missing timestamps sort as the epoch.
    #[must_use]
    pub fn created_at_millis(&self) -> i64 {
        self.created_at.map_or(0, |instant| instant.timestamp_millis())
    }
}

/// Raw document body as stored remotely.
///
/// Every field is optional on read so that partially-written documents still
/// show up in the mirror.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub votes: Option<i64>,
    #[serde(default)]
    pub created_at: Option<RawTimestamp>,
}

impl PromptDocument {
    /// Normalize a stored document into a [`Prompt`].
    #[must_use]
    pub fn into_prompt(self, id: PromptId) -> Prompt {
        Prompt {
            id,
            title: self.title.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            author: self.author.unwrap_or_default(),
            category: self.category.as_deref().and_then(Category::from_wire),
            votes: self.votes.unwrap_or(0),
            created_at: self.created_at.as_ref().and_then(RawTimestamp::normalize),
        }
    }
}

/// A validated prompt ready to be created remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrompt {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: Category,
    pub votes: i64,
    /// ISO-8601 creation time, millisecond precision
    pub created_at: String,
}

impl NewPrompt {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
        category: Category,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: author.into(),
            category,
            votes: 0,
            created_at: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// The stored document form of this prompt.
    #[must_use]
    pub fn to_document(&self) -> PromptDocument {
        PromptDocument {
            title: Some(self.title.clone()),
            content: Some(self.content.clone()),
            author: Some(self.author.clone()),
            category: Some(self.category.as_str().to_string()),
            votes: Some(self.votes),
            created_at: Some(RawTimestamp::Iso(self.created_at.clone())),
        }
    }
}

/// Editable submission form contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptDraft {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: Category,
}

impl PromptDraft {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
        category: Option<Category>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            author: author.into(),
            category: category.unwrap_or_default(),
        }
    }

    /// Reset the form to its initial state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.content.trim().is_empty()
            && self.author.trim().is_empty()
    }
}
