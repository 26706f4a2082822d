//! Filtering, search and ordering over the mirrored prompts.

use std::cmp::Reverse;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::Error;
use crate::models::{Category, Prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(self, prompt: &Prompt) -> bool {
        match self {
            Self::All => true,
            Self::Only(category) => prompt.category == Some(category),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently created first
    #[default]
    Newest,
    /// Most votes first
    Popular,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Newest => "newest",
            Self::Popular => "popular",
        })
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "popular" => Ok(Self::Popular),
            other => Err(Error::InvalidInput(format!("unknown sort order '{other}'"))),
        }
    }
}

/// What the user asked to see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub category: CategoryFilter,
    pub sort: SortOrder,
    /// Case-insensitive substring matched against title, content and author
    pub search: String,
}

impl ViewQuery {
    fn matches(&self, prompt: &Prompt, needle: &str) -> bool {
        if !self.category.matches(prompt) {
            return false;
        }
        needle.is_empty()
            || [&prompt.title, &prompt.content, &prompt.author]
                .into_iter()
                .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Filter and order prompts for display.
///
/// Ties are broken by id so the order is stable across snapshots.
pub fn select<'a, I>(prompts: I, query: &ViewQuery) -> Vec<&'a Prompt>
where
    I: IntoIterator<Item = &'a Prompt>,
{
    let needle = query.search.trim().to_lowercase();
    let mut selected = prompts
        .into_iter()
        .filter(|prompt| query.matches(prompt, &needle))
        .collect::<Vec<_>>();

    match query.sort {
        SortOrder::Popular => {
            selected.sort_by(|left, right| {
                right
                    .votes
                    .cmp(&left.votes)
                    .then_with(|| left.id.cmp(&right.id))
            });
        }
        SortOrder::Newest => {
            selected.sort_by_key(|prompt| (Reverse(prompt.created_at_millis()), prompt.id.clone()));
        }
    }

    selected
}
