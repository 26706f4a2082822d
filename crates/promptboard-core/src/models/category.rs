//! Prompt category model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The fixed set of prompt categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Code generation prompts
    #[default]
    Code,
    /// Debugging prompts
    Debug,
    /// Database and query prompts
    Sql,
    /// Test-writing prompts
    Test,
}

impl Category {
    pub const ALL: [Self; 4] = [Self::Code, Self::Debug, Self::Sql, Self::Test];

    /// Wire identifier stored in the remote collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Debug => "debug",
            Self::Sql => "sql",
            Self::Test => "test",
        }
    }

    /// Human-readable label for listings.
    /// Category stored in a document. Stored values are matched exactly.
    #[must_use]
    pub fn from_wire(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == raw)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Code => "Coding",
            Self::Debug => "Debugging",
            Self::Sql => "Database",
            Self::Test => "Testing",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
            .ok_or_else(|| Error::InvalidInput(format!("unknown category '{}'", s.trim())))
    }
}
