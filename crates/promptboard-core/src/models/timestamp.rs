//! Creation timestamps as they arrive from the remote store.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A creation timestamp in one of the two shapes the remote store hands out.
///
/// Older documents carry an ISO-8601 string written by the client; others carry
/// the store's native `{seconds, nanoseconds}` timestamp. Both are normalized to
/// a single instant on ingestion with [`RawTimestamp::normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Native {
        #[serde(alias = "_seconds")]
        seconds: i64,
        #[serde(alias = "_nanoseconds", alias = "nanos", default)]
        nanoseconds: u32,
    },
    Iso(String),
}

impl RawTimestamp {
    /// Build a native timestamp from an instant.
    #[must_use]
    pub fn native(instant: DateTime<Utc>) -> Self {
        Self::Native {
            seconds: instant.timestamp(),
            nanoseconds: instant.timestamp_subsec_nanos(),
        }
    }

    /// Resolve to a UTC instant, or `None` when the value cannot be interpreted.
    #[must_use]
    pub fn normalize(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Native {
                seconds,
                nanoseconds,
            } => DateTime::from_timestamp(*seconds, *nanoseconds),
            Self::Iso(raw) => parse_iso(raw),
        }
    }
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    // Offset-less values are read as UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
