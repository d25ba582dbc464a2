//! The galaxy tick value

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw tick value as reported by the tick API.
///
/// Compared as an opaque string: two ticks are the same only if the API
/// returned byte-identical values. Parsing is only done for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tick(String);

impl Tick {
    /// Wrap a raw API value. Empty values are not ticks.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            None
        } else {
            Some(Self(raw))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the ISO-8601 value into a point in time.
    ///
    /// A trailing `Z` is offset zero. Values without any offset are read as UTC.
    pub fn instant(&self) -> crate::Result<DateTime<FixedOffset>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&self.0) {
            return Ok(dt);
        }
        NaiveDateTime::parse_from_str(&self.0, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc().fixed_offset())
            .map_err(|e| {
                crate::GaltickError::Parse(format!("Invalid tick timestamp '{}': {}", self.0, e))
            })
    }

    /// Parsed instant in UTC
    pub fn instant_utc(&self) -> crate::Result<DateTime<Utc>> {
        self.instant().map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
