use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical status values every service-native status is translated into before comparison
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CanonicalStatus {
    /// Reading/watching now (current on Kitsu, CURRENT/REPEATING on AniList)
    Current,
    Completed,
    /// On hold (onHold on Kitsu)
    Paused,
    Dropped,
    /// Planned (planned on Kitsu)
    Planning,
}

impl CanonicalStatus {
    /// An entry without a native status is treated as planned
    pub fn or_planning(status: Option<CanonicalStatus>) -> CanonicalStatus {
        status.unwrap_or(CanonicalStatus::Planning)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Current => "CURRENT",
            CanonicalStatus::Completed => "COMPLETED",
            CanonicalStatus::Paused => "PAUSED",
            CanonicalStatus::Dropped => "DROPPED",
            CanonicalStatus::Planning => "PLANNING",
        }
    }
}

impl fmt::Display for CanonicalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
