use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Description used when an update arrives without one.
pub const DEFAULT_CHANGE_DESCRIPTION: &str = "Design updated";

/// An append-only record that a design moved to `version`.
///
/// History answers "what changed and when", not "what did it look like":
/// entries carry a free-text description only, no snapshot or diff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionHistoryEntry {
    pub version: u32,
    pub timestamp: DateTime<Utc>,
    pub change_description: String,
}

impl VersionHistoryEntry {
    pub fn new(version: u32, change_description: impl Into<String>) -> Self {
        Self {
            version,
            timestamp: Utc::now(),
            change_description: change_description.into(),
        }
    }
}
