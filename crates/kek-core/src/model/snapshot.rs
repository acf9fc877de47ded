use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::SnapshotId;

/// One historical state of the source data, as enumerated by a revision
/// source (for the git source: one commit touching the data directory).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl Revision {
    #[must_use]
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp,
            message: message.into(),
        }
    }

    /// Abbreviated identifier for log lines.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }
}

/// The stored record that a revision was imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: SnapshotId,
    pub revision_id: String,
    pub revision_timestamp: DateTime<Utc>,
    pub revision_message: String,
    pub created_at: DateTime<Utc>,
}
