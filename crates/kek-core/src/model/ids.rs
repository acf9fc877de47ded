use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable identifier ("squuid") of a logical entity.
///
/// Squuids come from the source data and are never rewritten: the same
/// media outlet keeps its squuid across every archived revision. Only
/// lookup values may be minted locally (see the permissive resolve policy).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Squuid(String);

impl Squuid {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mint a fresh identifier for a value the source did not identify.
    #[must_use]
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Squuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Squuid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Squuid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Database-generated identifier of an imported snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(i64);

impl SnapshotId {
    #[must_use]
    pub const fn from_raw(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minted_squuids_are_unique_uuids() {
        let a = Squuid::mint();
        let b = Squuid::mint();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }

    #[test]
    fn test_squuid_serializes_as_plain_string() {
        let id = Squuid::new("5f02e1b5-ec52-455e-a186-0ad6bd8d6b61");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5f02e1b5-ec52-455e-a186-0ad6bd8d6b61\"");
        let back: Squuid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_snapshot_id_display() {
        assert_eq!(SnapshotId::from_raw(7).to_string(), "7");
    }
}
