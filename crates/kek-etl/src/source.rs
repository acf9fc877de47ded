//! The revision source seam: where historical states of the data come from.

use chrono::NaiveDate;
use kek_core::model::Revision;
use std::path::{Path, PathBuf};

use crate::error::SourceError;

/// Which revisions to enumerate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionRange {
    /// Only revisions on or after this date.
    pub since: Option<NaiveDate>,
    /// Only revisions on or before this date.
    pub until: Option<NaiveDate>,
    /// At most this many (newest) revisions.
    pub max_count: Option<usize>,
}

/// Handle to one revision's materialized data files.
///
/// Every importer reads through this handle; nothing reads an ambient
/// "current checkout".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn media_dir(&self) -> PathBuf {
        self.root.join("media")
    }

    #[must_use]
    pub fn shareholders_dir(&self) -> PathBuf {
        self.root.join("shareholders")
    }
}

/// Enumerates historical revisions and materializes their data files.
pub trait RevisionSource {
    /// Revisions in `range`, newest first.
    fn list_revisions(&self, range: &RevisionRange) -> Result<Vec<Revision>, SourceError>;

    /// Write the data files of `revision` into the source's working
    /// directory and return a handle to them.
    fn materialize(&self, revision: &Revision) -> Result<DataDir, SourceError>;

    /// Undo every materialization, leaving the working directory as it was
    /// before the run.
    fn restore(&self) -> Result<(), SourceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_layout() {
        let dir = DataDir::new("/archive/docs/data");
        assert_eq!(dir.media_dir(), PathBuf::from("/archive/docs/data/media"));
        assert_eq!(
            dir.shareholders_dir(),
            PathBuf::from("/archive/docs/data/shareholders")
        );
        assert_eq!(dir.root(), Path::new("/archive/docs/data"));
    }
}
