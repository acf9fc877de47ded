//! Snapshot import pipeline for kek-archive.
//!
//! Walks historical revisions of the archived media-ownership data, resolves
//! every record to its stable identifier, and loads each revision into the
//! store as one atomic snapshot.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod error;
pub mod git;
pub mod import;
pub mod records;
pub mod resolve;
pub mod snapshot;
pub mod source;

pub use config::Config;
pub use error::{ImportError, SourceError};
pub use git::GitRevisionSource;
pub use import::{import_data_dir, ImportCounts, ImportOptions, Importer};
pub use records::{Loaded, RecordBatch};
pub use resolve::{IdentityResolver, ResolvePolicy};
pub use snapshot::{RevisionOutcome, RevisionState, RunReport, SnapshotManager};
pub use source::{DataDir, RevisionRange, RevisionSource};
