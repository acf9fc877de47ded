pub mod db;
pub mod migrations;
pub mod snapshots;

pub use db::{Database, SnapshotSummary, COUNTED_TABLES};
