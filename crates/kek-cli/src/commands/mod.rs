pub mod config;
pub mod graph;
pub mod history;
pub mod import;
pub mod status;

pub use graph::{export_graph, show_owners, show_tree};
pub use history::{run_history, HistoryArgs};
pub use import::run_import;
pub use status::{list_snapshots, show_status};

use anyhow::{Context, Result};
use kek_core::schema::Database;
use kek_etl::{Config, ImportOptions};
use std::path::Path;

fn open_database(path: &Path) -> Result<Database> {
    Database::open(path).with_context(|| format!("Failed to open database {}", path.display()))
}

fn import_options(config: &Config, sample: Option<usize>) -> ImportOptions {
    ImportOptions {
        sample,
        policy: config.identity_policy,
        progress_interval: config.progress_interval,
    }
}
