use anyhow::{Context, Result};
use kek_etl::{import_data_dir, Config, DataDir};
use std::path::PathBuf;

use super::{import_options, open_database};

/// Import one data directory into the current tables.
pub fn run_import(config: &Config, data_dir: Option<PathBuf>, sample: Option<usize>) -> Result<()> {
    let mut db = open_database(&config.database_path)?;
    let data_dir = DataDir::new(data_dir.unwrap_or_else(|| config.working_data_dir()));

    println!("Importing {}", data_dir.root().display());
    let counts = import_data_dir(&mut db, &data_dir, &import_options(config, sample))
        .with_context(|| format!("Import of {} failed", data_dir.root().display()))?;

    println!("✓ Imported {counts}");
    println!("  languages: {} new, {} media links", counts.languages, counts.media_languages);
    println!(
        "  platform operators: {} new, {} distribution types, {} media links",
        counts.platform_operators, counts.distribution_types, counts.media_platform_operators
    );
    Ok(())
}
