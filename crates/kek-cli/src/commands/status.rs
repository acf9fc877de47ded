use anyhow::Result;
use kek_etl::Config;

use super::open_database;

/// List imported snapshots, oldest first.
pub fn list_snapshots(config: &Config) -> Result<()> {
    let db = open_database(&config.database_path)?;
    let summaries = db.list_snapshot_summaries()?;

    if summaries.is_empty() {
        println!("No snapshots imported yet.");
        println!("\nRun `kek-archive history` to import the archive history");
        return Ok(());
    }

    println!(
        "{:>5}  {:<10}  {:<16}  {:>6}  {:>6}  message",
        "id", "revision", "committed", "media", "owners"
    );
    for summary in summaries {
        let snapshot = &summary.snapshot;
        println!(
            "{:>5}  {:<10}  {:<16}  {:>6}  {:>6}  {}",
            snapshot.id,
            snapshot.revision_id.get(..10).unwrap_or(&snapshot.revision_id),
            snapshot.revision_timestamp.format("%Y-%m-%d %H:%M"),
            summary.media,
            summary.shareholders,
            snapshot.revision_message
        );
    }
    Ok(())
}

/// Row counts per table.
pub fn show_status(config: &Config) -> Result<()> {
    let db = open_database(&config.database_path)?;

    println!("\nkek-archive Status\n");
    println!("  Database: {}\n", config.database_path.display());
    for (table, count) in db.table_counts()? {
        println!("  {table:<30} {count:>8}");
    }
    Ok(())
}
