use anyhow::{Context, Result};
use kek_core::model::SnapshotId;
use kek_etl::Config;
use kek_graph::{Direction, OwnershipGraph};
use std::path::PathBuf;

use super::open_database;

fn load(config: &Config, snapshot: Option<i64>) -> Result<OwnershipGraph> {
    let db = open_database(&config.database_path)?;
    OwnershipGraph::load(&db, snapshot.map(SnapshotId::from_raw))
        .context("Failed to load ownership graph")
}

/// Write the ownership graph as DOT.
pub fn export_graph(config: &Config, snapshot: Option<i64>, out: Option<PathBuf>) -> Result<()> {
    let dot = load(config, snapshot)?.to_dot();
    match out {
        Some(path) => {
            std::fs::write(&path, dot)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✓ Wrote {}", path.display());
        }
        None => print!("{dot}"),
    }
    Ok(())
}

/// Print the aggregated owners of one entity.
pub fn show_owners(config: &Config, squuid: &str, snapshot: Option<i64>) -> Result<()> {
    let graph = load(config, snapshot)?;
    let owners = graph.top_owners(squuid)?;

    if let Some(entity) = graph.vertex(squuid) {
        println!("Owners of {entity} ({squuid})\n");
    }
    if owners.is_empty() {
        println!("  No recorded owners");
    }
    for top in owners {
        println!("  {:>7.2}%  {} ({})", top.share, top.owner, top.owner.squuid);
    }
    Ok(())
}

/// Print the operator/owner tree of one entity, or its holdings with `down`.
pub fn show_tree(config: &Config, squuid: &str, down: bool, snapshot: Option<i64>) -> Result<()> {
    let direction = if down {
        Direction::Outgoing
    } else {
        Direction::Incoming
    };
    print!("{}", load(config, snapshot)?.tree(squuid, direction)?);
    Ok(())
}
