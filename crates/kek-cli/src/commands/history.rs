use anyhow::{Context, Result};
use chrono::NaiveDate;
use kek_etl::{Config, GitRevisionSource, RevisionRange, RevisionState, SnapshotManager};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::{import_options, open_database};

#[derive(Debug)]
pub struct HistoryArgs {
    pub repo: Option<PathBuf>,
    pub commits: Option<usize>,
    pub since: Option<NaiveDate>,
    pub until: Option<NaiveDate>,
    pub sample: Option<usize>,
}

/// Import every matching revision of the archive repository.
pub fn run_history(config: &Config, args: &HistoryArgs) -> Result<ExitCode> {
    let mut db = open_database(&config.database_path)?;
    let repo = args
        .repo
        .clone()
        .unwrap_or_else(|| config.repository_path.clone());
    let source = GitRevisionSource::new(&repo, &config.data_subdir)
        .context("Failed to prepare scratch directory")?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        eprintln!("\nStop requested, finishing the current revision...");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install Ctrl-C handler")?;

    let range = RevisionRange {
        since: args.since,
        until: args.until,
        max_count: args.commits,
    };

    println!("Importing history of {}", repo.join(&config.data_subdir).display());
    println!("  Database: {}\n", config.database_path.display());

    let report = SnapshotManager::new(&mut db, &source, import_options(config, args.sample))
        .with_stop_flag(stop)
        .run(&range)?;

    if report.listed == 0 {
        eprintln!("No revisions match the selection");
        return Ok(ExitCode::FAILURE);
    }

    for outcome in &report.outcomes {
        let marker = match outcome.state {
            RevisionState::Committed => "✓",
            RevisionState::Skipped => "·",
            RevisionState::Unavailable => "?",
            _ => "✗",
        };
        print!(
            "{marker} {} {} {}",
            outcome.revision.short_id(),
            outcome.revision.timestamp.format("%Y-%m-%d"),
            outcome.state
        );
        match (outcome.state, outcome.snapshot_id, &outcome.error) {
            (RevisionState::Committed, Some(id), _) => println!(" (snapshot {id}: {})", outcome.counts),
            (_, _, Some(error)) => println!(": {error}"),
            _ => println!(),
        }
    }

    println!("\n{report}");
    if !report.restored {
        eprintln!("Warning: the scratch checkout could not be cleaned up");
    }
    Ok(ExitCode::SUCCESS)
}
