//! Entity and relationship importers.
//!
//! One importer set serves both the historical pipeline and the
//! single-directory import: current tables are always upserted, and when a
//! snapshot is given every media, shareholder and relation record is also
//! copied in full into the matching `*_history` table.
//!
//! Importers only stage writes on the connection they are handed. They
//! never begin, commit or roll back a transaction.

mod media;
mod organizations;
mod relations;
mod shareholders;

use std::fmt;

use kek_core::model::SnapshotId;
use kek_core::schema::Database;
use kek_core::Result;
use rusqlite::Connection;

use crate::records::RecordBatch;
use crate::resolve::{IdentityResolver, ResolvePolicy};
use crate::source::DataDir;

/// Knobs shared by every import entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Read at most this many documents per record type.
    pub sample: Option<usize>,
    pub policy: ResolvePolicy,
    /// Log a progress line every this many records (0 disables).
    pub progress_interval: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            sample: None,
            policy: ResolvePolicy::default(),
            progress_interval: 100,
        }
    }
}

/// Rows written during one import, per table family.
///
/// Entity and relation counts are records processed; catalog counts
/// (organizations, languages, ...) are rows newly inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub organizations: usize,
    pub media: usize,
    pub shareholders: usize,
    pub ownership: usize,
    pub operation: usize,
    pub languages: usize,
    pub platform_operators: usize,
    pub distribution_types: usize,
    pub media_languages: usize,
    pub media_platform_operators: usize,
}

impl fmt::Display for ImportCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} media, {} shareholders, {} ownership, {} operation, {} new organizations",
            self.media, self.shareholders, self.ownership, self.operation, self.organizations
        )
    }
}

/// Logs a line every `interval` records of one kind.
#[derive(Debug)]
struct Progress {
    label: &'static str,
    interval: usize,
    done: usize,
}

impl Progress {
    const fn new(label: &'static str, interval: usize) -> Self {
        Self {
            label,
            interval,
            done: 0,
        }
    }

    fn tick(&mut self, total: usize) {
        self.done += 1;
        if self.interval > 0 && self.done % self.interval == 0 {
            log::info!("  {} {}/{}", self.label, self.done, total);
        }
    }
}

/// Stages one revision's records on a connection.
#[derive(Debug)]
pub struct Importer<'c> {
    conn: &'c Connection,
    snapshot: Option<SnapshotId>,
    resolver: IdentityResolver,
    progress_interval: usize,
}

impl<'c> Importer<'c> {
    /// An importer writing to `conn`, tagging history rows with `snapshot`
    /// when one is given.
    #[must_use]
    pub const fn new(
        conn: &'c Connection,
        snapshot: Option<SnapshotId>,
        options: &ImportOptions,
    ) -> Self {
        Self {
            conn,
            snapshot,
            resolver: IdentityResolver::new(options.policy),
            progress_interval: options.progress_interval,
        }
    }

    /// Organizations first, then media, then shareholders.
    pub fn import_entities(&self, batch: &RecordBatch, counts: &mut ImportCounts) -> Result<()> {
        self.import_organizations(batch, counts)?;

        let mut progress = Progress::new("media", self.progress_interval);
        for media in &batch.media {
            self.import_media(media, counts)?;
            progress.tick(batch.media.len());
        }

        let mut progress = Progress::new("shareholders", self.progress_interval);
        for holder in &batch.shareholders {
            self.import_shareholder(holder, counts)?;
            progress.tick(batch.shareholders.len());
        }

        log::info!(
            "Imported {} media and {} shareholders ({} new organizations)",
            counts.media,
            counts.shareholders,
            counts.organizations
        );
        Ok(())
    }

    /// Ownership edges, then operation edges from both sides.
    pub fn import_relations(&self, batch: &RecordBatch, counts: &mut ImportCounts) -> Result<()> {
        self.import_ownership(batch, counts)?;
        self.import_operation(batch, counts)?;
        log::info!(
            "Imported {} ownership and {} operation relations",
            counts.ownership,
            counts.operation
        );
        Ok(())
    }
}

/// Import one data directory into the current tables, without a snapshot.
///
/// Runs in a single transaction: either every record lands or none does.
pub fn import_data_dir(
    db: &mut Database,
    data_dir: &DataDir,
    options: &ImportOptions,
) -> Result<ImportCounts> {
    let batch = RecordBatch::load(data_dir, options.sample)?;
    let tx = db.transaction()?;
    let mut counts = ImportCounts::default();
    {
        let importer = Importer::new(&tx, None, options);
        importer.import_entities(&batch, &mut counts)?;
        importer.import_relations(&batch, &mut counts)?;
    }
    tx.commit()?;
    Ok(counts)
}

/// `?1, ?2, ... ?n`
fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}
