//! The snapshot manager: walks revisions and imports each one atomically.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use kek_core::model::{Revision, SnapshotId};
use kek_core::schema::{snapshots, Database};

use crate::error::ImportResult;
use crate::import::{ImportCounts, ImportOptions, Importer};
use crate::records::RecordBatch;
use crate::source::{DataDir, RevisionRange, RevisionSource};

/// Where a revision got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionState {
    Pending,
    CheckedOut,
    EntitiesImported,
    RelationshipsImported,
    Committed,
    /// Already imported by an earlier run.
    Skipped,
    /// The revision's data files could not be materialized. No snapshot
    /// was created.
    Unavailable,
    /// Import failed and the revision's transaction was rolled back.
    Failed,
}

impl fmt::Display for RevisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::CheckedOut => "checked out",
            Self::EntitiesImported => "entities imported",
            Self::RelationshipsImported => "relationships imported",
            Self::Committed => "committed",
            Self::Skipped => "skipped",
            Self::Unavailable => "unavailable",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Result of processing one revision.
#[derive(Debug, Clone, PartialEq)]
pub struct RevisionOutcome {
    pub revision: Revision,
    pub state: RevisionState,
    /// The new snapshot when committed, the existing one when skipped.
    pub snapshot_id: Option<SnapshotId>,
    pub counts: ImportCounts,
    pub error: Option<String>,
}

impl RevisionOutcome {
    fn new(revision: Revision) -> Self {
        Self {
            revision,
            state: RevisionState::Pending,
            snapshot_id: None,
            counts: ImportCounts::default(),
            error: None,
        }
    }
}

/// Summary of a whole run, in processing order (oldest revision first).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Revisions the source returned for the range.
    pub listed: usize,
    pub outcomes: Vec<RevisionOutcome>,
    /// A stop was requested before every revision was processed.
    pub stopped: bool,
    /// The revision source was restored after the run.
    pub restored: bool,
}

impl RunReport {
    #[must_use]
    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn imported(&self) -> usize {
        self.count(RevisionState::Committed)
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(RevisionState::Skipped)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(RevisionState::Failed)
    }

    #[must_use]
    pub fn unavailable(&self) -> usize {
        self.count(RevisionState::Unavailable)
    }

    fn count(&self, state: RevisionState) -> usize {
        self.outcomes.iter().filter(|o| o.state == state).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} revisions processed: {} imported, {} skipped, {} failed, {} unavailable",
            self.processed(),
            self.imported(),
            self.skipped(),
            self.failed(),
            self.unavailable()
        )?;
        if self.stopped {
            f.write_str(" (stopped early)")?;
        }
        Ok(())
    }
}

/// Imports a range of revisions, one snapshot per revision.
///
/// Revisions are listed newest first but imported oldest first, so the
/// current tables end up holding the latest state. Each revision is imported
/// in its own transaction; a failing revision is rolled back and the run
/// moves on.
pub struct SnapshotManager<'a, S: RevisionSource> {
    db: &'a mut Database,
    source: &'a S,
    options: ImportOptions,
    stop: Option<Arc<AtomicBool>>,
}

impl<S: RevisionSource> fmt::Debug for SnapshotManager<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotManager")
            .field("options", &self.options)
            .field("stop", &self.stop)
            .finish_non_exhaustive()
    }
}

impl<'a, S: RevisionSource> SnapshotManager<'a, S> {
    pub fn new(db: &'a mut Database, source: &'a S, options: ImportOptions) -> Self {
        Self {
            db,
            source,
            options,
            stop: None,
        }
    }

    /// Stop before the next revision once `flag` is set.
    #[must_use]
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop = Some(flag);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Import every revision in `range`.
    ///
    /// Only a failure to list revisions or to query the snapshot table aborts
    /// the run; everything else is recorded per revision. The source is
    /// restored once revisions were listed, even when the run aborts.
    pub fn run(&mut self, range: &RevisionRange) -> ImportResult<RunReport> {
        let mut revisions = self.source.list_revisions(range)?;
        revisions.reverse();
        log::info!("Found {} revisions to process", revisions.len());

        let mut report = RunReport {
            listed: revisions.len(),
            ..RunReport::default()
        };
        let result = self.process_all(revisions, &mut report);

        report.restored = match self.source.restore() {
            Ok(()) => true,
            Err(e) => {
                log::error!("Failed to restore revision source: {e}");
                false
            }
        };
        result?;

        log::info!("{report}");
        Ok(report)
    }

    fn process_all(&mut self, revisions: Vec<Revision>, report: &mut RunReport) -> ImportResult<()> {
        let total = revisions.len();
        for (index, revision) in revisions.into_iter().enumerate() {
            if self.stop_requested() {
                log::warn!("Stop requested, {} revisions left unprocessed", total - index);
                report.stopped = true;
                break;
            }
            log::info!(
                "[{}/{}] Revision {} ({}): {}",
                index + 1,
                total,
                revision.short_id(),
                revision.timestamp.format("%Y-%m-%d %H:%M"),
                revision.message
            );
            let outcome = self.process(revision)?;
            report.outcomes.push(outcome);
        }
        Ok(())
    }

    fn process(&mut self, revision: Revision) -> ImportResult<RevisionOutcome> {
        let mut outcome = RevisionOutcome::new(revision);

        // 1. Already imported?
        if let Some(existing) = snapshots::find_by_revision(self.db.conn(), &outcome.revision.id)? {
            log::info!(
                "Revision {} already imported as snapshot {existing}, skipping",
                outcome.revision.short_id()
            );
            outcome.state = RevisionState::Skipped;
            outcome.snapshot_id = Some(existing);
            return Ok(outcome);
        }

        // 2. Materialize its data files
        let data_dir = match self.source.materialize(&outcome.revision) {
            Ok(dir) => dir,
            Err(e) => {
                log::warn!("Skipping revision {}: {e}", outcome.revision.short_id());
                outcome.state = RevisionState::Unavailable;
                outcome.error = Some(e.to_string());
                return Ok(outcome);
            }
        };
        outcome.state = RevisionState::CheckedOut;

        // 3-6. Snapshot, entities, relations, commit
        if let Err(e) = self.import_revision(&data_dir, &mut outcome) {
            log::error!(
                "Revision {} rolled back after {}: {e}",
                outcome.revision.short_id(),
                outcome.state
            );
            outcome.state = RevisionState::Failed;
            outcome.snapshot_id = None;
            outcome.error = Some(e.to_string());
        }
        Ok(outcome)
    }

    /// Everything inside one transaction. Returning early drops the
    /// transaction, which rolls it back.
    fn import_revision(
        &mut self,
        data_dir: &DataDir,
        outcome: &mut RevisionOutcome,
    ) -> kek_core::Result<()> {
        let batch = RecordBatch::load(data_dir, self.options.sample)?;
        let tx = self.db.transaction()?;

        let snapshot_id = snapshots::insert(&tx, &outcome.revision)?;
        let mut counts = ImportCounts::default();
        {
            let importer = Importer::new(&tx, Some(snapshot_id), &self.options);
            importer.import_entities(&batch, &mut counts)?;
            outcome.state = RevisionState::EntitiesImported;
            importer.import_relations(&batch, &mut counts)?;
            outcome.state = RevisionState::RelationshipsImported;
        }
        tx.commit()?;

        log::info!("Committed snapshot {snapshot_id}: {counts}");
        outcome.state = RevisionState::Committed;
        outcome.snapshot_id = Some(snapshot_id);
        outcome.counts = counts;
        Ok(())
    }
}
