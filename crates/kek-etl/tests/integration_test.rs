//! End-to-end runs of the snapshot manager over an in-memory revision
//! source whose revisions are plain directories.

use std::cell::Cell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use kek_core::model::Revision;
use kek_core::schema::Database;
use kek_etl::{
    DataDir, ImportOptions, RevisionRange, RevisionSource, RevisionState, SnapshotManager,
    SourceError,
};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Revisions backed by directories under a temp dir. Revisions registered
/// without a directory fail to materialize.
struct DirSource {
    root: TempDir,
    revisions: Vec<Revision>,
    dirs: HashMap<String, PathBuf>,
    stop_after_first: Option<Arc<AtomicBool>>,
    restored: Cell<bool>,
}

impl DirSource {
    fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            revisions: Vec::new(),
            dirs: HashMap::new(),
            stop_after_first: None,
            restored: Cell::new(false),
        }
    }

    /// Register a revision (oldest first) and return its data directory.
    fn add(&mut self, id: &str) -> DataDir {
        let dir = self.root.path().join(id);
        fs::create_dir_all(&dir).unwrap();
        self.dirs.insert(id.to_string(), dir.clone());
        self.add_unavailable(id);
        DataDir::new(dir)
    }

    fn add_unavailable(&mut self, id: &str) {
        let timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
            + Duration::days(i64::try_from(self.revisions.len()).unwrap());
        self.revisions.push(Revision::new(id, timestamp, format!("update {id}")));
    }
}

impl RevisionSource for DirSource {
    fn list_revisions(&self, range: &RevisionRange) -> Result<Vec<Revision>, SourceError> {
        let mut revisions: Vec<_> = self.revisions.iter().rev().cloned().collect();
        if let Some(max) = range.max_count {
            revisions.truncate(max);
        }
        Ok(revisions)
    }

    fn materialize(&self, revision: &Revision) -> Result<DataDir, SourceError> {
        if let Some(flag) = &self.stop_after_first {
            flag.store(true, Ordering::SeqCst);
        }
        self.dirs
            .get(&revision.id)
            .map(DataDir::new)
            .ok_or_else(|| SourceError::Materialize {
                revision: revision.id.clone(),
                message: "no such tree".to_string(),
            })
    }

    fn restore(&self) -> Result<(), SourceError> {
        self.restored.set(true);
        Ok(())
    }
}

fn write(dir: &Path, name: &str, value: &Value) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{name}.json")), value.to_string()).unwrap();
}

fn write_media(data: &DataDir, value: &Value) {
    let name = value["squuid"].as_str().unwrap().to_string();
    write(&data.media_dir(), &name, value);
}

fn write_shareholder(data: &DataDir, value: &Value) {
    let name = value["squuid"].as_str().unwrap().to_string();
    write(&data.shareholders_dir(), &name, value);
}

fn count(db: &Database, sql: &str) -> i64 {
    db.conn().query_row(sql, [], |row| row.get(0)).unwrap()
}

fn counts(db: &Database) -> Vec<(&'static str, i64)> {
    db.table_counts().unwrap()
}

/// A revision with a media outlet, its owner and an operator edge.
fn populated_source() -> DirSource {
    let mut source = DirSource::new();
    let data = source.add("r1");
    write_media(
        &data,
        &json!({
            "squuid": "M", "name": "Radio Eins", "type": "rf", "state": "active",
            "organization": {"squuid": "O1", "name": "ACME"},
            "rfCategory": {"squuid": "C1", "name": "Vollprogramm"},
            "operatedBy": [{"squuid": "OP1", "holder": {"squuid": "S"}, "state": "active"}]
        }),
    );
    write_shareholder(
        &data,
        &json!({
            "squuid": "S", "name": "Holding GmbH", "state": "active",
            "organizations": [{"squuid": "O1", "name": "ACME"}],
            "owns": [{"squuid": "E1", "held": {"squuid": "M"}, "state": "active", "capitalShares": 51.0}]
        }),
    );
    source
}

#[test]
fn test_rerun_is_a_noop() {
    let source = populated_source();
    let mut db = Database::open_in_memory().unwrap();

    let first = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();
    assert_eq!(first.imported(), 1);
    let after_first = counts(&db);

    let second = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();
    assert_eq!(second.imported(), 0);
    assert_eq!(second.skipped(), 1);
    assert_eq!(second.outcomes[0].snapshot_id, first.outcomes[0].snapshot_id);

    assert_eq!(counts(&db), after_first);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM data_snapshots"), 1);
}

#[test]
fn test_lookup_identity_is_stable_across_revisions() {
    let mut source = populated_source();
    let data = source.add("r2");
    // Same category, regenerated squuid.
    write_media(
        &data,
        &json!({
            "squuid": "M", "name": "Radio Eins", "type": "rf", "state": "active",
            "rfCategory": {"squuid": "C1-regenerated", "name": "Vollprogramm"}
        }),
    );
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();
    assert_eq!(report.imported(), 2);

    assert_eq!(count(&db, "SELECT COUNT(*) FROM rf_categories"), 1);
    assert_eq!(
        count(
            &db,
            "SELECT COUNT(DISTINCT rf_category_squuid) FROM media_history WHERE squuid = 'M'"
        ),
        1
    );
}

#[test]
fn test_organization_exists_for_every_reference() {
    let source = populated_source();
    let mut db = Database::open_in_memory().unwrap();
    SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();

    assert_eq!(
        count(
            &db,
            "SELECT COUNT(*) FROM media m
             LEFT JOIN organizations o ON o.squuid = m.organization_squuid
             WHERE m.organization_squuid IS NOT NULL AND o.squuid IS NULL"
        ),
        0
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM organizations WHERE squuid = 'O1'"), 1);
}

#[test]
fn test_failed_relations_roll_back_the_whole_revision() {
    let mut source = populated_source();
    let data = source.add("r2");
    write_media(
        &data,
        &json!({"squuid": "M2", "name": "TV Zwei", "type": "rf", "state": "active"}),
    );
    // Entities are fine; the ownership edge has no held entity.
    write_shareholder(
        &data,
        &json!({
            "squuid": "S2", "name": "Broken Holder", "state": "active",
            "owns": [{"squuid": "E2", "state": "active"}]
        }),
    );
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();

    assert_eq!(report.imported(), 1);
    assert_eq!(report.failed(), 1);
    let failed = &report.outcomes[1];
    assert_eq!(failed.revision.id, "r2");
    assert_eq!(failed.state, RevisionState::Failed);
    assert!(failed.snapshot_id.is_none());
    assert!(failed.error.as_deref().unwrap().contains("E2"));

    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM data_snapshots WHERE revision_id = 'r2'"),
        0
    );
    assert_eq!(count(&db, "SELECT COUNT(*) FROM media WHERE squuid = 'M2'"), 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM shareholders WHERE squuid = 'S2'"), 0);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM media_history"), 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM shareholders_history"), 1);
}

#[test]
fn test_operated_by_alone_creates_one_operation_edge() {
    let mut source = DirSource::new();
    let data = source.add("r1");
    write_media(
        &data,
        &json!({
            "squuid": "M", "name": "Radio Eins", "type": "rf", "state": "active",
            "operatedBy": [{"squuid": "OP1", "holder": {"squuid": "S"}, "state": "active"}]
        }),
    );
    let mut db = Database::open_in_memory().unwrap();

    SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();

    assert_eq!(count(&db, "SELECT COUNT(*) FROM operation_relations"), 1);
    let (holder, held): (String, String) = db
        .conn()
        .query_row(
            "SELECT holder_squuid, held_squuid FROM operation_relations",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((holder.as_str(), held.as_str()), ("S", "M"));
}

#[test]
fn test_unparseable_control_date_imports_as_null() {
    let mut source = DirSource::new();
    let data = source.add("r1");
    write_media(
        &data,
        &json!({
            "squuid": "M", "name": "Radio Eins", "type": "rf", "state": "active",
            "controlDate": "not-a-date"
        }),
    );
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();

    assert_eq!(report.imported(), 1);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM media WHERE squuid = 'M' AND control_date IS NULL"),
        1
    );
}

#[test]
fn test_two_revisions_keep_point_in_time_state() {
    let mut source = DirSource::new();
    let r1 = source.add("r1");
    write_media(
        &r1,
        &json!({
            "squuid": "M", "name": "Radio Eins", "type": "rf", "state": "active",
            "organization": {"squuid": "O1", "name": "ACME"}
        }),
    );
    let r2 = source.add("r2");
    write_media(
        &r2,
        &json!({"squuid": "M", "name": "Radio Eins", "type": "rf", "state": "inactive"}),
    );
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();

    // Oldest first, whatever order the source lists them in.
    let order: Vec<_> = report.outcomes.iter().map(|o| o.revision.id.as_str()).collect();
    assert_eq!(order, vec!["r1", "r2"]);

    assert_eq!(count(&db, "SELECT COUNT(*) FROM data_snapshots"), 2);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM organizations WHERE squuid = 'O1'"), 1);

    let s1 = report.outcomes[0].snapshot_id.unwrap();
    let s2 = report.outcomes[1].snapshot_id.unwrap();
    assert_eq!(db.media_state_at(s1, "M").unwrap().as_deref(), Some("active"));
    assert_eq!(db.media_state_at(s2, "M").unwrap().as_deref(), Some("inactive"));

    // Current table holds the latest state.
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM media WHERE squuid = 'M' AND state = 'inactive'"),
        1
    );
}

#[test]
fn test_unavailable_revision_is_skipped_without_snapshot() {
    let mut source = populated_source();
    source.add_unavailable("r2");
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();

    assert_eq!(report.imported(), 1);
    assert_eq!(report.unavailable(), 1);
    assert!(report.restored);
    assert!(source.restored.get());
    assert_eq!(count(&db, "SELECT COUNT(*) FROM data_snapshots"), 1);
}

#[test]
fn test_stop_flag_takes_effect_between_revisions() {
    let mut source = populated_source();
    let data = source.add("r2");
    write_media(
        &data,
        &json!({"squuid": "M", "name": "Radio Eins", "type": "rf", "state": "inactive"}),
    );
    let flag = Arc::new(AtomicBool::new(false));
    source.stop_after_first = Some(Arc::clone(&flag));
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .with_stop_flag(flag)
        .run(&RevisionRange::default())
        .unwrap();

    // The revision in flight when the stop was requested still commits.
    assert!(report.stopped);
    assert_eq!(report.processed(), 1);
    assert_eq!(report.imported(), 1);
    assert!(source.restored.get());
}

#[test]
fn test_sample_caps_records_per_type() {
    let mut source = DirSource::new();
    let data = source.add("r1");
    for id in ["A", "B", "C"] {
        write_media(
            &data,
            &json!({"squuid": id, "name": id, "type": "press", "state": "active"}),
        );
    }
    let mut db = Database::open_in_memory().unwrap();
    let options = ImportOptions {
        sample: Some(2),
        ..ImportOptions::default()
    };

    let report = SnapshotManager::new(&mut db, &source, options)
        .run(&RevisionRange::default())
        .unwrap();

    assert_eq!(report.outcomes[0].counts.media, 2);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM media"), 2);
}

#[test]
fn test_max_count_limits_to_newest_revisions() {
    let mut source = populated_source();
    let data = source.add("r2");
    write_media(
        &data,
        &json!({"squuid": "M", "name": "Radio Eins", "type": "rf", "state": "inactive"}),
    );
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange {
            max_count: Some(1),
            ..RevisionRange::default()
        })
        .unwrap();

    assert_eq!(report.processed(), 1);
    assert_eq!(report.outcomes[0].revision.id, "r2");
}

#[test]
fn test_explicit_nulls_on_optional_fields_import() {
    let mut source = DirSource::new();
    let data = source.add("r1");
    write_media(
        &data,
        &json!({
            "squuid": "M", "name": "Radio Eins", "type": "rf", "state": "active",
            "languages": null, "platformOperators": null, "operatedBy": null,
            "matchedNames": null
        }),
    );
    write_shareholder(
        &data,
        &json!({
            "squuid": "S", "name": "Max Mustermann", "state": "active",
            "naturalPerson": null, "pseudoCompany": null,
            "organizations": null, "owns": null, "operates": null
        }),
    );
    let mut db = Database::open_in_memory().unwrap();

    let report = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default())
        .unwrap();
    assert_eq!(report.outcomes[0].state, RevisionState::Committed);
    assert_eq!(report.imported(), 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM media"), 1);
    assert_eq!(count(&db, "SELECT COUNT(*) FROM media_languages"), 0);
    assert_eq!(
        count(&db, "SELECT COUNT(*) FROM shareholders WHERE natural_person = 0"),
        1
    );
}

#[test]
fn test_source_restored_when_snapshot_table_fails() {
    let source = populated_source();
    let mut db = Database::open_in_memory().unwrap();
    db.conn().execute_batch("DROP TABLE data_snapshots").unwrap();

    let result = SnapshotManager::new(&mut db, &source, ImportOptions::default())
        .run(&RevisionRange::default());
    assert!(result.is_err());
    assert!(source.restored.get());
}
