use rusqlite::Connection;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Snapshot, SnapshotId};

use super::migrations::MIGRATIONS;
use super::snapshots;

/// Tables reported by [`Database::table_counts`], in display order.
pub const COUNTED_TABLES: &[&str] = &[
    "data_snapshots",
    "organizations",
    "media",
    "shareholders",
    "ownership_relations",
    "operation_relations",
    "languages",
    "platform_operators",
    "distribution_types",
    "media_history",
    "shareholders_history",
    "ownership_relations_history",
    "operation_relations_history",
];

/// A snapshot together with the number of entities recorded for it.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotSummary {
    pub snapshot: Snapshot,
    pub media: i64,
    pub shareholders: i64,
    pub ownership_relations: i64,
    pub operation_relations: i64,
}

/// The archive database: one SQLite connection with the schema applied.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) a database at the given path and apply migrations.
    ///
    /// Failing to open the file is reported as [`Error::Connection`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| Error::Connection {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::Connection {
            path: ":memory:".into(),
            source,
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Self { conn };
        db.apply_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection (for advanced queries).
    #[must_use]
    pub const fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction. Importers stage their writes inside it; only
    /// the caller commits or rolls back.
    pub fn transaction(&mut self) -> Result<rusqlite::Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    fn apply_migrations(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        let mut stmt = self
            .conn
            .prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let applied: Vec<u32> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        for migration in MIGRATIONS {
            if !applied.contains(&migration.version) {
                log::info!(
                    "Applying migration {} ({})",
                    migration.version,
                    migration.name
                );
                self.conn.execute_batch(migration.sql)?;
                self.conn.execute(
                    "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                    rusqlite::params![migration.version, migration.name],
                )?;
            }
        }

        Ok(())
    }
}

// Read-side queries
impl Database {
    /// Row counts for every table in [`COUNTED_TABLES`].
    pub fn table_counts(&self) -> Result<Vec<(&'static str, i64)>> {
        COUNTED_TABLES
            .iter()
            .map(|table| Ok((*table, self.count_rows(*table)?)))
            .collect()
    }

    fn count_rows(&self, table: &'static str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table}");
        Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
    }

    /// All imported snapshots with their per-snapshot entity counts.
    pub fn list_snapshot_summaries(&self) -> Result<Vec<SnapshotSummary>> {
        snapshots::list(&self.conn)?
            .into_iter()
            .map(|snapshot| {
                let id = snapshot.id;
                Ok(SnapshotSummary {
                    media: self.count_for_snapshot("media_history", id)?,
                    shareholders: self.count_for_snapshot("shareholders_history", id)?,
                    ownership_relations: self
                        .count_for_snapshot("ownership_relations_history", id)?,
                    operation_relations: self
                        .count_for_snapshot("operation_relations_history", id)?,
                    snapshot,
                })
            })
            .collect()
    }

    fn count_for_snapshot(&self, table: &'static str, id: SnapshotId) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {table} WHERE snapshot_id = ?1");
        Ok(self.conn.query_row(&sql, [id.get()], |row| row.get(0))?)
    }

    /// The state a media outlet had in a given snapshot.
    pub fn media_state_at(&self, snapshot: SnapshotId, squuid: &str) -> Result<Option<String>> {
        use rusqlite::OptionalExtension as _;
        Ok(self
            .conn
            .query_row(
                "SELECT state FROM media_history WHERE snapshot_id = ?1 AND squuid = ?2",
                rusqlite::params![snapshot.get(), squuid],
                |row| row.get(0),
            )
            .optional()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Revision;
    use chrono::Utc;
    use tempfile::TempDir;

    #[test]
    fn test_database_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_reopen_does_not_reapply_migrations() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kek.db");
        drop(Database::open(&path).unwrap());
        let db = Database::open(&path).unwrap();

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_unwritable_path_is_connection_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing-dir").join("kek.db");
        let err = Database::open(&path).unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::open_in_memory().unwrap();
        let result = db.conn().execute(
            "INSERT INTO media (squuid, name, type, state, organization_squuid)
             VALUES ('m1', 'M', 'press', 'active', 'no-such-org')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rollback_discards_staged_writes() {
        let mut db = Database::open_in_memory().unwrap();
        {
            let tx = db.transaction().unwrap();
            snapshots::insert(&tx, &Revision::new("r1", Utc::now(), "m")).unwrap();
            tx.rollback().unwrap();
        }
        assert!(snapshots::find_by_revision(db.conn(), "r1").unwrap().is_none());
    }

    #[test]
    fn test_table_counts_on_empty_database() {
        let db = Database::open_in_memory().unwrap();
        let counts = db.table_counts().unwrap();
        assert_eq!(counts.len(), COUNTED_TABLES.len());
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_snapshot_summaries_count_history_rows() {
        let db = Database::open_in_memory().unwrap();
        let id = snapshots::insert(db.conn(), &Revision::new("r1", Utc::now(), "m")).unwrap();
        db.conn()
            .execute_batch(
                "INSERT INTO shareholders (squuid, name, state) VALUES ('s1', 'S', 'active');",
            )
            .unwrap();
        db.conn()
            .execute(
                "INSERT INTO shareholders_history (snapshot_id, squuid, name, state)
                 VALUES (?1, 's1', 'S', 'active')",
                [id.get()],
            )
            .unwrap();

        let summaries = db.list_snapshot_summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].shareholders, 1);
        assert_eq!(summaries[0].media, 0);
    }
}
