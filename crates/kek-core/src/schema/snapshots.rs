//! Access to the `data_snapshots` table.
//!
//! These take a plain `&Connection` so they can run inside the importer's
//! transaction (`rusqlite::Transaction` derefs to `Connection`).

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};

use crate::error::{Error, Result};
use crate::model::{Revision, Snapshot, SnapshotId};

/// Look up the snapshot recorded for a revision, if it was imported before.
pub fn find_by_revision(conn: &Connection, revision_id: &str) -> Result<Option<SnapshotId>> {
    let id = conn
        .query_row(
            "SELECT id FROM data_snapshots WHERE revision_id = ?1",
            [revision_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(id.map(SnapshotId::from_raw))
}

/// Record that `revision` is being imported and return the new snapshot id.
pub fn insert(conn: &Connection, revision: &Revision) -> Result<SnapshotId> {
    let id: i64 = conn.query_row(
        "INSERT INTO data_snapshots (revision_id, revision_timestamp, revision_message, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING id",
        rusqlite::params![
            revision.id,
            revision.timestamp.to_rfc3339(),
            revision.message,
            Utc::now().to_rfc3339(),
        ],
        |row| row.get(0),
    )?;
    Ok(SnapshotId::from_raw(id))
}

/// Fetch one snapshot by id.
pub fn get(conn: &Connection, id: SnapshotId) -> Result<Snapshot> {
    conn.query_row(
        "SELECT id, revision_id, revision_timestamp, revision_message, created_at
         FROM data_snapshots WHERE id = ?1",
        [id.get()],
        row_to_raw,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound {
        entity: "snapshot",
        id: id.to_string(),
    })?
    .into_snapshot()
}

/// All snapshots, oldest revision first.
pub fn list(conn: &Connection) -> Result<Vec<Snapshot>> {
    let mut stmt = conn.prepare(
        "SELECT id, revision_id, revision_timestamp, revision_message, created_at
         FROM data_snapshots
         ORDER BY revision_timestamp, id",
    )?;
    let raw = stmt
        .query_map([], row_to_raw)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    raw.into_iter().map(RawSnapshot::into_snapshot).collect()
}

struct RawSnapshot {
    id: i64,
    revision_id: String,
    revision_timestamp: String,
    revision_message: String,
    created_at: String,
}

impl RawSnapshot {
    fn into_snapshot(self) -> Result<Snapshot> {
        Ok(Snapshot {
            id: SnapshotId::from_raw(self.id),
            revision_id: self.revision_id,
            revision_timestamp: parse_stored(&self.revision_timestamp)?,
            revision_message: self.revision_message,
            created_at: parse_stored(&self.created_at)?,
        })
    }
}

fn row_to_raw(row: &rusqlite::Row) -> rusqlite::Result<RawSnapshot> {
    Ok(RawSnapshot {
        id: row.get(0)?,
        revision_id: row.get(1)?,
        revision_timestamp: row.get(2)?,
        revision_message: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn parse_stored(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidData(format!("bad stored timestamp {text:?}: {e}")))
}
