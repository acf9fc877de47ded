//! Identity resolution for controlled-vocabulary values.
//!
//! Lookup values are reconciled by *name*: the same category shows up in
//! different revisions with regenerated squuids, so the first squuid seen
//! for a name becomes its stable identifier and later ones are ignored.

use kek_core::model::{LookupRef, LookupTable, Squuid};
use kek_core::{Error, Result};
use rusqlite::{Connection, OptionalExtension as _};
use serde::{Deserialize, Serialize};

/// What to do with a previously unseen name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvePolicy {
    /// Require the source to supply a squuid; fail with
    /// [`Error::MissingIdentifier`] otherwise.
    #[default]
    Strict,
    /// Mint a fresh squuid when the source supplied none.
    Permissive,
}

/// Resolves `{squuid, name}` references to stable lookup-table squuids.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityResolver {
    policy: ResolvePolicy,
}

impl IdentityResolver {
    #[must_use]
    pub const fn new(policy: ResolvePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> ResolvePolicy {
        self.policy
    }

    /// Return the stable squuid for `candidate` in `table`, inserting a row
    /// the first time a name is seen. `None` when nothing is referenced.
    ///
    /// Inserts never fail on a uniqueness conflict: if the squuid or the
    /// name already exists, the surviving row's squuid is returned.
    pub fn resolve(
        &self,
        conn: &Connection,
        table: LookupTable,
        candidate: Option<&LookupRef>,
    ) -> Result<Option<Squuid>> {
        let Some(name) = candidate.and_then(|c| c.name.as_deref()) else {
            return Ok(None);
        };

        if let Some(existing) = select_by_name(conn, table, name)? {
            return Ok(Some(existing));
        }

        let source_id = candidate.and_then(|c| c.squuid.clone());
        let new_id = match (source_id, self.policy) {
            (Some(id), _) => id,
            (None, ResolvePolicy::Permissive) => Squuid::mint(),
            (None, ResolvePolicy::Strict) => {
                return Err(Error::MissingIdentifier {
                    table: table.table_name(),
                    name: name.to_string(),
                })
            }
        };

        let sql = format!(
            "INSERT INTO {table} (squuid, name) VALUES (?1, ?2)
             ON CONFLICT DO NOTHING
             RETURNING squuid"
        );
        let inserted: Option<String> = conn
            .query_row(&sql, rusqlite::params![new_id.as_str(), name], |row| row.get(0))
            .optional()?;
        if let Some(id) = inserted {
            log::debug!("New {table} value {name:?} -> {id}");
            return Ok(Some(Squuid::new(id)));
        }

        // Lost a conflict: either the name or the squuid is already taken.
        if let Some(existing) = select_by_name(conn, table, name)? {
            return Ok(Some(existing));
        }
        select_by_squuid(conn, table, &new_id)?
            .map(Some)
            .ok_or_else(|| {
                Error::InvalidData(format!(
                    "{table}: insert of {name:?} conflicted but no surviving row was found"
                ))
            })
    }
}

fn select_by_name(conn: &Connection, table: LookupTable, name: &str) -> Result<Option<Squuid>> {
    let sql = format!("SELECT squuid FROM {table} WHERE name = ?1");
    let id: Option<String> = conn.query_row(&sql, [name], |row| row.get(0)).optional()?;
    Ok(id.map(Squuid::new))
}

fn select_by_squuid(conn: &Connection, table: LookupTable, id: &Squuid) -> Result<Option<Squuid>> {
    let sql = format!("SELECT squuid FROM {table} WHERE squuid = ?1");
    let id: Option<String> = conn
        .query_row(&sql, [id.as_str()], |row| row.get(0))
        .optional()?;
    Ok(id.map(Squuid::new))
}
