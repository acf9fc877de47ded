use std::collections::HashSet;
use std::path::Path;

use kek_core::model::{EntityRef, Squuid};
use kek_core::{Error, Result};

use super::{ImportCounts, Importer};
use crate::records::RecordBatch;

/// A validated edge ready to be written.
#[derive(Debug)]
struct Edge<'a> {
    squuid: &'a Squuid,
    holder: &'a Squuid,
    held: &'a Squuid,
    state: &'a str,
}

/// The endpoint and state of an edge, or the reason it is unusable.
fn require<'a>(
    path: &Path,
    kind: &str,
    squuid: &Squuid,
    endpoint: Option<&'a EntityRef>,
    state: Option<&'a String>,
) -> Result<(&'a Squuid, &'a str)> {
    let endpoint = endpoint
        .ok_or_else(|| Error::malformed(path, format!("{kind} edge {squuid} has no endpoint")))?;
    let state =
        state.ok_or_else(|| Error::malformed(path, format!("{kind} edge {squuid} has no state")))?;
    Ok((&endpoint.squuid, state.as_str()))
}

impl Importer<'_> {
    /// `owns` edges declared on shareholders.
    pub(super) fn import_ownership(
        &self,
        batch: &RecordBatch,
        counts: &mut ImportCounts,
    ) -> Result<()> {
        let mut seen = HashSet::new();
        for holder in &batch.shareholders {
            for edge in &holder.record.owns {
                let (held, state) =
                    require(&holder.path, "owns", &edge.squuid, edge.held.as_ref(), edge.state.as_ref())?;
                if !seen.insert(&edge.squuid) {
                    log::debug!("Ownership edge {} already imported", edge.squuid);
                    continue;
                }
                let edge_row = Edge {
                    squuid: &edge.squuid,
                    holder: &holder.record.squuid,
                    held,
                    state,
                };
                self.write_ownership(
                    &edge_row,
                    edge.capital_shares,
                    edge.complementary_partner.unwrap_or(false),
                )?;
                counts.ownership += 1;
            }
        }
        Ok(())
    }

    /// Operation edges from the holder side (`operates`) and the held side
    /// (`operatedBy`).
    pub(super) fn import_operation(
        &self,
        batch: &RecordBatch,
        counts: &mut ImportCounts,
    ) -> Result<()> {
        let mut seen = HashSet::new();

        for holder in &batch.shareholders {
            for edge in &holder.record.operates {
                let (held, state) = require(
                    &holder.path,
                    "operates",
                    &edge.squuid,
                    edge.held.as_ref(),
                    edge.state.as_ref(),
                )?;
                if seen.insert(&edge.squuid) {
                    self.write_operation(&Edge {
                        squuid: &edge.squuid,
                        holder: &holder.record.squuid,
                        held,
                        state,
                    })?;
                    counts.operation += 1;
                }
            }
        }

        for media in &batch.media {
            for edge in &media.record.operated_by {
                let (holder, state) = require(
                    &media.path,
                    "operatedBy",
                    &edge.squuid,
                    edge.holder.as_ref(),
                    edge.state.as_ref(),
                )?;
                if seen.insert(&edge.squuid) {
                    self.write_operation(&Edge {
                        squuid: &edge.squuid,
                        holder,
                        held: &media.record.squuid,
                        state,
                    })?;
                    counts.operation += 1;
                }
            }
        }
        Ok(())
    }

    fn write_ownership(
        &self,
        edge: &Edge<'_>,
        capital_shares: Option<f64>,
        complementary_partner: bool,
    ) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO ownership_relations
                    (squuid, holder_squuid, held_squuid, state, capital_shares, complementary_partner)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(squuid) DO UPDATE SET
                    state = excluded.state,
                    capital_shares = excluded.capital_shares",
            )?
            .execute(rusqlite::params![
                edge.squuid.as_str(),
                edge.holder.as_str(),
                edge.held.as_str(),
                edge.state,
                capital_shares,
                complementary_partner,
            ])?;

        if let Some(snapshot) = self.snapshot {
            self.conn
                .prepare_cached(
                    "INSERT OR REPLACE INTO ownership_relations_history
                        (snapshot_id, squuid, holder_squuid, held_squuid, state,
                         capital_shares, complementary_partner)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                )?
                .execute(rusqlite::params![
                    snapshot.get(),
                    edge.squuid.as_str(),
                    edge.holder.as_str(),
                    edge.held.as_str(),
                    edge.state,
                    capital_shares,
                    complementary_partner,
                ])?;
        }
        Ok(())
    }

    fn write_operation(&self, edge: &Edge<'_>) -> Result<()> {
        self.conn
            .prepare_cached(
                "INSERT INTO operation_relations (squuid, holder_squuid, held_squuid, state)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(squuid) DO UPDATE SET state = excluded.state",
            )?
            .execute(rusqlite::params![
                edge.squuid.as_str(),
                edge.holder.as_str(),
                edge.held.as_str(),
                edge.state,
            ])?;

        if let Some(snapshot) = self.snapshot {
            self.conn
                .prepare_cached(
                    "INSERT OR REPLACE INTO operation_relations_history
                        (snapshot_id, squuid, holder_squuid, held_squuid, state)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?
                .execute(rusqlite::params![
                    snapshot.get(),
                    edge.squuid.as_str(),
                    edge.holder.as_str(),
                    edge.held.as_str(),
                    edge.state,
                ])?;
        }
        Ok(())
    }
}
