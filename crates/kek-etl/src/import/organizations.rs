use std::collections::BTreeMap;

use kek_core::model::{OrganizationRef, Squuid};
use kek_core::Result;

use super::{ImportCounts, Importer};
use crate::records::RecordBatch;

/// Every organization embedded in the batch, deduplicated by squuid.
///
/// A shareholder's copy of an organization wins over a media copy.
pub(super) fn collect(batch: &RecordBatch) -> BTreeMap<&Squuid, &OrganizationRef> {
    let mut organizations = BTreeMap::new();
    for media in &batch.media {
        for org in media.record.organizations() {
            organizations.insert(&org.squuid, org);
        }
    }
    for holder in &batch.shareholders {
        for org in &holder.record.organizations {
            organizations.insert(&org.squuid, org);
        }
    }
    organizations
}

impl Importer<'_> {
    /// Insert unseen organizations. Existing rows are never updated.
    pub(super) fn import_organizations(
        &self,
        batch: &RecordBatch,
        counts: &mut ImportCounts,
    ) -> Result<()> {
        let organizations = collect(batch);
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO organizations (squuid, name, full_name, type)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(squuid) DO NOTHING",
        )?;
        for org in organizations.values() {
            counts.organizations += stmt.execute(rusqlite::params![
                org.squuid.as_str(),
                org.name,
                org.full_name,
                org.kind.as_deref().unwrap_or("organization"),
            ])?;
        }
        log::debug!(
            "{} organizations referenced, {} new",
            organizations.len(),
            counts.organizations
        );
        Ok(())
    }
}
