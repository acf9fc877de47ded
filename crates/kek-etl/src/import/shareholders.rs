use kek_core::dates;
use kek_core::model::ShareholderRecord;
use kek_core::Result;

use super::{ImportCounts, Importer};
use crate::records::Loaded;

impl Importer<'_> {
    pub(super) fn import_shareholder(
        &self,
        loaded: &Loaded<ShareholderRecord>,
        counts: &mut ImportCounts,
    ) -> Result<()> {
        let r = &loaded.record;
        let control_date = dates::to_column(r.control_date.as_deref());

        self.conn
            .prepare_cached(
                "INSERT INTO shareholders (
                    squuid, name, state, control_date,
                    natural_person, pseudo_company, limited_partnership, supplier_consortium,
                    corporation_name, co, street, street_number, zipcode, city,
                    place_of_business, other_media_activities, note, credits
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
                ON CONFLICT(squuid) DO UPDATE SET
                    name = excluded.name,
                    state = excluded.state,
                    control_date = excluded.control_date",
            )?
            .execute(rusqlite::params![
                r.squuid.as_str(),
                r.name,
                r.state,
                control_date,
                r.natural_person,
                r.pseudo_company,
                r.limited_partnership,
                r.supplier_consortium,
                r.corporation_name,
                r.co,
                r.street,
                r.street_number,
                r.zipcode,
                r.city,
                r.place_of_business,
                r.other_media_activities,
                r.note,
                r.credits,
            ])?;

        let mut link = self.conn.prepare_cached(
            "INSERT INTO shareholder_organizations (shareholder_squuid, organization_squuid)
             VALUES (?1, ?2)
             ON CONFLICT DO NOTHING",
        )?;
        for org in &r.organizations {
            link.execute(rusqlite::params![r.squuid.as_str(), org.squuid.as_str()])?;
        }

        if let Some(snapshot) = self.snapshot {
            let organization_squuids =
                serde_json::to_string(&r.organizations.iter().map(|o| &o.squuid).collect::<Vec<_>>())?;
            self.conn
                .prepare_cached(
                    "INSERT OR REPLACE INTO shareholders_history (
                        snapshot_id, squuid, name, state, control_date,
                        natural_person, pseudo_company, limited_partnership, supplier_consortium,
                        corporation_name, co, street, street_number, zipcode, city,
                        place_of_business, other_media_activities, note, credits,
                        organization_squuids
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                )?
                .execute(rusqlite::params![
                    snapshot.get(),
                    r.squuid.as_str(),
                    r.name,
                    r.state,
                    control_date,
                    r.natural_person,
                    r.pseudo_company,
                    r.limited_partnership,
                    r.supplier_consortium,
                    r.corporation_name,
                    r.co,
                    r.street,
                    r.street_number,
                    r.zipcode,
                    r.city,
                    r.place_of_business,
                    r.other_media_activities,
                    r.note,
                    r.credits,
                    organization_squuids,
                ])?;
        }

        counts.shareholders += 1;
        Ok(())
    }
}
