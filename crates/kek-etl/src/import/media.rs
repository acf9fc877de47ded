use kek_core::dates;
use kek_core::model::{LookupRef, LookupTable, MediaRecord, PlatformOperatorRef, Squuid};
use kek_core::Result;
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use super::{placeholders, ImportCounts, Importer};
use crate::records::Loaded;

/// Columns shared by `media` and `media_history`, in bind order.
const MEDIA_COLUMNS: [&str; 44] = [
    "squuid",
    "name",
    "type",
    "state",
    "control_date",
    "description",
    "market_reach",
    "matched_names",
    "organization_squuid",
    "accessibility_email",
    "accessibility_url",
    "press_type_squuid",
    "press_magazine_type_squuid",
    "press_as_of_date",
    "press_distribution_area",
    "press_editions_comments",
    "press_editions_epaper",
    "press_editions_ivw",
    "press_editions_sold",
    "press_kind",
    "press_publishing_intervals",
    "online_offer_type_squuid",
    "online_agof",
    "online_as_of_date_agof",
    "online_as_of_date_ivw",
    "online_comments",
    "online_ivwpi",
    "online_visits_ivw",
    "rf_address",
    "rf_broadcast_status_squuid",
    "rf_category_squuid",
    "rf_director",
    "rf_free_pay",
    "rf_license_from",
    "rf_license_until",
    "rf_licensed",
    "rf_parental_advisor",
    "rf_public_private",
    "rf_representative",
    "rf_shopping_channel",
    "rf_start_date",
    "rf_statewide",
    "rf_supervising_authority_squuid",
    "shares_info",
];

fn upsert_sql() -> String {
    format!(
        "INSERT INTO media ({}) VALUES ({})
         ON CONFLICT(squuid) DO UPDATE SET
             name = excluded.name,
             state = excluded.state,
             control_date = excluded.control_date",
        MEDIA_COLUMNS.join(", "),
        placeholders(MEDIA_COLUMNS.len())
    )
}

fn history_sql() -> String {
    format!(
        "INSERT OR REPLACE INTO media_history (snapshot_id, {}) VALUES ({})",
        MEDIA_COLUMNS.join(", "),
        placeholders(MEDIA_COLUMNS.len() + 1)
    )
}

fn squuid_value(id: Option<&Squuid>) -> Value {
    id.map(Squuid::to_string).into()
}

fn date_value(text: Option<&String>) -> Value {
    dates::to_column(text.map(String::as_str)).into()
}

impl Importer<'_> {
    fn lookup(&self, table: LookupTable, candidate: Option<&LookupRef>) -> Result<Value> {
        let id = self.resolver.resolve(self.conn, table, candidate)?;
        Ok(squuid_value(id.as_ref()))
    }

    /// Bind values for one media row, resolving its lookup references.
    fn media_values(&self, r: &MediaRecord) -> Result<Vec<Value>> {
        let values: Vec<Value> = vec![
            r.squuid.to_string().into(),
            r.name.clone().into(),
            r.kind.clone().into(),
            r.state.clone().into(),
            date_value(r.control_date.as_ref()),
            r.description.clone().into(),
            r.market_reach.into(),
            serde_json::to_string(&r.matched_names)?.into(),
            squuid_value(r.organization.as_ref().map(|o| &o.squuid)),
            r.accessibility_email.clone().into(),
            r.accessibility_url.clone().into(),
            self.lookup(LookupTable::PressType, r.press_type.as_ref())?,
            self.lookup(LookupTable::PressMagazineType, r.press_magazine_type.as_ref())?,
            date_value(r.press_as_of_date.as_ref()),
            r.press_distribution_area.clone().into(),
            r.press_editions_comments.clone().into(),
            r.press_editions_epaper.into(),
            r.press_editions_ivw.into(),
            r.press_editions_sold.into(),
            r.press_kind.clone().into(),
            r.press_publishing_intervals.into(),
            self.lookup(LookupTable::OnlineOfferType, r.online_offer_type.as_ref())?,
            r.online_agof.into(),
            date_value(r.online_as_of_date_agof.as_ref()),
            date_value(r.online_as_of_date_ivw.as_ref()),
            r.online_comments.clone().into(),
            r.online_ivwpi.into(),
            r.online_visits_ivw.into(),
            r.rf_address.clone().into(),
            self.lookup(LookupTable::RfBroadcastStatus, r.rf_broadcast_status.as_ref())?,
            self.lookup(LookupTable::RfCategory, r.rf_category.as_ref())?,
            r.rf_director.clone().into(),
            r.rf_free_pay.clone().into(),
            date_value(r.rf_license_from.as_ref()),
            date_value(r.rf_license_until.as_ref()),
            r.rf_licensed.into(),
            r.rf_parental_advisor.clone().into(),
            r.rf_public_private.clone().into(),
            r.rf_representative.clone().into(),
            r.rf_shopping_channel.into(),
            date_value(r.rf_start_date.as_ref()),
            r.rf_statewide.into(),
            squuid_value(r.rf_supervising_authority.as_ref().map(|o| &o.squuid)),
            r.shares_info.clone().into(),
        ];
        Ok(values)
    }

    pub(super) fn import_media(
        &self,
        loaded: &Loaded<MediaRecord>,
        counts: &mut ImportCounts,
    ) -> Result<()> {
        let record = &loaded.record;
        let values = self.media_values(record)?;

        self.conn
            .prepare_cached(&upsert_sql())?
            .execute(params_from_iter(values.iter()))?;

        if let Some(snapshot) = self.snapshot {
            let snapshot = Value::from(snapshot.get());
            self.conn
                .prepare_cached(&history_sql())?
                .execute(params_from_iter(
                    std::iter::once(&snapshot).chain(values.iter()),
                ))?;
        }

        for language in &record.languages {
            self.link_language(&record.squuid, language, counts)?;
        }
        for operator in &record.platform_operators {
            self.link_platform_operator(&record.squuid, operator, counts)?;
        }

        counts.media += 1;
        Ok(())
    }

    fn link_language(
        &self,
        media: &Squuid,
        language: &LookupRef,
        counts: &mut ImportCounts,
    ) -> Result<()> {
        let (Some(id), Some(name)) = (&language.squuid, &language.name) else {
            log::debug!("Media {media}: skipping language without squuid or name");
            return Ok(());
        };
        counts.languages += self
            .conn
            .prepare_cached(
                "INSERT INTO languages (squuid, name) VALUES (?1, ?2)
                 ON CONFLICT(squuid) DO NOTHING",
            )?
            .execute(rusqlite::params![id.as_str(), name])?;
        counts.media_languages += self
            .conn
            .prepare_cached(
                "INSERT INTO media_languages (media_squuid, language_squuid) VALUES (?1, ?2)
                 ON CONFLICT DO NOTHING",
            )?
            .execute(rusqlite::params![media.as_str(), id.as_str()])?;
        Ok(())
    }

    /// Record the operator, and link it to the media when the way it
    /// distributes the media is known.
    fn link_platform_operator(
        &self,
        media: &Squuid,
        operator: &PlatformOperatorRef,
        counts: &mut ImportCounts,
    ) -> Result<()> {
        let (Some(id), Some(name)) = (&operator.squuid, &operator.name) else {
            log::debug!("Media {media}: skipping platform operator without squuid or name");
            return Ok(());
        };
        counts.platform_operators += self
            .conn
            .prepare_cached(
                "INSERT INTO platform_operators (squuid, name, type, state)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(squuid) DO NOTHING",
            )?
            .execute(rusqlite::params![
                id.as_str(),
                name,
                operator.kind.as_deref().unwrap_or("platform-operator"),
                operator.state.as_deref().unwrap_or("active"),
            ])?;

        let Some(LookupRef {
            squuid: Some(dist_id),
            name: Some(dist_name),
        }) = &operator.distribution_type
        else {
            return Ok(());
        };
        counts.distribution_types += self
            .conn
            .prepare_cached(
                "INSERT INTO distribution_types (squuid, name) VALUES (?1, ?2)
                 ON CONFLICT(squuid) DO NOTHING",
            )?
            .execute(rusqlite::params![dist_id.as_str(), dist_name])?;
        counts.media_platform_operators += self
            .conn
            .prepare_cached(
                "INSERT INTO media_platform_operators
                     (media_squuid, platform_operator_squuid, distribution_type_squuid)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT DO NOTHING",
            )?
            .execute(rusqlite::params![media.as_str(), id.as_str(), dist_id.as_str()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::ImportOptions;
    use kek_core::model::SnapshotId;
    use kek_core::schema::{snapshots, Database};
    use kek_core::model::Revision;
    use serde_json::json;

    fn loaded(value: serde_json::Value) -> Loaded<MediaRecord> {
        Loaded {
            path: "media.json".into(),
            record: serde_json::from_value(value).unwrap(),
        }
    }

    fn snapshot(db: &Database, id: &str) -> SnapshotId {
        let revision = Revision::new(id, chrono::Utc::now(), "test");
        snapshots::insert(db.conn(), &revision).unwrap()
    }

    #[test]
    fn test_column_list_matches_placeholders() {
        assert_eq!(upsert_sql().matches('?').count(), MEDIA_COLUMNS.len());
        assert_eq!(history_sql().matches('?').count(), MEDIA_COLUMNS.len() + 1);
    }

    #[test]
    fn test_reimport_overwrites_only_name_state_and_control_date() {
        let db = Database::open_in_memory().unwrap();
        let importer = Importer::new(db.conn(), None, &ImportOptions::default());
        let mut counts = ImportCounts::default();

        importer
            .import_media(
                &loaded(json!({
                    "squuid": "m1", "name": "Old", "type": "press", "state": "active",
                    "description": "first", "controlDate": "2020-01-01"
                })),
                &mut counts,
            )
            .unwrap();
        importer
            .import_media(
                &loaded(json!({
                    "squuid": "m1", "name": "New", "type": "press", "state": "inactive",
                    "description": "second", "controlDate": "2021-06-30T00:00:00Z"
                })),
                &mut counts,
            )
            .unwrap();

        let row: (String, String, String, Option<String>) = db
            .conn()
            .query_row(
                "SELECT name, state, description, control_date FROM media WHERE squuid = 'm1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(row.0, "New");
        assert_eq!(row.1, "inactive");
        assert_eq!(row.2, "first");
        assert!(row.3.unwrap().starts_with("2021-06-30"));
        assert_eq!(counts.media, 2);
    }

    #[test]
    fn test_history_row_carries_every_attribute() {
        let db = Database::open_in_memory().unwrap();
        let snap = snapshot(&db, "r1");
        let importer = Importer::new(db.conn(), Some(snap), &ImportOptions::default());
        let mut counts = ImportCounts::default();

        importer
            .import_media(
                &loaded(json!({
                    "squuid": "m1", "name": "Radio", "type": "rf", "state": "active",
                    "description": "versioned", "rfStatewide": true,
                    "matchedNames": ["Radio", "Radio Eins"],
                    "rfCategory": {"squuid": "c1", "name": "Vollprogramm"}
                })),
                &mut counts,
            )
            .unwrap();

        let row: (String, bool, String, String) = db
            .conn()
            .query_row(
                "SELECT description, rf_statewide, matched_names, rf_category_squuid
                 FROM media_history WHERE snapshot_id = ?1 AND squuid = 'm1'",
                [snap.get()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();
        assert_eq!(row.0, "versioned");
        assert!(row.1);
        assert_eq!(row.2, r#"["Radio","Radio Eins"]"#);
        assert_eq!(row.3, "c1");
    }

    #[test]
    fn test_unparseable_dates_are_stored_as_null() {
        let db = Database::open_in_memory().unwrap();
        let importer = Importer::new(db.conn(), None, &ImportOptions::default());
        let mut counts = ImportCounts::default();

        importer
            .import_media(
                &loaded(json!({
                    "squuid": "m1", "name": "M", "type": "rf", "state": "active",
                    "controlDate": "not-a-date", "rfLicenseFrom": "sometime"
                })),
                &mut counts,
            )
            .unwrap();

        let row: (Option<String>, Option<String>) = db
            .conn()
            .query_row(
                "SELECT control_date, rf_license_from FROM media WHERE squuid = 'm1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(row, (None, None));
    }

    #[test]
    fn test_languages_and_platform_operators() {
        let db = Database::open_in_memory().unwrap();
        let importer = Importer::new(db.conn(), None, &ImportOptions::default());
        let mut counts = ImportCounts::default();

        importer
            .import_media(
                &loaded(json!({
                    "squuid": "m1", "name": "M", "type": "rf", "state": "active",
                    "languages": [
                        {"squuid": "l1", "name": "Deutsch"},
                        {"name": "no id"}
                    ],
                    "platformOperators": [
                        {"squuid": "p1", "name": "Kabel", "distributionType": {"squuid": "d1", "name": "Kabel"}},
                        {"squuid": "p2", "name": "Satellit"}
                    ]
                })),
                &mut counts,
            )
            .unwrap();

        assert_eq!(counts.languages, 1);
        assert_eq!(counts.media_languages, 1);
        assert_eq!(counts.platform_operators, 2);
        assert_eq!(counts.distribution_types, 1);
        assert_eq!(counts.media_platform_operators, 1);

        let (kind, state): (String, String) = db
            .conn()
            .query_row(
                "SELECT type, state FROM platform_operators WHERE squuid = 'p2'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(kind, "platform-operator");
        assert_eq!(state, "active");
    }
}
