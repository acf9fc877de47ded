/// A schema migration.
#[derive(Debug)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

const MIGRATION_001: &str = r#"
-- Imported revisions
CREATE TABLE IF NOT EXISTS data_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    revision_id TEXT NOT NULL UNIQUE,
    revision_timestamp TEXT NOT NULL,
    revision_message TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Controlled vocabularies (resolved by name)
CREATE TABLE IF NOT EXISTS press_types (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS press_magazine_types (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS online_offer_types (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS rf_broadcast_statuses (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS rf_categories (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

-- Organizations (immutable once created)
CREATE TABLE IF NOT EXISTS organizations (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    full_name TEXT,
    type TEXT NOT NULL DEFAULT 'organization'
);

-- Media outlets (latest state)
CREATE TABLE IF NOT EXISTS media (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    state TEXT NOT NULL,
    control_date TEXT,
    description TEXT,
    market_reach REAL,
    matched_names TEXT NOT NULL DEFAULT '[]',
    organization_squuid TEXT REFERENCES organizations(squuid),
    accessibility_email TEXT,
    accessibility_url TEXT,
    press_type_squuid TEXT REFERENCES press_types(squuid),
    press_magazine_type_squuid TEXT REFERENCES press_magazine_types(squuid),
    press_as_of_date TEXT,
    press_distribution_area TEXT,
    press_editions_comments TEXT,
    press_editions_epaper REAL,
    press_editions_ivw REAL,
    press_editions_sold REAL,
    press_kind TEXT,
    press_publishing_intervals REAL,
    online_offer_type_squuid TEXT REFERENCES online_offer_types(squuid),
    online_agof REAL,
    online_as_of_date_agof TEXT,
    online_as_of_date_ivw TEXT,
    online_comments TEXT,
    online_ivwpi REAL,
    online_visits_ivw REAL,
    rf_address TEXT,
    rf_broadcast_status_squuid TEXT REFERENCES rf_broadcast_statuses(squuid),
    rf_category_squuid TEXT REFERENCES rf_categories(squuid),
    rf_director TEXT,
    rf_free_pay TEXT,
    rf_license_from TEXT,
    rf_license_until TEXT,
    rf_licensed INTEGER,
    rf_parental_advisor TEXT,
    rf_public_private TEXT,
    rf_representative TEXT,
    rf_shopping_channel INTEGER,
    rf_start_date TEXT,
    rf_statewide INTEGER,
    rf_supervising_authority_squuid TEXT REFERENCES organizations(squuid),
    shares_info TEXT
);

CREATE INDEX IF NOT EXISTS idx_media_organization ON media(organization_squuid);

-- Shareholders (latest state)
CREATE TABLE IF NOT EXISTS shareholders (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    state TEXT NOT NULL,
    control_date TEXT,
    natural_person INTEGER NOT NULL DEFAULT 0,
    pseudo_company INTEGER NOT NULL DEFAULT 0,
    limited_partnership INTEGER NOT NULL DEFAULT 0,
    supplier_consortium INTEGER NOT NULL DEFAULT 0,
    corporation_name TEXT,
    co TEXT,
    street TEXT,
    street_number TEXT,
    zipcode TEXT,
    city TEXT,
    place_of_business TEXT,
    other_media_activities TEXT,
    note TEXT,
    credits TEXT
);

CREATE TABLE IF NOT EXISTS shareholder_organizations (
    shareholder_squuid TEXT NOT NULL REFERENCES shareholders(squuid),
    organization_squuid TEXT NOT NULL REFERENCES organizations(squuid),
    PRIMARY KEY (shareholder_squuid, organization_squuid)
);

-- Edges. Endpoints may be media or shareholders and may not be present
-- in a sampled import, so they carry no foreign keys.
CREATE TABLE IF NOT EXISTS ownership_relations (
    squuid TEXT PRIMARY KEY,
    holder_squuid TEXT NOT NULL,
    held_squuid TEXT NOT NULL,
    state TEXT NOT NULL,
    capital_shares REAL,
    complementary_partner INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_ownership_holder ON ownership_relations(holder_squuid);
CREATE INDEX IF NOT EXISTS idx_ownership_held ON ownership_relations(held_squuid);

CREATE TABLE IF NOT EXISTS operation_relations (
    squuid TEXT PRIMARY KEY,
    holder_squuid TEXT NOT NULL,
    held_squuid TEXT NOT NULL,
    state TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_operation_holder ON operation_relations(holder_squuid);
CREATE INDEX IF NOT EXISTS idx_operation_held ON operation_relations(held_squuid);

-- Secondary catalog entities
CREATE TABLE IF NOT EXISTS languages (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS distribution_types (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS platform_operators (
    squuid TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'platform-operator',
    state TEXT NOT NULL DEFAULT 'active'
);

CREATE TABLE IF NOT EXISTS media_languages (
    media_squuid TEXT NOT NULL REFERENCES media(squuid),
    language_squuid TEXT NOT NULL REFERENCES languages(squuid),
    PRIMARY KEY (media_squuid, language_squuid)
);

CREATE TABLE IF NOT EXISTS media_platform_operators (
    media_squuid TEXT NOT NULL REFERENCES media(squuid),
    platform_operator_squuid TEXT NOT NULL REFERENCES platform_operators(squuid),
    distribution_type_squuid TEXT NOT NULL REFERENCES distribution_types(squuid),
    PRIMARY KEY (media_squuid, platform_operator_squuid, distribution_type_squuid)
);

-- Point-in-time copies, one row per entity per snapshot
CREATE TABLE IF NOT EXISTS media_history (
    snapshot_id INTEGER NOT NULL REFERENCES data_snapshots(id),
    squuid TEXT NOT NULL REFERENCES media(squuid),
    name TEXT NOT NULL,
    type TEXT NOT NULL,
    state TEXT NOT NULL,
    control_date TEXT,
    description TEXT,
    market_reach REAL,
    matched_names TEXT NOT NULL DEFAULT '[]',
    organization_squuid TEXT REFERENCES organizations(squuid),
    accessibility_email TEXT,
    accessibility_url TEXT,
    press_type_squuid TEXT REFERENCES press_types(squuid),
    press_magazine_type_squuid TEXT REFERENCES press_magazine_types(squuid),
    press_as_of_date TEXT,
    press_distribution_area TEXT,
    press_editions_comments TEXT,
    press_editions_epaper REAL,
    press_editions_ivw REAL,
    press_editions_sold REAL,
    press_kind TEXT,
    press_publishing_intervals REAL,
    online_offer_type_squuid TEXT REFERENCES online_offer_types(squuid),
    online_agof REAL,
    online_as_of_date_agof TEXT,
    online_as_of_date_ivw TEXT,
    online_comments TEXT,
    online_ivwpi REAL,
    online_visits_ivw REAL,
    rf_address TEXT,
    rf_broadcast_status_squuid TEXT REFERENCES rf_broadcast_statuses(squuid),
    rf_category_squuid TEXT REFERENCES rf_categories(squuid),
    rf_director TEXT,
    rf_free_pay TEXT,
    rf_license_from TEXT,
    rf_license_until TEXT,
    rf_licensed INTEGER,
    rf_parental_advisor TEXT,
    rf_public_private TEXT,
    rf_representative TEXT,
    rf_shopping_channel INTEGER,
    rf_start_date TEXT,
    rf_statewide INTEGER,
    rf_supervising_authority_squuid TEXT REFERENCES organizations(squuid),
    shares_info TEXT,
    PRIMARY KEY (snapshot_id, squuid)
);

CREATE TABLE IF NOT EXISTS shareholders_history (
    snapshot_id INTEGER NOT NULL REFERENCES data_snapshots(id),
    squuid TEXT NOT NULL REFERENCES shareholders(squuid),
    name TEXT NOT NULL,
    state TEXT NOT NULL,
    control_date TEXT,
    natural_person INTEGER NOT NULL DEFAULT 0,
    pseudo_company INTEGER NOT NULL DEFAULT 0,
    limited_partnership INTEGER NOT NULL DEFAULT 0,
    supplier_consortium INTEGER NOT NULL DEFAULT 0,
    corporation_name TEXT,
    co TEXT,
    street TEXT,
    street_number TEXT,
    zipcode TEXT,
    city TEXT,
    place_of_business TEXT,
    other_media_activities TEXT,
    note TEXT,
    credits TEXT,
    organization_squuids TEXT NOT NULL DEFAULT '[]',
    PRIMARY KEY (snapshot_id, squuid)
);

CREATE TABLE IF NOT EXISTS ownership_relations_history (
    snapshot_id INTEGER NOT NULL REFERENCES data_snapshots(id),
    squuid TEXT NOT NULL,
    holder_squuid TEXT NOT NULL,
    held_squuid TEXT NOT NULL,
    state TEXT NOT NULL,
    capital_shares REAL,
    complementary_partner INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (snapshot_id, squuid)
);

CREATE TABLE IF NOT EXISTS operation_relations_history (
    snapshot_id INTEGER NOT NULL REFERENCES data_snapshots(id),
    squuid TEXT NOT NULL,
    holder_squuid TEXT NOT NULL,
    held_squuid TEXT NOT NULL,
    state TEXT NOT NULL,
    PRIMARY KEY (snapshot_id, squuid)
);

CREATE INDEX IF NOT EXISTS idx_media_history_squuid ON media_history(squuid);
CREATE INDEX IF NOT EXISTS idx_shareholders_history_squuid ON shareholders_history(squuid);
"#;

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: MIGRATION_001,
}];
