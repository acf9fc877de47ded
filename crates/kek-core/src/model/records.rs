//! Record shapes of the archived media and shareholder JSON documents.
//!
//! Field names follow the upstream camelCase API. Required fields are plain
//! types so that a document missing one fails to deserialize; everything
//! else is optional and defaults to empty, whether the key is missing or
//! `null`.

use serde::{Deserialize, Deserializer, Serialize};

use crate::model::ids::Squuid;

/// Treats an explicit `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A `{squuid, name}` pair naming a controlled-vocabulary value (category,
/// broadcast status, language, distribution type, ...).
///
/// Both parts are optional in the data. For lookup tables the name is the
/// reconciliation key and the squuid only seeds newly seen values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRef {
    #[serde(default)]
    pub squuid: Option<Squuid>,
    #[serde(default)]
    pub name: Option<String>,
}

impl LookupRef {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            squuid: None,
            name: Some(name.into()),
        }
    }
}

/// An embedded organization (`organization`, `rfSupervisingAuthority`,
/// shareholder `organizations`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRef {
    pub squuid: Squuid,
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A reference to another media or shareholder entity inside an edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRef {
    pub squuid: Squuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// An `owns` entry on a shareholder: the shareholder holds `held`.
///
/// Edge payloads are checked by the relationship importer rather than at
/// parse time, so a broken edge fails its revision after the entities were
/// staged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnsEdge {
    pub squuid: Squuid,
    #[serde(default)]
    pub held: Option<EntityRef>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub capital_shares: Option<f64>,
    #[serde(default)]
    pub complementary_partner: Option<bool>,
}

/// An `operates` entry on a shareholder: the shareholder operates `held`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatesEdge {
    pub squuid: Squuid,
    #[serde(default)]
    pub held: Option<EntityRef>,
    #[serde(default)]
    pub state: Option<String>,
}

/// An `operatedBy` entry on a media record: `holder` operates the media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatedByEdge {
    pub squuid: Squuid,
    #[serde(default)]
    pub holder: Option<EntityRef>,
    #[serde(default)]
    pub state: Option<String>,
}

/// A platform operator distributing a media outlet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformOperatorRef {
    #[serde(default)]
    pub squuid: Option<Squuid>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub distribution_type: Option<LookupRef>,
}

/// One media outlet document (`media/<squuid>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub squuid: Squuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: String,
    #[serde(default)]
    pub control_date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub market_reach: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub matched_names: Vec<String>,
    #[serde(default)]
    pub organization: Option<OrganizationRef>,
    #[serde(default)]
    pub accessibility_email: Option<String>,
    #[serde(default)]
    pub accessibility_url: Option<String>,

    // Press
    #[serde(default)]
    pub press_type: Option<LookupRef>,
    #[serde(default)]
    pub press_magazine_type: Option<LookupRef>,
    #[serde(default)]
    pub press_as_of_date: Option<String>,
    #[serde(default)]
    pub press_distribution_area: Option<String>,
    #[serde(default)]
    pub press_editions_comments: Option<String>,
    #[serde(default)]
    pub press_editions_epaper: Option<f64>,
    #[serde(default, rename = "pressEditionsIVW")]
    pub press_editions_ivw: Option<f64>,
    #[serde(default)]
    pub press_editions_sold: Option<f64>,
    #[serde(default)]
    pub press_kind: Option<String>,
    #[serde(default)]
    pub press_publishing_intervals: Option<f64>,

    // Online
    #[serde(default)]
    pub online_offer_type: Option<LookupRef>,
    #[serde(default, rename = "onlineAGOF")]
    pub online_agof: Option<f64>,
    #[serde(default, rename = "onlineAsOfDateAGOF")]
    pub online_as_of_date_agof: Option<String>,
    #[serde(default, rename = "onlineAsOfDateIVW")]
    pub online_as_of_date_ivw: Option<String>,
    #[serde(default)]
    pub online_comments: Option<String>,
    #[serde(default, rename = "onlineIVWPI")]
    pub online_ivwpi: Option<f64>,
    #[serde(default, rename = "onlineVisitsIVW")]
    pub online_visits_ivw: Option<f64>,

    // Broadcast (radio/TV)
    #[serde(default)]
    pub rf_address: Option<String>,
    #[serde(default)]
    pub rf_broadcast_status: Option<LookupRef>,
    #[serde(default)]
    pub rf_category: Option<LookupRef>,
    #[serde(default)]
    pub rf_director: Option<String>,
    #[serde(default)]
    pub rf_free_pay: Option<String>,
    #[serde(default)]
    pub rf_license_from: Option<String>,
    #[serde(default)]
    pub rf_license_until: Option<String>,
    #[serde(default)]
    pub rf_licensed: Option<bool>,
    #[serde(default)]
    pub rf_parental_advisor: Option<String>,
    #[serde(default)]
    pub rf_public_private: Option<String>,
    #[serde(default)]
    pub rf_representative: Option<String>,
    #[serde(default)]
    pub rf_shopping_channel: Option<bool>,
    #[serde(default)]
    pub rf_start_date: Option<String>,
    #[serde(default)]
    pub rf_statewide: Option<bool>,
    #[serde(default)]
    pub rf_supervising_authority: Option<OrganizationRef>,

    #[serde(default)]
    pub shares_info: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<LookupRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform_operators: Vec<PlatformOperatorRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operated_by: Vec<OperatedByEdge>,
}

impl MediaRecord {
    /// Organizations this record embeds, in document order.
    pub fn organizations(&self) -> impl Iterator<Item = &OrganizationRef> {
        self.organization
            .iter()
            .chain(self.rf_supervising_authority.iter())
    }
}

/// One shareholder document (`shareholders/<squuid>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareholderRecord {
    pub squuid: Squuid,
    pub name: String,
    pub state: String,
    #[serde(default)]
    pub control_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub natural_person: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pseudo_company: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub limited_partnership: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supplier_consortium: bool,
    #[serde(default)]
    pub corporation_name: Option<String>,
    #[serde(default)]
    pub co: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub street_number: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub place_of_business: Option<String>,
    #[serde(default)]
    pub other_media_activities: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub credits: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub organizations: Vec<OrganizationRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owns: Vec<OwnsEdge>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operates: Vec<OperatesEdge>,
}
