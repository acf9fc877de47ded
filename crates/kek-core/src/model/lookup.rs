use std::fmt;

/// The controlled-vocabulary tables values are resolved into by name.
///
/// Table names only ever reach SQL through this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupTable {
    PressType,
    PressMagazineType,
    OnlineOfferType,
    RfBroadcastStatus,
    RfCategory,
}

impl LookupTable {
    pub const ALL: [Self; 5] = [
        Self::PressType,
        Self::PressMagazineType,
        Self::OnlineOfferType,
        Self::RfBroadcastStatus,
        Self::RfCategory,
    ];

    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::PressType => "press_types",
            Self::PressMagazineType => "press_magazine_types",
            Self::OnlineOfferType => "online_offer_types",
            Self::RfBroadcastStatus => "rf_broadcast_statuses",
            Self::RfCategory => "rf_categories",
        }
    }
}

impl fmt::Display for LookupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}
