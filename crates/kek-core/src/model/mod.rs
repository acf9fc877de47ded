pub mod ids;
pub mod lookup;
pub mod records;
pub mod snapshot;

pub use ids::{SnapshotId, Squuid};
pub use lookup::LookupTable;
pub use records::{
    EntityRef, LookupRef, MediaRecord, OperatedByEdge, OperatesEdge, OrganizationRef,
    OwnsEdge, PlatformOperatorRef, ShareholderRecord,
};
pub use snapshot::{Revision, Snapshot};
