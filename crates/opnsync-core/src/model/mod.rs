// Domain model for the reconciliation engine.
//
// These are the validated, router-agnostic shapes the stores and the
// orchestrator work with. Wire types live in `opnsync_api::models`;
// `crate::convert` maps between the two.

pub mod alias;
pub mod device;
pub mod mac;
pub mod reservation;
pub mod sync;

pub use alias::{AliasType, FirewallAlias};
pub use device::{
    DeviceMapping, IMPORT_SOURCE_DHCP, ImportedDevice, SYNC_STATUS_IMPORTED, SYNC_STATUS_PENDING,
};
pub use mac::{MacAddress, normalize_mac};
pub use reservation::DhcpReservation;
pub use sync::{
    BidirectionalSyncConfig, BidirectionalSyncResult, ConflictResolution, ConflictType,
    Resolution, RouterSnapshot, SyncConflict, SyncOptions, SyncResult,
};
