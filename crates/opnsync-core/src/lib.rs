//! Reconciliation engine between a Shelly device fleet and an OPNsense router.
//!
//! This crate owns the domain model and business logic; the wire protocol
//! lives in `opnsync-api` behind the [`RouterTransport`](opnsync_api::RouterTransport)
//! seam, so everything here can run against an in-memory router in tests.
//!
//! - **[`ReservationStore`]** — CRUD over static DHCP reservations, hostname
//!   generation, and the create-or-update [`sync_devices`](ReservationStore::sync_devices)
//!   keyed by normalized MAC.
//!
//! - **[`AliasStore`]** — CRUD over firewall aliases and the host-alias
//!   refresh that mirrors fleet addresses into one or more aliases.
//!
//! - **[`Classifier`]** — keyword and vendor-prefix scoring of router
//!   reservations.
//!
//! - **[`ConflictResolver`]** — pure per-field merge of a fleet device with
//!   its router counterpart under a [`ConflictResolution`] strategy.
//!
//! - **[`SyncOrchestrator`]** — the single entry point,
//!   [`perform_bidirectional_sync`](SyncOrchestrator::perform_bidirectional_sync).
//!
//! Every mutating path honours `dry_run`: plans are computed and counted,
//! but no create/update/delete/apply request reaches the transport.

pub mod classify;
pub mod config;
pub mod conflict;
pub mod convert;
pub mod error;
pub mod model;
pub mod store;
pub mod sync;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use classify::{Classification, Classifier};
pub use config::{RouterConfig, TlsVerification};
pub use conflict::ConflictResolver;
pub use error::{CoreError, ErrorKind};
pub use store::{AliasStore, ReservationStore, generate_hostname};
pub use sync::{Resolved, SyncOrchestrator, resolve_devices};
pub use validate::{sanitize_hostname, validate_alias, validate_reservation};

pub use model::{
    AliasType, BidirectionalSyncConfig, BidirectionalSyncResult, ConflictResolution,
    ConflictType, DeviceMapping, DhcpReservation, FirewallAlias, ImportedDevice, MacAddress,
    Resolution, RouterSnapshot, SyncConflict, SyncOptions, SyncResult, normalize_mac,
};
