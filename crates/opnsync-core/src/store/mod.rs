// Router-backed stores.
//
// Each store wraps a shared `RouterTransport` and speaks one OPNsense
// controller. They hold no state of their own; cloning is cheap.

pub mod aliases;
pub mod reservations;

pub use aliases::AliasStore;
pub use reservations::{MANAGED_MARKER, ReservationStore, generate_hostname};
