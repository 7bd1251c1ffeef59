// opnsync-api: Async Rust client for the OPNsense DHCP and firewall alias APIs

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod models;
pub mod transport;

pub use auth::Credentials;
pub use client::OpnSenseClient;
pub use error::Error;
pub use models::{
    AliasRecord, AliasSearchResponse, MutationResponse, ReconfigureResponse, ReservationRecord,
    ReservationSearchResponse,
};
pub use transport::{Method, RouterTransport, TlsMode, TransportConfig};
