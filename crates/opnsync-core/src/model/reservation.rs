// ── DHCP reservation ──

use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

/// A router-side static DHCP binding.
///
/// `uuid` is assigned by the router and stays `None` until the reservation
/// has been created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpReservation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub mac: String,
    pub ip: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub interface: String,
}

impl DhcpReservation {
    pub fn new(mac: impl Into<String>, ip: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            mac: mac.into(),
            ip: ip.into(),
            hostname: hostname.into(),
            ..Self::default()
        }
    }

    pub fn mac_key(&self) -> MacAddress {
        MacAddress::new(&self.mac)
    }
}
