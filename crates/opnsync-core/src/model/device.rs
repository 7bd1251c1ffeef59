// ── Fleet-side device types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mac::MacAddress;

pub const SYNC_STATUS_PENDING: &str = "pending";
pub const SYNC_STATUS_IMPORTED: &str = "imported_from_opnsense";
pub const IMPORT_SOURCE_DHCP: &str = "dhcp_reservation";

/// The fleet registry's assertion about one physical device.
///
/// Owned by the fleet manager. The core only reads these and returns
/// enriched copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMapping {
    pub shelly_mac: String,
    #[serde(default)]
    pub shelly_ip: String,
    #[serde(default)]
    pub shelly_name: String,
    /// Desired hostname on the router.
    #[serde(default)]
    pub opnsense_hostname: String,
    /// Target router interface (e.g. `lan`, `opt1`).
    #[serde(default)]
    pub interface: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
    #[serde(default = "default_sync_status")]
    pub sync_status: String,
}

fn default_sync_status() -> String {
    SYNC_STATUS_PENDING.into()
}

impl Default for DeviceMapping {
    fn default() -> Self {
        Self {
            shelly_mac: String::new(),
            shelly_ip: String::new(),
            shelly_name: String::new(),
            opnsense_hostname: String::new(),
            interface: String::new(),
            last_sync: None,
            sync_status: default_sync_status(),
        }
    }
}

impl DeviceMapping {
    pub fn new(mac: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            shelly_mac: mac.into(),
            shelly_ip: ip.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.shelly_name = name.into();
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.opnsense_hostname = hostname.into();
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = interface.into();
        self
    }

    /// Normalized join key.
    pub fn mac_key(&self) -> MacAddress {
        MacAddress::new(&self.shelly_mac)
    }
}

/// One router reservation after import and classification.
///
/// Lives only for the duration of a sync run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedDevice {
    pub mac: String,
    pub ip: String,
    pub hostname: String,
    pub description: String,
    pub source: String,
    pub is_shelly: bool,
    pub confidence_score: f64,
}

impl ImportedDevice {
    pub fn mac_key(&self) -> MacAddress {
        MacAddress::new(&self.mac)
    }
}
