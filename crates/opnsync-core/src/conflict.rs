// ── Conflict detection and resolution ──
//
// Pure: compares a fleet device with the router record sharing its MAC and
// decides, per field, which side wins under the configured strategy. Only
// IP and hostname are compared.

use std::net::IpAddr;

use crate::model::{
    ConflictResolution, ConflictType, DeviceMapping, ImportedDevice, Resolution, SyncConflict,
};

fn ips_differ(fleet: &str, router: &str) -> bool {
    match (fleet.trim().parse::<IpAddr>(), router.trim().parse::<IpAddr>()) {
        (Ok(a), Ok(b)) => a != b,
        _ => fleet.trim() != router.trim(),
    }
}

fn hostnames_differ(fleet: &str, router: &str) -> bool {
    !fleet.trim().eq_ignore_ascii_case(router.trim())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictResolver {
    strategy: ConflictResolution,
}

impl ConflictResolver {
    pub fn new(strategy: ConflictResolution) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ConflictResolution {
        self.strategy
    }

    /// Merge `imported` into a copy of `fleet`, returning every disagreement.
    pub fn resolve(
        &self,
        fleet: &DeviceMapping,
        imported: &ImportedDevice,
    ) -> (DeviceMapping, Vec<SyncConflict>) {
        let mut resolved = fleet.clone();
        let mut conflicts = Vec::new();

        if ips_differ(&fleet.shelly_ip, &imported.ip) {
            let (resolution, resolved_value) = self.decide(&fleet.shelly_ip, &imported.ip);
            if resolution == Resolution::OpnsenseWins {
                resolved.shelly_ip.clone_from(&imported.ip);
            }
            conflicts.push(SyncConflict {
                conflict_type: ConflictType::IpMismatch,
                device_mac: fleet.mac_key().to_string(),
                shelly_manager_value: fleet.shelly_ip.clone(),
                opnsense_value: imported.ip.clone(),
                resolution,
                resolved_value,
            });
        }

        if hostnames_differ(&fleet.opnsense_hostname, &imported.hostname) {
            let (resolution, resolved_value) =
                self.decide(&fleet.opnsense_hostname, &imported.hostname);
            if resolution == Resolution::OpnsenseWins {
                resolved.opnsense_hostname.clone_from(&imported.hostname);
            }
            conflicts.push(SyncConflict {
                conflict_type: ConflictType::HostnameMismatch,
                device_mac: fleet.mac_key().to_string(),
                shelly_manager_value: fleet.opnsense_hostname.clone(),
                opnsense_value: imported.hostname.clone(),
                resolution,
                resolved_value,
            });
        }

        (resolved, conflicts)
    }

    fn decide(&self, fleet_value: &str, router_value: &str) -> (Resolution, Option<String>) {
        match self.strategy {
            ConflictResolution::ManagerWins => (Resolution::ManagerWins, Some(fleet_value.to_owned())),
            ConflictResolution::OpnsenseWins => {
                (Resolution::OpnsenseWins, Some(router_value.to_owned()))
            }
            ConflictResolution::Skip => (Resolution::Skipped, None),
            ConflictResolution::Manual => (Resolution::Manual, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IMPORT_SOURCE_DHCP;
    use pretty_assertions::assert_eq;

    fn fleet() -> DeviceMapping {
        DeviceMapping::new("AA:BB:CC:DD:EE:FF", "192.168.1.100").with_hostname("shelly-1")
    }

    fn imported(ip: &str, hostname: &str) -> ImportedDevice {
        ImportedDevice {
            mac: "aabbccddeeff".into(),
            ip: ip.into(),
            hostname: hostname.into(),
            description: String::new(),
            source: IMPORT_SOURCE_DHCP.into(),
            is_shelly: true,
            confidence_score: 0.8,
        }
    }

    #[test]
    fn no_conflict_when_values_agree() {
        let resolver = ConflictResolver::new(ConflictResolution::Manual);
        let (resolved, conflicts) = resolver.resolve(&fleet(), &imported("192.168.1.100", "SHELLY-1"));
        assert!(conflicts.is_empty());
        assert_eq!(resolved, fleet());
    }

    #[test]
    fn manager_wins_keeps_fleet_values() {
        let resolver = ConflictResolver::new(ConflictResolution::ManagerWins);
        let (resolved, conflicts) = resolver.resolve(&fleet(), &imported("192.168.1.200", "old"));

        assert_eq!(resolved.shelly_ip, "192.168.1.100");
        assert_eq!(resolved.opnsense_hostname, "shelly-1");
        assert_eq!(conflicts.len(), 2);
        assert_eq!(conflicts[0].conflict_type, ConflictType::IpMismatch);
        assert_eq!(conflicts[0].resolution, Resolution::ManagerWins);
        assert_eq!(conflicts[0].resolved_value.as_deref(), Some("192.168.1.100"));
        assert_eq!(conflicts[0].device_mac, "aabbccddeeff");
        assert_eq!(conflicts[1].conflict_type, ConflictType::HostnameMismatch);
    }

    #[test]
    fn opnsense_wins_adopts_router_values() {
        let resolver = ConflictResolver::new(ConflictResolution::OpnsenseWins);
        let (resolved, conflicts) = resolver.resolve(&fleet(), &imported("192.168.1.200", "old"));

        assert_eq!(resolved.shelly_ip, "192.168.1.200");
        assert_eq!(resolved.opnsense_hostname, "old");
        assert!(conflicts.iter().all(|c| c.resolution == Resolution::OpnsenseWins));
        assert_eq!(conflicts[1].resolved_value.as_deref(), Some("old"));
    }

    #[test]
    fn skip_and_manual_leave_fleet_untouched() {
        for (strategy, expected) in [
            (ConflictResolution::Skip, Resolution::Skipped),
            (ConflictResolution::Manual, Resolution::Manual),
        ] {
            let resolver = ConflictResolver::new(strategy);
            let (resolved, conflicts) = resolver.resolve(&fleet(), &imported("192.168.1.200", "shelly-1"));
            assert_eq!(resolved, fleet());
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].resolution, expected);
            assert_eq!(conflicts[0].resolved_value, None);
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let resolver = ConflictResolver::new(ConflictResolution::OpnsenseWins);
        let first = resolver.resolve(&fleet(), &imported("192.168.1.200", "old"));
        for _ in 0..10 {
            assert_eq!(resolver.resolve(&fleet(), &imported("192.168.1.200", "old")), first);
        }
    }

    #[test]
    fn ip_comparison_uses_parsed_addresses() {
        assert!(!ips_differ("fd00::1", "fd00:0:0::1"));
        assert!(ips_differ("10.0.0.1", "10.0.0.2"));
        assert!(ips_differ("", "10.0.0.2"));
        assert!(!ips_differ(" junk ", "junk"));
    }
}
