// ── Sync options, conflicts and run results ──

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::alias::FirewallAlias;
use super::device::DeviceMapping;
use super::reservation::DhcpReservation;

// ── Conflicts ───────────────────────────────────────────────────────

/// Which field disagreed between the fleet and the router.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConflictType {
    IpMismatch,
    HostnameMismatch,
}

/// How a single conflict ended up.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Resolution {
    ManagerWins,
    OpnsenseWins,
    Skipped,
    Manual,
}

/// One detected disagreement and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConflict {
    pub conflict_type: ConflictType,
    pub device_mac: String,
    pub shelly_manager_value: String,
    pub opnsense_value: String,
    pub resolution: Resolution,
    /// Set only when a deterministic winner was chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_value: Option<String>,
}

/// Conflict policy. Parsing is lenient: unknown strings become `Manual`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConflictResolution {
    ManagerWins,
    OpnsenseWins,
    #[default]
    Manual,
    Skip,
}

impl ConflictResolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ManagerWins => "manager_wins",
            Self::OpnsenseWins => "opnsense_wins",
            Self::Manual => "manual",
            Self::Skip => "skip",
        }
    }

    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "manager_wins" => Self::ManagerWins,
            "opnsense_wins" => Self::OpnsenseWins,
            "skip" => Self::Skip,
            _ => Self::Manual,
        }
    }
}

impl FromStr for ConflictResolution {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lenient(s))
    }
}

impl From<String> for ConflictResolution {
    fn from(s: String) -> Self {
        Self::parse_lenient(&s)
    }
}

impl From<ConflictResolution> for String {
    fn from(r: ConflictResolution) -> Self {
        r.as_str().to_owned()
    }
}

impl fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Options ─────────────────────────────────────────────────────────

/// Options shared by the DHCP and firewall sync entry points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SyncOptions {
    /// Plan and count, but send no create/update/delete/apply request.
    pub dry_run: bool,
    /// Reconfigure the router service after mutations.
    pub apply_changes: bool,
    pub backup_before_changes: bool,
    /// Interface written on create, and on update when set; also filters listings.
    pub interface: Option<String>,
    pub hostname_template: Option<String>,
    pub create_missing_aliases: bool,
    /// Delete manager-owned reservations whose MAC left the fleet.
    pub delete_orphaned: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            apply_changes: true,
            backup_before_changes: false,
            interface: None,
            hostname_template: None,
            create_missing_aliases: true,
            delete_orphaned: false,
        }
    }
}

/// Configuration for one bidirectional reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct BidirectionalSyncConfig {
    #[serde(flatten)]
    pub options: SyncOptions,
    pub conflict_resolution: ConflictResolution,
    pub import_from_opnsense: bool,
    pub export_to_opnsense: bool,
    pub sync_firewall_aliases: bool,
    pub import_only_shelly: bool,
    pub import_interface: Option<String>,
    pub firewall_alias_names: Vec<String>,
    /// Empty means the built-in keyword list.
    pub shelly_keywords: Vec<String>,
}

impl Default for BidirectionalSyncConfig {
    fn default() -> Self {
        Self {
            options: SyncOptions::default(),
            conflict_resolution: ConflictResolution::Manual,
            import_from_opnsense: false,
            export_to_opnsense: true,
            sync_firewall_aliases: false,
            import_only_shelly: true,
            import_interface: None,
            firewall_alias_names: Vec::new(),
            shelly_keywords: Vec::new(),
        }
    }
}

// ── Results ─────────────────────────────────────────────────────────

/// Read-only copy of the router tables taken before a mutating run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterSnapshot {
    pub taken_at: DateTime<Utc>,
    pub reservations: Vec<DhcpReservation>,
    pub aliases: Vec<FirewallAlias>,
}

/// Outcome of a store-level DHCP or alias sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub reservations_added: usize,
    pub reservations_updated: usize,
    pub reservations_deleted: usize,
    pub aliases_updated: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<RouterSnapshot>,
}

/// Outcome of [`SyncOrchestrator::perform_bidirectional_sync`](crate::SyncOrchestrator::perform_bidirectional_sync).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidirectionalSyncResult {
    pub total_devices: usize,
    pub imported_devices: usize,
    pub skipped_imports: usize,
    pub reservations_added: usize,
    pub reservations_updated: usize,
    pub reservations_deleted: usize,
    pub aliases_updated: usize,
    pub conflicts: Vec<SyncConflict>,
    pub resolved_devices: Vec<DeviceMapping>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<RouterSnapshot>,
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn strategy_parsing_is_lenient() {
        assert_eq!(
            ConflictResolution::parse_lenient("MANAGER_WINS"),
            ConflictResolution::ManagerWins
        );
        assert_eq!(
            ConflictResolution::parse_lenient("opnsense-wins"),
            ConflictResolution::OpnsenseWins
        );
        assert_eq!(ConflictResolution::parse_lenient("Skip"), ConflictResolution::Skip);
        assert_eq!(
            ConflictResolution::parse_lenient("whatever"),
            ConflictResolution::Manual
        );
        assert_eq!(ConflictResolution::default(), ConflictResolution::Manual);
    }

    #[test]
    fn strategy_serde_uses_snake_case() {
        let json = serde_json::to_string(&ConflictResolution::OpnsenseWins).unwrap();
        assert_eq!(json, "\"opnsense_wins\"");
        let back: ConflictResolution = serde_json::from_str("\"bogus\"").unwrap();
        assert_eq!(back, ConflictResolution::Manual);
    }

    #[test]
    fn conflict_enums_display_snake_case() {
        assert_eq!(ConflictType::IpMismatch.to_string(), "ip_mismatch");
        assert_eq!(Resolution::OpnsenseWins.as_ref(), "opnsense_wins");
    }

    #[test]
    fn option_defaults() {
        let opts = SyncOptions::default();
        assert!(opts.create_missing_aliases);
        assert!(!opts.delete_orphaned);
        assert!(!opts.dry_run);

        let cfg = BidirectionalSyncConfig::default();
        assert!(cfg.export_to_opnsense);
        assert!(!cfg.import_from_opnsense);
        assert_eq!(cfg.conflict_resolution, ConflictResolution::Manual);
    }

    #[test]
    fn result_serializes_duration_as_millis() {
        let result = SyncResult {
            duration: Duration::from_millis(1500),
            ..SyncResult::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["duration_ms"], 1500);
        assert!(value.get("backup").is_none());
    }
}
