// ── Bidirectional reconciliation ──
//
// One run walks IMPORT → RESOLVE_CONFLICTS → EXPORT_DHCP → EXPORT_FIREWALL,
// strictly sequentially. Per-item failures are collected into the result;
// only pre-flight validation returns `Err`. Nothing already applied is
// rolled back when a later step fails.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use indexmap::IndexMap;
use opnsync_api::RouterTransport;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::conflict::ConflictResolver;
use crate::error::CoreError;
use crate::model::{
    BidirectionalSyncConfig, BidirectionalSyncResult, ConflictResolution, DeviceMapping,
    IMPORT_SOURCE_DHCP, ImportedDevice, MacAddress, RouterSnapshot, SYNC_STATUS_IMPORTED,
    SyncConflict,
};
use crate::store::{AliasStore, ReservationStore};
use crate::validate::validate_alias_name;

/// Outcome of the pure conflict-resolution step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    pub devices: Vec<DeviceMapping>,
    pub conflicts: Vec<SyncConflict>,
}

/// Merge router-imported devices into the fleet.
///
/// Fleet devices keep their order. Imported devices with no fleet
/// counterpart are appended in router order as `imported_from_opnsense`
/// mappings; with `only_shelly` set, non-Shelly leftovers are dropped.
pub fn resolve_devices(
    fleet: &[DeviceMapping],
    imported: &[ImportedDevice],
    strategy: ConflictResolution,
    only_shelly: bool,
    import_interface: Option<&str>,
) -> Resolved {
    let resolver = ConflictResolver::new(strategy);

    let mut pending: IndexMap<MacAddress, &ImportedDevice> = IndexMap::with_capacity(imported.len());
    for device in imported {
        pending.entry(device.mac_key()).or_insert(device);
    }

    let mut out = Resolved {
        devices: Vec::with_capacity(fleet.len() + pending.len()),
        conflicts: Vec::new(),
    };

    for device in fleet {
        match pending.shift_remove(&device.mac_key()) {
            Some(router) => {
                let (merged, mut conflicts) = resolver.resolve(device, router);
                out.conflicts.append(&mut conflicts);
                out.devices.push(merged);
            }
            None => out.devices.push(device.clone()),
        }
    }

    for router in pending.into_values() {
        if only_shelly && !router.is_shelly {
            continue;
        }
        out.devices.push(DeviceMapping {
            shelly_mac: router.mac.clone(),
            shelly_ip: router.ip.clone(),
            shelly_name: router.hostname.clone(),
            opnsense_hostname: router.hostname.clone(),
            interface: import_interface.unwrap_or_default().to_owned(),
            last_sync: None,
            sync_status: SYNC_STATUS_IMPORTED.to_owned(),
        });
    }

    out
}

/// Drives one bidirectional sync against a single router.
pub struct SyncOrchestrator<T> {
    reservations: ReservationStore<T>,
    aliases: AliasStore<T>,
    classifier: Option<Classifier>,
    cancel: Option<CancellationToken>,
}

impl<T: RouterTransport> SyncOrchestrator<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self {
            reservations: ReservationStore::new(Arc::clone(&transport)),
            aliases: AliasStore::new(transport),
            classifier: None,
            cancel: None,
        }
    }

    /// Use this classifier instead of one built from the run's keywords.
    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Stop between steps once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn reservations(&self) -> &ReservationStore<T> {
        &self.reservations
    }

    pub fn aliases(&self) -> &AliasStore<T> {
        &self.aliases
    }

    /// Read-only copy of the reservation and alias tables.
    pub async fn snapshot(&self) -> Result<RouterSnapshot, CoreError> {
        let reservations = self.reservations.list(None).await?;
        let aliases = self.aliases.list().await?;
        Ok(RouterSnapshot {
            taken_at: Utc::now(),
            reservations,
            aliases,
        })
    }

    fn proceed(&self, step: &str, result: &mut BidirectionalSyncResult) -> bool {
        if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
            warn!(step, "sync cancelled");
            result.errors.push(format!("cancelled before {step}"));
            return false;
        }
        true
    }

    async fn import(
        &self,
        config: &BidirectionalSyncConfig,
        classifier: &Classifier,
    ) -> Result<(Vec<ImportedDevice>, usize), CoreError> {
        let reservations = self
            .reservations
            .list(config.import_interface.as_deref())
            .await?;

        let mut skipped = 0;
        let mut devices = Vec::with_capacity(reservations.len());
        for reservation in reservations {
            if reservation.mac.trim().is_empty() || reservation.ip.trim().is_empty() {
                skipped += 1;
                continue;
            }
            let class = classifier.identify(&reservation);
            if config.import_only_shelly && !class.is_shelly {
                debug!(mac = %reservation.mac, confidence = class.confidence, "not a Shelly device");
                continue;
            }
            devices.push(ImportedDevice {
                mac: reservation.mac,
                ip: reservation.ip,
                hostname: reservation.hostname,
                description: reservation.description,
                source: IMPORT_SOURCE_DHCP.to_owned(),
                is_shelly: class.is_shelly,
                confidence_score: class.confidence,
            });
        }
        Ok((devices, skipped))
    }

    /// Reconcile `fleet` with the router according to `config`.
    ///
    /// Returns `Err` only when the configuration itself is unusable;
    /// everything else is reported through the result's `errors`,
    /// `warnings` and `success`.
    #[allow(clippy::too_many_lines)]
    pub async fn perform_bidirectional_sync(
        &self,
        fleet: &[DeviceMapping],
        config: &BidirectionalSyncConfig,
    ) -> Result<BidirectionalSyncResult, CoreError> {
        if config.sync_firewall_aliases {
            for name in &config.firewall_alias_names {
                validate_alias_name(name)?;
            }
        }

        let started = Instant::now();
        let options = &config.options;
        let mut result = BidirectionalSyncResult::default();

        // ── Import ───────────────────────────────────────────────────
        let mut imported = Vec::new();
        if config.import_from_opnsense && self.proceed("import", &mut result) {
            let classifier = self
                .classifier
                .clone()
                .unwrap_or_else(|| Classifier::new(&config.shelly_keywords));
            match self.import(config, &classifier).await {
                Ok((devices, skipped)) => {
                    info!(imported = devices.len(), skipped, "imported router reservations");
                    imported = devices;
                    result.skipped_imports = skipped;
                }
                Err(e) => {
                    warn!(error = %e, "import failed");
                    result.errors.push(format!("import from router failed: {e}"));
                }
            }
        }
        result.imported_devices = imported.len();
        result.total_devices = fleet.len() + imported.len();

        // ── Resolve ──────────────────────────────────────────────────
        let resolved = resolve_devices(
            fleet,
            &imported,
            config.conflict_resolution,
            config.import_only_shelly,
            config.import_interface.as_deref(),
        );
        if !resolved.conflicts.is_empty() {
            info!(
                conflicts = resolved.conflicts.len(),
                strategy = %config.conflict_resolution,
                "resolved conflicts"
            );
        }
        result.conflicts = resolved.conflicts;
        result.resolved_devices = resolved.devices;

        let export_dhcp = config.export_to_opnsense && !result.resolved_devices.is_empty();
        let export_aliases =
            config.sync_firewall_aliases && !config.firewall_alias_names.is_empty();

        // ── Backup ───────────────────────────────────────────────────
        let mut exports_allowed = true;
        if options.backup_before_changes
            && !options.dry_run
            && (export_dhcp || export_aliases)
            && self.proceed("backup", &mut result)
        {
            match self.snapshot().await {
                Ok(snapshot) => {
                    debug!(
                        reservations = snapshot.reservations.len(),
                        aliases = snapshot.aliases.len(),
                        "captured router snapshot"
                    );
                    result.backup = Some(snapshot);
                }
                Err(e) => {
                    warn!(error = %e, "backup failed, skipping exports");
                    result.errors.push(format!("backup failed, no changes made: {e}"));
                    exports_allowed = false;
                }
            }
        }

        // ── Export DHCP ──────────────────────────────────────────────
        if exports_allowed && export_dhcp && self.proceed("DHCP export", &mut result) {
            let outcome = self
                .reservations
                .sync_devices(&result.resolved_devices, options)
                .await;
            match outcome {
                Ok(dhcp) => {
                    result.reservations_added = dhcp.reservations_added;
                    result.reservations_updated = dhcp.reservations_updated;
                    result.reservations_deleted = dhcp.reservations_deleted;
                    result.errors.extend(dhcp.errors);
                    result.warnings.extend(dhcp.warnings);
                }
                Err(e) => {
                    warn!(error = %e, "DHCP export failed");
                    result.errors.push(format!("DHCP export failed: {e}"));
                }
            }
        }

        // ── Export firewall aliases ──────────────────────────────────
        if exports_allowed && export_aliases && self.proceed("alias export", &mut result) {
            let groups: IndexMap<String, Vec<DeviceMapping>> = config
                .firewall_alias_names
                .iter()
                .map(|name| (name.clone(), result.resolved_devices.clone()))
                .collect();
            let aliases = self
                .aliases
                .sync_shelly_device_aliases(&groups, options)
                .await;
            result.aliases_updated = aliases.aliases_updated;
            result.warnings.extend(aliases.errors);
            result.warnings.extend(aliases.warnings);
        }

        result.duration = started.elapsed();
        result.success = result.errors.is_empty();
        info!(
            total = result.total_devices,
            added = result.reservations_added,
            updated = result.reservations_updated,
            aliases = result.aliases_updated,
            conflicts = result.conflicts.len(),
            errors = result.errors.len(),
            dry_run = options.dry_run,
            "bidirectional sync finished"
        );
        Ok(result)
    }
}
