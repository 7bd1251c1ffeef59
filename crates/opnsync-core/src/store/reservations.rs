// ── DHCP reservation store ──
//
// CRUD over `dhcpv4/leases/*` plus the create-or-update sync keyed by
// normalized MAC. Nothing is cached: every call reads the router as it is.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use opnsync_api::endpoints::dhcp;
use opnsync_api::models::{decode, unwrap_item, wrap_item};
use opnsync_api::{
    Method, MutationResponse, ReconfigureResponse, ReservationRecord, ReservationSearchResponse,
    RouterTransport,
};
use tracing::{debug, info, warn};

use crate::convert::reservation_with_uuid;
use crate::error::CoreError;
use crate::model::{DeviceMapping, DhcpReservation, MacAddress, SyncOptions, SyncResult};
use crate::validate::{parse_ip, sanitize_hostname, validate_reservation};

/// Description prefix marking a reservation as owned by this tool.
pub const MANAGED_MARKER: &str = "[opnsync]";

/// Build a hostname for `device` from `template`.
///
/// Placeholders: `{name}` (device name), `{mac4}` (last four hex digits of the
/// normalized MAC), `{mac}` (full normalized MAC). Without a template the
/// device name is used, falling back to `shelly-{mac4}`. The result is always
/// sanitized.
pub fn generate_hostname(device: &DeviceMapping, template: Option<&str>) -> String {
    let mac = device.mac_key();
    let mac4 = mac.suffix(4);

    let raw = match template.map(str::trim).filter(|t| !t.is_empty()) {
        Some(template) => template
            .replace("{name}", device.shelly_name.trim())
            .replace("{mac4}", mac4)
            .replace("{mac}", mac.as_str()),
        None if !device.shelly_name.trim().is_empty() => device.shelly_name.clone(),
        None => format!("shelly-{mac4}"),
    };

    sanitize_hostname(&raw)
}

fn managed_description(device: &DeviceMapping) -> String {
    let name = device.shelly_name.trim();
    if name.is_empty() {
        MANAGED_MARKER.to_owned()
    } else {
        format!("{MANAGED_MARKER} {name}")
    }
}

fn is_managed(reservation: &DhcpReservation) -> bool {
    reservation.description.contains(MANAGED_MARKER)
}

/// The reservation the router should hold for `device`.
fn desired_reservation(
    device: &DeviceMapping,
    options: &SyncOptions,
) -> Result<DhcpReservation, CoreError> {
    let mac = MacAddress::parse(&device.shelly_mac)?;
    let ip = parse_ip(&device.shelly_ip)?;

    let hostname = if device.opnsense_hostname.trim().is_empty() {
        generate_hostname(device, options.hostname_template.as_deref())
    } else {
        sanitize_hostname(&device.opnsense_hostname)
    };

    let interface = if device.interface.trim().is_empty() {
        options.interface.clone().unwrap_or_default()
    } else {
        device.interface.trim().to_owned()
    };

    Ok(DhcpReservation {
        uuid: None,
        mac: mac.to_colon_string(),
        ip: ip.to_string(),
        hostname,
        description: managed_description(device),
        disabled: false,
        interface,
    })
}

fn same_ip(a: &str, b: &str) -> bool {
    match (a.trim().parse::<std::net::IpAddr>(), b.trim().parse::<std::net::IpAddr>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.trim() == b.trim(),
    }
}

fn needs_update(current: &DhcpReservation, desired: &DhcpReservation) -> bool {
    !same_ip(&current.ip, &desired.ip)
        || !current.hostname.eq_ignore_ascii_case(&desired.hostname)
        || !current.interface.eq_ignore_ascii_case(&desired.interface)
}

/// `current` with only the fields the fleet owns overwritten.
///
/// Description, disabled flag and any interface the fleet does not set stay
/// as the router has them, so an update never claims a foreign reservation
/// as managed.
fn converged(
    current: &DhcpReservation,
    desired: &DhcpReservation,
    device: &DeviceMapping,
    options: &SyncOptions,
) -> DhcpReservation {
    let interface_set = !device.interface.trim().is_empty()
        || options.interface.as_deref().is_some_and(|i| !i.trim().is_empty());

    DhcpReservation {
        uuid: current.uuid.clone(),
        mac: desired.mac.clone(),
        ip: desired.ip.clone(),
        hostname: desired.hostname.clone(),
        interface: if interface_set {
            desired.interface.clone()
        } else {
            current.interface.clone()
        },
        ..current.clone()
    }
}

/// Static DHCP reservations on one router.
pub struct ReservationStore<T> {
    transport: Arc<T>,
}

impl<T> Clone for ReservationStore<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: RouterTransport> ReservationStore<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// All reservations in router order, optionally limited to one interface.
    pub async fn list(&self, interface: Option<&str>) -> Result<Vec<DhcpReservation>, CoreError> {
        let interface = interface.map(str::trim).filter(|i| !i.is_empty());
        let path = dhcp::search_reservations(interface);
        let value = self.transport.request(Method::Get, &path, None).await?;
        let response: ReservationSearchResponse = decode(value)?;

        // Records without an interface field were already scoped by the query.
        let reservations: Vec<DhcpReservation> = response
            .reservations
            .into_iter()
            .map(|(uuid, record)| reservation_with_uuid(uuid, record))
            .filter(|r| {
                interface.is_none_or(|i| r.interface.is_empty() || r.interface.eq_ignore_ascii_case(i))
            })
            .collect();

        debug!(count = reservations.len(), ?interface, "listed reservations");
        Ok(reservations)
    }

    pub async fn get(&self, uuid: &str) -> Result<DhcpReservation, CoreError> {
        let value = self
            .transport
            .request(Method::Get, &dhcp::get_reservation(uuid), None)
            .await?;
        let record: ReservationRecord = decode(unwrap_item(value, "reservation"))?;
        if record.mac.is_empty() && record.ipaddr.is_empty() {
            return Err(CoreError::not_found("reservation", uuid));
        }
        Ok(reservation_with_uuid(uuid.to_owned(), record))
    }

    pub async fn find_by_mac(
        &self,
        mac: &str,
        interface: Option<&str>,
    ) -> Result<DhcpReservation, CoreError> {
        let key = MacAddress::new(mac);
        self.list(interface)
            .await?
            .into_iter()
            .find(|r| r.mac_key() == key)
            .ok_or_else(|| CoreError::not_found("reservation", mac))
    }

    pub async fn find_by_ip(
        &self,
        ip: &str,
        interface: Option<&str>,
    ) -> Result<DhcpReservation, CoreError> {
        let addr = parse_ip(ip)?;
        self.list(interface)
            .await?
            .into_iter()
            .find(|r| r.ip.trim().parse::<std::net::IpAddr>().is_ok_and(|a| a == addr))
            .ok_or_else(|| CoreError::not_found("reservation", ip))
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub async fn create(&self, reservation: &DhcpReservation) -> Result<MutationResponse, CoreError> {
        let body = Self::body(reservation)?;
        let value = self
            .transport
            .request(Method::Post, dhcp::ADD_RESERVATION, Some(&body))
            .await?;
        let response = decode::<MutationResponse>(value)?.ensure_ok()?;
        debug!(mac = %reservation.mac, uuid = ?response.uuid, "created reservation");
        Ok(response)
    }

    pub async fn update(
        &self,
        uuid: &str,
        reservation: &DhcpReservation,
    ) -> Result<MutationResponse, CoreError> {
        let body = Self::body(reservation)?;
        let value = self
            .transport
            .request(Method::Post, &dhcp::set_reservation(uuid), Some(&body))
            .await?;
        let response = decode::<MutationResponse>(value)?.ensure_ok()?;
        debug!(%uuid, mac = %reservation.mac, "updated reservation");
        Ok(response)
    }

    pub async fn delete(&self, uuid: &str) -> Result<MutationResponse, CoreError> {
        let value = self
            .transport
            .request(Method::Post, &dhcp::del_reservation(uuid), None)
            .await?;
        let response = decode::<MutationResponse>(value)?.ensure_ok()?;
        debug!(%uuid, "deleted reservation");
        Ok(response)
    }

    /// Reload the DHCP service so pending changes take effect.
    pub async fn apply_configuration(&self) -> Result<ReconfigureResponse, CoreError> {
        let value = self
            .transport
            .request(Method::Post, dhcp::RECONFIGURE, None)
            .await?;
        let response = decode::<ReconfigureResponse>(value)?.ensure_ok()?;
        info!(changed = response.changed, "applied DHCP configuration");
        Ok(response)
    }

    pub fn generate_hostname(&self, device: &DeviceMapping, template: Option<&str>) -> String {
        generate_hostname(device, template)
    }

    /// Validate and wrap as `{"reservation": {...}}` with a sanitized hostname.
    fn body(reservation: &DhcpReservation) -> Result<serde_json::Value, CoreError> {
        validate_reservation(reservation)?;
        let mut record = ReservationRecord::from(reservation);
        record.hostname = sanitize_hostname(&record.hostname);
        Ok(wrap_item("reservation", &record)?)
    }

    // ── Sync ─────────────────────────────────────────────────────────

    /// Create or update one reservation per fleet device, keyed by MAC.
    ///
    /// Invalid devices are reported in `errors` and skipped. Under
    /// `dry_run` the same plan is counted but nothing is sent. Only a failure
    /// to list the current reservations is returned as `Err`.
    #[allow(clippy::too_many_lines)]
    pub async fn sync_devices(
        &self,
        devices: &[DeviceMapping],
        options: &SyncOptions,
    ) -> Result<SyncResult, CoreError> {
        let started = Instant::now();
        let mut result = SyncResult::default();

        let mut by_mac: IndexMap<MacAddress, DhcpReservation> = self
            .list(options.interface.as_deref())
            .await?
            .into_iter()
            .map(|r| (r.mac_key(), r))
            .collect();
        let mut fleet = HashSet::new();
        let mut changed = false;

        for device in devices {
            let desired = match desired_reservation(device, options) {
                Ok(desired) => desired,
                Err(e) => {
                    warn!(mac = %device.shelly_mac, error = %e, "skipping device");
                    result
                        .errors
                        .push(format!("device {}: {e}", device.shelly_mac));
                    continue;
                }
            };
            let key = desired.mac_key();
            fleet.insert(key.clone());

            if let Some(current) = by_mac.get(&key) {
                let next = converged(current, &desired, device, options);
                if !needs_update(current, &next) {
                    debug!(mac = %key, "reservation unchanged");
                    continue;
                }
                // Planned creates carry no UUID yet; count them as a live run would.
                if options.dry_run {
                    info!(mac = %key, ip = %next.ip, "dry run: would update reservation");
                    result.reservations_updated += 1;
                    by_mac.insert(key, next);
                    continue;
                }
                let Some(uuid) = next.uuid.clone() else {
                    result
                        .errors
                        .push(format!("reservation for {} has no UUID", next.mac));
                    continue;
                };
                match self.update(&uuid, &next).await {
                    Ok(_) => {
                        result.reservations_updated += 1;
                        changed = true;
                        by_mac.insert(key, next);
                    }
                    Err(e) => result.errors.push(format!("update {key}: {e}")),
                }
            } else {
                if options.dry_run {
                    info!(mac = %key, ip = %desired.ip, "dry run: would create reservation");
                    result.reservations_added += 1;
                    by_mac.insert(key, desired);
                    continue;
                }
                match self.create(&desired).await {
                    Ok(response) => {
                        result.reservations_added += 1;
                        changed = true;
                        by_mac.insert(key, DhcpReservation { uuid: response.uuid, ..desired });
                    }
                    Err(e) => result
                        .errors
                        .push(format!("create {}: {e}", desired.mac)),
                }
            }
        }

        if options.delete_orphaned {
            let orphans: Vec<(MacAddress, Option<String>)> = by_mac
                .iter()
                .filter(|(key, r)| !fleet.contains(*key) && is_managed(r))
                .map(|(key, r)| (key.clone(), r.uuid.clone()))
                .collect();

            for (key, uuid) in orphans {
                let Some(uuid) = uuid else { continue };
                if options.dry_run {
                    info!(mac = %key, "dry run: would delete orphaned reservation");
                    result.reservations_deleted += 1;
                    continue;
                }
                match self.delete(&uuid).await {
                    Ok(_) => {
                        result.reservations_deleted += 1;
                        changed = true;
                    }
                    Err(e) => result.errors.push(format!("delete {key}: {e}")),
                }
            }
        }

        if changed && options.apply_changes && !options.dry_run {
            if let Err(e) = self.apply_configuration().await {
                warn!(error = %e, "DHCP apply failed");
                result
                    .warnings
                    .push(format!("failed to apply DHCP configuration: {e}"));
            }
        }

        result.duration = started.elapsed();
        result.success = result.errors.is_empty();
        info!(
            added = result.reservations_added,
            updated = result.reservations_updated,
            deleted = result.reservations_deleted,
            errors = result.errors.len(),
            dry_run = options.dry_run,
            "reservation sync finished"
        );
        Ok(result)
    }
}
