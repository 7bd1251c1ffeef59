// ── Wire-to-domain type conversions ──
//
// Bridges `opnsync_api` records and `opnsync_core::model` types. Search
// results carry the UUID as the map key; `with_uuid` stamps it back onto the
// domain value. Outgoing records never carry a UUID (it travels in the path).

use opnsync_api::{AliasRecord, ReservationRecord};

use crate::model::{DhcpReservation, FirewallAlias, MacAddress};

// ── Reservations ───────────────────────────────────────────────────

impl From<ReservationRecord> for DhcpReservation {
    fn from(r: ReservationRecord) -> Self {
        Self {
            uuid: r.uuid.filter(|u| !u.is_empty()),
            mac: r.mac,
            ip: r.ipaddr,
            hostname: r.hostname,
            description: r.descr,
            disabled: r.disabled,
            interface: r.interface,
        }
    }
}

impl From<&DhcpReservation> for ReservationRecord {
    fn from(r: &DhcpReservation) -> Self {
        // Router-side MACs are colon-separated; keep whatever we were given if
        // it does not parse (validation rejects that before it gets here).
        let mac = MacAddress::parse(&r.mac).map_or_else(|_| r.mac.clone(), |m| m.to_colon_string());
        Self {
            uuid: None,
            mac,
            ipaddr: r.ip.trim().to_owned(),
            hostname: r.hostname.clone(),
            descr: r.description.clone(),
            disabled: r.disabled,
            interface: r.interface.clone(),
        }
    }
}

pub(crate) fn reservation_with_uuid(uuid: String, record: ReservationRecord) -> DhcpReservation {
    let mut reservation = DhcpReservation::from(record);
    reservation.uuid = Some(uuid);
    reservation
}

// ── Aliases ────────────────────────────────────────────────────────

impl From<AliasRecord> for FirewallAlias {
    fn from(a: AliasRecord) -> Self {
        Self {
            uuid: a.uuid.filter(|u| !u.is_empty()),
            name: a.name,
            alias_type: a.alias_type.into(),
            content: a.content,
            description: a.description,
            enabled: a.enabled,
            update_freq: Some(a.updatefreq).filter(|f| !f.is_empty()),
        }
    }
}

impl From<&FirewallAlias> for AliasRecord {
    fn from(a: &FirewallAlias) -> Self {
        Self {
            uuid: None,
            name: a.name.clone(),
            alias_type: a.alias_type.to_string(),
            content: a.content.clone(),
            description: a.description.clone(),
            enabled: a.enabled,
            updatefreq: a.update_freq.clone().unwrap_or_default(),
        }
    }
}

pub(crate) fn alias_with_uuid(uuid: String, record: AliasRecord) -> FirewallAlias {
    let mut alias = FirewallAlias::from(record);
    alias.uuid = Some(uuid);
    alias
}
