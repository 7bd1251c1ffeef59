// ── Field validation and hostname sanitization ──
//
// Everything here is pure. Stores call these before any request is built,
// so a `CoreError::Validation` never costs a round trip.

use std::net::IpAddr;

use crate::error::CoreError;
use crate::model::{AliasType, DhcpReservation, FirewallAlias, MacAddress};

pub const MAX_HOSTNAME_LEN: usize = 63;
pub const MAX_ALIAS_NAME_LEN: usize = 32;
pub const FALLBACK_HOSTNAME: &str = "shelly-device";

/// Reduce arbitrary text to a DNS label: `[a-z0-9-]`, at most 63 characters,
/// no leading or trailing hyphen.
pub fn sanitize_hostname(raw: &str) -> String {
    let mapped: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();

    let mut label = mapped.trim_matches('-').to_owned();
    label.truncate(MAX_HOSTNAME_LEN);
    let label = label.trim_end_matches('-');

    if label.is_empty() {
        FALLBACK_HOSTNAME.to_owned()
    } else {
        label.to_owned()
    }
}

pub fn parse_ip(raw: &str) -> Result<IpAddr, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::validation("ip", format!("'{raw}' is not an IP address")))
}

pub fn validate_hostname(raw: &str) -> Result<(), CoreError> {
    if raw.trim().is_empty() {
        return Err(CoreError::validation("hostname", "must not be empty"));
    }
    if sanitize_hostname(raw).len() > MAX_HOSTNAME_LEN {
        return Err(CoreError::validation(
            "hostname",
            format!("longer than {MAX_HOSTNAME_LEN} characters"),
        ));
    }
    Ok(())
}

pub fn validate_reservation(reservation: &DhcpReservation) -> Result<(), CoreError> {
    MacAddress::parse(&reservation.mac)?;
    parse_ip(&reservation.ip)?;
    validate_hostname(&reservation.hostname)
}

pub fn validate_alias_name(name: &str) -> Result<(), CoreError> {
    if name.is_empty() {
        return Err(CoreError::validation("name", "must not be empty"));
    }
    if name.chars().count() > MAX_ALIAS_NAME_LEN {
        return Err(CoreError::validation(
            "name",
            format!("'{name}' is longer than {MAX_ALIAS_NAME_LEN} characters"),
        ));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(CoreError::validation(
            "name",
            format!("'{name}' may only contain letters, digits and underscores"),
        ));
    }
    Ok(())
}

pub fn validate_alias(alias: &FirewallAlias) -> Result<(), CoreError> {
    validate_alias_name(&alias.name)?;

    if let AliasType::Other(raw) = &alias.alias_type {
        return Err(CoreError::validation(
            "type",
            format!("unsupported alias type '{raw}'"),
        ));
    }
    if alias.content.is_empty() {
        return Err(CoreError::validation("content", "must not be empty"));
    }

    for entry in &alias.content {
        let ok = match alias.alias_type {
            AliasType::Host | AliasType::Network => is_ip_or_cidr(entry),
            AliasType::Port => is_port_or_range(entry),
            _ => !entry.trim().is_empty(),
        };
        if !ok {
            return Err(CoreError::validation(
                "content",
                format!("'{entry}' is not valid for a {} alias", alias.alias_type),
            ));
        }
    }
    Ok(())
}

/// `10.0.0.1`, `fd00::1`, `10.0.0.0/24` or `fd00::/64`.
pub fn is_ip_or_cidr(raw: &str) -> bool {
    let raw = raw.trim();
    match raw.split_once('/') {
        None => raw.parse::<IpAddr>().is_ok(),
        Some((addr, prefix)) => {
            let Ok(addr) = addr.parse::<IpAddr>() else {
                return false;
            };
            let max = if addr.is_ipv4() { 32 } else { 128 };
            prefix.parse::<u8>().is_ok_and(|p| p <= max)
        }
    }
}

/// A single port `1..=65535`, or `N-M` / `N:M` with `N <= M`.
pub fn is_port_or_range(raw: &str) -> bool {
    let port = |s: &str| s.trim().parse::<u16>().ok().filter(|p| *p > 0);
    let raw = raw.trim();
    match raw.split_once(['-', ':']) {
        None => port(raw).is_some(),
        Some((start, end)) => match (port(start), port(end)) {
            (Some(start), Some(end)) => start <= end,
            _ => false,
        },
    }
}
