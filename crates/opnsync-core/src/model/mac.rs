// ── MAC identity ──
//
// The normalized MAC (lower-case hex, separators stripped) is the only key
// shared by the fleet registry and the router. Every MAC-keyed lookup goes
// through `normalize_mac`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Strip `:`/`-` separators and lower-case. Does not validate.
pub fn normalize_mac(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != ':' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Parse `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff` or `aabbccddeeff`.
fn parse_octets(raw: &str) -> Option<[u8; 6]> {
    let raw = raw.trim();
    let hex = match (raw.contains(':'), raw.contains('-')) {
        (false, false) => raw.to_owned(),
        (true, true) => return None,
        (colon, _) => {
            let sep = if colon { ':' } else { '-' };
            let parts: Vec<&str> = raw.split(sep).collect();
            if parts.len() != 6 || parts.iter().any(|p| p.len() != 2) {
                return None;
            }
            parts.concat()
        }
    };

    if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let mut octets = [0u8; 6];
    for (i, slot) in octets.iter_mut().enumerate() {
        *slot = u8::from_str_radix(hex.get(i * 2..i * 2 + 2)?, 16).ok()?;
    }
    Some(octets)
}

/// MAC address held in normalized form (`aabbccddeeff`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    /// Normalize any common format. Use [`MacAddress::parse`] to also validate.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(normalize_mac(raw.as_ref()))
    }

    /// Parse and validate exactly six octets.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        parse_octets(raw)
            .map(|octets| Self(octets.iter().map(|o| format!("{o:02x}")).collect()))
            .ok_or_else(|| {
                CoreError::validation("mac", format!("'{raw}' is not a 6-octet MAC address"))
            })
    }

    pub fn is_valid(raw: &str) -> bool {
        parse_octets(raw).is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Vendor prefix: the first six hex digits.
    pub fn oui(&self) -> Option<&str> {
        self.0.get(..6)
    }

    /// The last `n` hex digits (or the whole key if shorter).
    pub fn suffix(&self, n: usize) -> &str {
        let start = self.0.len().saturating_sub(n);
        self.0.get(start..).unwrap_or(&self.0)
    }

    /// Colon-separated display form (`aa:bb:cc:dd:ee:ff`).
    pub fn to_colon_string(&self) -> String {
        let bytes = self.0.as_bytes();
        if bytes.len() != 12 {
            return self.0.clone();
        }
        bytes
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(":")
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}
