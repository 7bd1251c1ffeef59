// ── Firewall alias ──

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Alias kind as understood by OPNsense.
///
/// Unknown kinds are kept as `Other` so listing a router never fails on
/// them; validation rejects `Other` before anything is written back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AliasType {
    Host,
    Network,
    Port,
    Url,
    UrlPorts,
    UrlTable,
    GeoIp,
    NetworkGroup,
    Mac,
    DynIpv6Host,
    OpenVpnGroup,
    Other(String),
}

impl AliasType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Host => "host",
            Self::Network => "network",
            Self::Port => "port",
            Self::Url => "url",
            Self::UrlPorts => "url_ports",
            Self::UrlTable => "urltable",
            Self::GeoIp => "geoip",
            Self::NetworkGroup => "networkgroup",
            Self::Mac => "mac",
            Self::DynIpv6Host => "dynipv6host",
            Self::OpenVpnGroup => "openvpngroup",
            Self::Other(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for AliasType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "host" => Self::Host,
            "network" => Self::Network,
            "port" => Self::Port,
            "url" => Self::Url,
            "url_ports" => Self::UrlPorts,
            "urltable" => Self::UrlTable,
            "geoip" => Self::GeoIp,
            "networkgroup" => Self::NetworkGroup,
            "mac" => Self::Mac,
            "dynipv6host" => Self::DynIpv6Host,
            "openvpngroup" => Self::OpenVpnGroup,
            _ => Self::Other(s.to_owned()),
        })
    }
}

impl From<String> for AliasType {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(t) => t,
            Err(never) => match never {},
        }
    }
}

impl From<AliasType> for String {
    fn from(t: AliasType) -> Self {
        match t {
            AliasType::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for AliasType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named group of hosts, networks or ports referenced by firewall rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallAlias {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub alias_type: AliasType,
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default = "enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_freq: Option<String>,
}

fn enabled() -> bool {
    true
}

impl FirewallAlias {
    /// An enabled `host` alias with the given addresses.
    pub fn host(name: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            uuid: None,
            name: name.into(),
            alias_type: AliasType::Host,
            content,
            description: String::new(),
            enabled: true,
            update_freq: None,
        }
    }
}
