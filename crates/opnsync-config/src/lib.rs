//! Configuration for the opnsync CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `opnsync_core::RouterConfig` / `BidirectionalSyncConfig`.
//! The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use opnsync_core::{
    BidirectionalSyncConfig, ConflictResolution, RouterConfig, SyncOptions, TlsVerification,
};

pub const KEYRING_SERVICE: &str = "opnsync";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API {what} configured for profile '{profile}'")]
    NoCredentials { profile: String, what: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named router profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named router profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Router base URL (e.g., "https://192.168.1.1").
    pub router: String,

    /// API key (the basic-auth user name; not secret on its own).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// API secret in plaintext. Prefer the keyring or an env var.
    pub api_secret: Option<String>,

    /// Environment variable name containing the API secret.
    pub api_secret_env: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Reconciliation defaults for `opnsync sync`.
    #[serde(default)]
    pub sync: SyncProfile,
}

/// Per-profile sync defaults. Dry run is never persisted.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct SyncProfile {
    pub conflict_resolution: ConflictResolution,
    pub import_from_opnsense: bool,
    pub export_to_opnsense: bool,
    pub sync_firewall_aliases: bool,
    pub import_only_shelly: bool,
    pub import_interface: Option<String>,
    pub interface: Option<String>,
    pub hostname_template: Option<String>,
    pub firewall_alias_names: Vec<String>,
    pub shelly_keywords: Vec<String>,
    pub apply_changes: bool,
    pub create_missing_aliases: bool,
    pub delete_orphaned: bool,
    pub backup_before_changes: bool,
}

impl Default for SyncProfile {
    fn default() -> Self {
        let base = BidirectionalSyncConfig::default();
        Self {
            conflict_resolution: base.conflict_resolution,
            import_from_opnsense: base.import_from_opnsense,
            export_to_opnsense: base.export_to_opnsense,
            sync_firewall_aliases: base.sync_firewall_aliases,
            import_only_shelly: base.import_only_shelly,
            import_interface: None,
            interface: None,
            hostname_template: None,
            firewall_alias_names: Vec::new(),
            shelly_keywords: Vec::new(),
            apply_changes: base.options.apply_changes,
            create_missing_aliases: base.options.create_missing_aliases,
            delete_orphaned: base.options.delete_orphaned,
            backup_before_changes: base.options.backup_before_changes,
        }
    }
}

impl SyncProfile {
    pub fn to_sync_config(&self) -> BidirectionalSyncConfig {
        BidirectionalSyncConfig {
            options: SyncOptions {
                dry_run: false,
                apply_changes: self.apply_changes,
                backup_before_changes: self.backup_before_changes,
                interface: self.interface.clone(),
                hostname_template: self.hostname_template.clone(),
                create_missing_aliases: self.create_missing_aliases,
                delete_orphaned: self.delete_orphaned,
            },
            conflict_resolution: self.conflict_resolution,
            import_from_opnsense: self.import_from_opnsense,
            export_to_opnsense: self.export_to_opnsense,
            sync_firewall_aliases: self.sync_firewall_aliases,
            import_only_shelly: self.import_only_shelly,
            import_interface: self.import_interface.clone(),
            firewall_alias_names: self.firewall_alias_names.clone(),
            shelly_keywords: self.shelly_keywords.clone(),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "opnsync", "opnsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("opnsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("OPNSYNC_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Parse a config document without touching the file system or environment.
pub fn parse_config(toml_str: &str) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::string(toml_str));
    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/api-secret")
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn keyring_lookup(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .ok()
        .and_then(|entry| entry.get_password().ok())
}

/// Resolve the API key: `api_key_env` → plaintext `api_key`.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    resolve_api_key_with(profile, profile_name, env_lookup)
}

fn resolve_api_key_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    profile
        .api_key_env
        .as_deref()
        .and_then(&env)
        .or_else(|| profile.api_key.clone().filter(|k| !k.is_empty()))
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
            what: "key".into(),
        })
}

/// Resolve the API secret: `api_secret_env` → keyring → plaintext.
pub fn resolve_api_secret(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    resolve_api_secret_with(profile, profile_name, env_lookup, keyring_lookup)
}

fn resolve_api_secret_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's api_secret_env → env var lookup
    if let Some(secret) = profile.api_secret_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(secret));
    }

    // 2. System keyring
    if let Some(secret) = keyring(profile_name) {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(secret) = profile.api_secret.clone().filter(|s| !s.is_empty()) {
        return Ok(SecretString::from(secret));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
        what: "secret".into(),
    })
}

/// Store the API secret for `profile_name` in the system keyring.
pub fn store_api_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// TLS mode for a profile: insecure wins over a custom CA.
pub fn tls_for(profile: &Profile, defaults_insecure: bool) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults_insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

pub fn parse_router_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "router".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "router".into(),
            reason: format!("expected an http(s) URL, got '{raw}'"),
        });
    }
    Ok(url)
}

/// Build a `RouterConfig` from a profile, without CLI flag overrides.
pub fn profile_to_router_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<RouterConfig, ConfigError> {
    let url = parse_router_url(&profile.router)?;
    let api_key = resolve_api_key(profile, profile_name)?;
    let api_secret = resolve_api_secret(profile, profile_name)?;

    let mut config = RouterConfig::new(url, api_key, api_secret);
    config.tls = tls_for(profile, defaults.insecure);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}
