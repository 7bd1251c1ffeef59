//! CLI configuration — thin wrapper around `opnsync_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--router, --api-key, etc.).

use std::time::Duration;

use secrecy::SecretString;

use opnsync_core::{BidirectionalSyncConfig, RouterConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use opnsync_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Everything a router-bound command needs.
#[derive(Debug)]
pub struct ResolvedRouter {
    pub profile_name: String,
    pub router: RouterConfig,
    /// Profile sync defaults; `sync` flags are layered on top.
    pub sync: BidirectionalSyncConfig,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the router connection from the config file, profile, and flags.
pub fn resolve_router(global: &GlobalOpts) -> Result<ResolvedRouter, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() && global.router.is_none() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    // No profile -- build from flags / env vars alone
    let url_str = global.router.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = opnsync_config::parse_router_url(url_str)?;

    let api_key = global.api_key.clone().ok_or_else(|| CliError::NoCredentials {
        profile: profile_name.clone(),
        what: "key".into(),
    })?;
    let api_secret = global
        .api_secret
        .clone()
        .map(SecretString::from)
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.clone(),
            what: "secret".into(),
        })?;

    let mut router = RouterConfig::new(url, api_key, api_secret);
    if global.insecure || cfg.defaults.insecure {
        router.tls = TlsVerification::DangerAcceptInvalid;
    }
    router.timeout = Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout));

    Ok(ResolvedRouter {
        profile_name,
        router,
        sync: BidirectionalSyncConfig::default(),
    })
}

/// Translate a `Profile` + global flags into a `RouterConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ResolvedRouter, CliError> {
    // 1. Router URL (flag > env > profile)
    let url_str = global.router.as_deref().unwrap_or(&profile.router);
    let url = opnsync_config::parse_router_url(url_str)?;

    // 2. Credentials (flag > profile chain)
    let api_key = match global.api_key {
        Some(ref key) => key.clone(),
        None => opnsync_config::resolve_api_key(profile, profile_name)?,
    };
    let api_secret = match global.api_secret {
        Some(ref secret) => SecretString::from(secret.clone()),
        None => opnsync_config::resolve_api_secret(profile, profile_name)?,
    };

    let mut router = RouterConfig::new(url, api_key, api_secret);

    // 3. TLS verification
    router.tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        opnsync_config::tls_for(profile, defaults.insecure)
    };

    // 4. Timeout
    router.timeout = Duration::from_secs(
        global
            .timeout
            .or(profile.timeout)
            .unwrap_or(defaults.timeout),
    );

    Ok(ResolvedRouter {
        profile_name: profile_name.to_owned(),
        router,
        sync: profile.sync.to_sync_config(),
    })
}
