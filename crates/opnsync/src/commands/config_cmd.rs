//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Input, Select};

use opnsync_core::ConflictResolution;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Defaults, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking sensitive fields.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let p = &cfg.profiles[name];
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "router = \"{}\"", p.router);
        if let Some(ref key) = p.api_key {
            let _ = writeln!(out, "api_key = \"{key}\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if p.api_secret.is_some() {
            let _ = writeln!(out, "api_secret = \"****\"");
        }
        if let Some(ref env) = p.api_secret_env {
            let _ = writeln!(out, "api_secret_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }

        let s = &p.sync;
        let _ = writeln!(out, "sync.conflict_resolution = \"{}\"", s.conflict_resolution);
        let _ = writeln!(out, "sync.import_from_opnsense = {}", s.import_from_opnsense);
        let _ = writeln!(out, "sync.export_to_opnsense = {}", s.export_to_opnsense);
        if !s.firewall_alias_names.is_empty() {
            let _ = writeln!(out, "sync.firewall_alias_names = {:?}", s.firewall_alias_names);
        }
        if let Some(ref interface) = s.interface {
            let _ = writeln!(out, "sync.interface = \"{interface}\"");
        }
    }

    out
}

/// Delegate to the shared config crate's save function.
fn save_config(cfg: &Config) -> Result<(), CliError> {
    config::save_config(cfg)?;
    Ok(())
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .collect()
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    let key = key.replace('-', "_");
    match key.as_str() {
        "router" => {
            opnsync_config::parse_router_url(&value)?;
            profile.router = value;
        }
        "api_key" => profile.api_key = Some(value),
        "api_key_env" => profile.api_key_env = Some(value),
        "api_secret_env" => profile.api_secret_env = Some(value),
        "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        "ca_cert" => profile.ca_cert = Some(value.into()),

        "sync.conflict_resolution" | "sync.strategy" => {
            profile.sync.conflict_resolution = ConflictResolution::parse_lenient(&value);
        }
        "sync.import_from_opnsense" => {
            profile.sync.import_from_opnsense = parse_bool(&key, &value)?;
        }
        "sync.export_to_opnsense" => profile.sync.export_to_opnsense = parse_bool(&key, &value)?,
        "sync.sync_firewall_aliases" => {
            profile.sync.sync_firewall_aliases = parse_bool(&key, &value)?;
        }
        "sync.import_only_shelly" => profile.sync.import_only_shelly = parse_bool(&key, &value)?,
        "sync.import_interface" => profile.sync.import_interface = non_empty(value),
        "sync.interface" => profile.sync.interface = non_empty(value),
        "sync.hostname_template" => profile.sync.hostname_template = non_empty(value),
        "sync.firewall_alias_names" => profile.sync.firewall_alias_names = split_list(&value),
        "sync.shelly_keywords" => profile.sync.shelly_keywords = split_list(&value),
        "sync.apply_changes" => profile.sync.apply_changes = parse_bool(&key, &value)?,
        "sync.create_missing_aliases" => {
            profile.sync.create_missing_aliases = parse_bool(&key, &value)?;
        }
        "sync.delete_orphaned" => profile.sync.delete_orphaned = parse_bool(&key, &value)?,
        "sync.backup_before_changes" => {
            profile.sync.backup_before_changes = parse_bool(&key, &value)?;
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: router, api_key, api_key_env, \
                     api_secret_env, insecure, timeout, ca_cert, sync.<option>"
                ),
            });
        }
    }
    Ok(())
}

fn store_secret(profile_name: &str, secret: &str) -> Result<(), CliError> {
    opnsync_config::store_api_secret(profile_name, secret)?;
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("opnsync — configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let router: String = Input::new()
                .with_prompt("Router URL")
                .default("https://192.168.1.1".into())
                .interact_text()
                .map_err(prompt_err)?;
            opnsync_config::parse_router_url(&router)?;

            let api_key: String = Input::new()
                .with_prompt("API key")
                .interact_text()
                .map_err(prompt_err)?;

            let secret = rpassword::prompt_password("API secret: ").map_err(prompt_err)?;
            if api_key.is_empty() || secret.is_empty() {
                return Err(CliError::Validation {
                    field: "credentials".into(),
                    reason: "API key and secret cannot be empty".into(),
                });
            }

            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
            ];
            let selection = Select::new()
                .with_prompt("Where to store the API secret?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;
            let api_secret = if selection == 0 {
                store_secret(&profile_name, &secret)?;
                eprintln!("   ✓ API secret stored in system keyring");
                None
            } else {
                Some(secret)
            };

            let profile = Profile {
                router,
                api_key: Some(api_key),
                api_secret,
                ..Profile::default()
            };

            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);

            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles,
            };

            save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: opnsync reservations list --insecure");

            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            for profile in cfg.profiles.values_mut() {
                if profile.api_secret.is_some() {
                    profile.api_secret = Some("****".into());
                }
            }
            let out = output::render_single(&global.output, &cfg, format_config_redacted, |_| {
                "config".into()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);

            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: opnsync config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();

            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    name,
                    available: config::available_profiles(&cfg),
                });
            }

            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetSecret ───────────────────────────────────────────────
        ConfigCommand::SetSecret { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));

            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    name: profile_name,
                    available: config::available_profiles(&cfg),
                });
            }

            let secret = rpassword::prompt_password("API secret: ").map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "secret".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            store_secret(&profile_name, &secret)?;

            eprintln!("✓ API secret stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}
