//! `opnsync sync` — one bidirectional reconciliation run.

use std::fmt::Write as _;
use std::sync::Arc;

use tabled::Tabled;
use tokio_util::sync::CancellationToken;

use opnsync_api::OpnSenseClient;
use opnsync_core::{
    BidirectionalSyncConfig, BidirectionalSyncResult, ConflictResolution, DeviceMapping,
    SyncConflict, SyncOrchestrator,
};

use crate::cli::{GlobalOpts, Strategy, SyncArgs};
use crate::config::ResolvedRouter;
use crate::error::CliError;
use crate::output;

use super::util;

impl From<Strategy> for ConflictResolution {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Manual => Self::Manual,
            Strategy::ManagerWins => Self::ManagerWins,
            Strategy::OpnsenseWins => Self::OpnsenseWins,
            Strategy::Skip => Self::Skip,
        }
    }
}

/// Layer `sync` flags over the profile's sync defaults.
fn build_config(base: &BidirectionalSyncConfig, args: &SyncArgs) -> BidirectionalSyncConfig {
    let mut config = base.clone();
    config.options.dry_run = args.dry_run;

    if let Some(strategy) = args.strategy {
        config.conflict_resolution = strategy.into();
    }
    if args.import {
        config.import_from_opnsense = true;
    }
    if args.import_all {
        config.import_only_shelly = false;
    }
    if let Some(ref interface) = args.import_interface {
        config.import_interface = Some(interface.clone());
    }
    if args.no_export {
        config.export_to_opnsense = false;
    }
    if !args.aliases.is_empty() {
        config.sync_firewall_aliases = true;
        config.firewall_alias_names.clone_from(&args.aliases);
    }
    config.shelly_keywords.extend(args.keywords.iter().cloned());
    if let Some(ref interface) = args.interface {
        config.options.interface = Some(interface.clone());
    }
    if let Some(ref template) = args.hostname_template {
        config.options.hostname_template = Some(template.clone());
    }
    if args.apply {
        config.options.apply_changes = true;
    } else if args.no_apply {
        config.options.apply_changes = false;
    }
    if args.delete_orphaned {
        config.options.delete_orphaned = true;
    }
    if args.backup_file.is_some() {
        config.options.backup_before_changes = true;
    }
    config
}

// ── Table rendering ─────────────────────────────────────────────────

#[derive(Tabled)]
struct ConflictRow {
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Fleet")]
    fleet: String,
    #[tabled(rename = "Router")]
    router: String,
    #[tabled(rename = "Resolution")]
    resolution: String,
}

impl From<&SyncConflict> for ConflictRow {
    fn from(c: &SyncConflict) -> Self {
        Self {
            mac: c.device_mac.clone(),
            field: c.conflict_type.to_string(),
            fleet: c.shelly_manager_value.clone(),
            router: c.opnsense_value.clone(),
            resolution: c.resolution.to_string(),
        }
    }
}

fn summary(result: &BidirectionalSyncResult, dry_run: bool, color: bool) -> String {
    let mut out = String::new();
    let title = if dry_run { "Sync plan (dry run)" } else { "Sync" };
    let _ = writeln!(
        out,
        "{} {}",
        output::status_mark(result.success, color),
        output::heading(title, color)
    );
    let _ = writeln!(out, "  Devices:        {}", result.total_devices);
    let _ = writeln!(
        out,
        "  Imported:       {} ({} skipped)",
        result.imported_devices, result.skipped_imports
    );
    let _ = writeln!(
        out,
        "  Reservations:   +{} ~{} -{}",
        result.reservations_added, result.reservations_updated, result.reservations_deleted
    );
    let _ = writeln!(out, "  Aliases:        {}", result.aliases_updated);
    let _ = writeln!(out, "  Duration:       {} ms", result.duration.as_millis());

    if !result.conflicts.is_empty() {
        let rows: Vec<ConflictRow> = result
            .conflicts
            .iter()
            .map(|c| ConflictRow::from(c))
            .collect();
        let _ = writeln!(out, "\n{}", output::heading("Conflicts", color));
        let _ = writeln!(out, "{}", output::render_table(&rows));
    }
    for warning in &result.warnings {
        let _ = writeln!(out, "{}", output::warning(&format!("warning: {warning}"), color));
    }
    for error in &result.errors {
        let _ = writeln!(out, "error: {error}");
    }
    out.trim_end().to_owned()
}

fn resolved_ids(result: &BidirectionalSyncResult) -> String {
    result
        .resolved_devices
        .iter()
        .map(|d: &DeviceMapping| format!("{} {}", d.shelly_mac, d.shelly_ip))
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: Arc<OpnSenseClient>,
    args: SyncArgs,
    resolved: &ResolvedRouter,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let fleet: Vec<DeviceMapping> = util::read_data_file(&args.devices)?;
    let config = build_config(&resolved.sync, &args);
    tracing::info!(
        profile = %resolved.profile_name,
        devices = fleet.len(),
        dry_run = config.options.dry_run,
        strategy = %config.conflict_resolution.as_str(),
        "starting sync"
    );

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Interrupt received; stopping after the current step");
                cancel.cancel();
            }
        })
    };

    let orchestrator = SyncOrchestrator::new(client).with_cancellation(cancel);
    let outcome = orchestrator.perform_bidirectional_sync(&fleet, &config).await;
    watcher.abort();
    let result = outcome?;

    if let (Some(path), Some(backup)) = (&args.backup_file, &result.backup) {
        util::write_json_file(path, backup)?;
        if !global.quiet {
            eprintln!("Router snapshot written to {}", path.display());
        }
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &result,
        |r| summary(r, config.options.dry_run, color),
        resolved_ids,
    );
    output::print_output(&out, global.quiet);

    if result.success {
        Ok(())
    } else {
        Err(CliError::SyncFailed {
            count: result.errors.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use clap::Parser;

    use super::*;
    use crate::cli::{Cli, Command};

    fn args(extra: &[&str]) -> SyncArgs {
        let mut argv = vec!["opnsync", "sync", "--devices", "fleet.json"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).map(|cli| cli.command) {
            Ok(Command::Sync(args)) => args,
            _ => panic!("sync arguments should parse"),
        }
    }

    #[test]
    fn flags_override_profile_defaults() {
        let base = BidirectionalSyncConfig {
            shelly_keywords: vec!["plug".into()],
            firewall_alias_names: vec!["PROFILE_ALIAS".into()],
            ..BidirectionalSyncConfig::default()
        };
        let config = build_config(
            &base,
            &args(&[
                "--dry-run",
                "--strategy",
                "manager-wins",
                "--import",
                "--import-all",
                "--alias",
                "CLI_ALIAS",
                "--keyword",
                "dimmer",
                "--no-apply",
                "--backup-file",
                "snap.json",
            ]),
        );

        assert!(config.options.dry_run);
        assert_eq!(config.conflict_resolution, ConflictResolution::ManagerWins);
        assert!(config.import_from_opnsense);
        assert!(!config.import_only_shelly);
        assert!(config.sync_firewall_aliases);
        assert_eq!(config.firewall_alias_names, ["CLI_ALIAS"]);
        assert_eq!(config.shelly_keywords, ["plug", "dimmer"]);
        assert!(!config.options.apply_changes);
        assert!(config.options.backup_before_changes);
    }

    #[test]
    fn skip_strategy_reaches_the_resolver() {
        let config = build_config(&BidirectionalSyncConfig::default(), &args(&["-s", "skip"]));
        assert_eq!(config.conflict_resolution, ConflictResolution::Skip);
    }

    #[test]
    fn profile_defaults_survive_without_flags() {
        let base = BidirectionalSyncConfig {
            conflict_resolution: ConflictResolution::OpnsenseWins,
            ..BidirectionalSyncConfig::default()
        };
        let config = build_config(&base, &args(&[]));
        assert_eq!(config.conflict_resolution, ConflictResolution::OpnsenseWins);
        assert!(config.export_to_opnsense);
        assert!(config.options.apply_changes);
        assert!(!config.options.dry_run);
        assert!(!config.options.backup_before_changes);
    }

    #[test]
    fn summary_lists_counts_and_errors() {
        let result = BidirectionalSyncResult {
            total_devices: 3,
            reservations_added: 1,
            errors: vec!["import failed".into()],
            duration: Duration::from_millis(12),
            ..BidirectionalSyncResult::default()
        };
        let text = summary(&result, true, false);
        assert!(text.starts_with("✗ Sync plan (dry run)"));
        assert!(text.contains("+1 ~0 -0"));
        assert!(text.contains("error: import failed"));
    }
}
