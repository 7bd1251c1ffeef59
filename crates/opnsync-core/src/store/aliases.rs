// ── Firewall alias store ──
//
// CRUD over `firewall/alias/*` and the host-alias refresh that keeps one
// alias per group in step with the fleet's addresses.

use std::sync::Arc;
use std::time::Instant;

use chrono::{SecondsFormat, Utc};
use indexmap::IndexMap;
use opnsync_api::endpoints::alias;
use opnsync_api::models::{decode, unwrap_item, wrap_item};
use opnsync_api::{
    AliasRecord, AliasSearchResponse, Method, MutationResponse, ReconfigureResponse,
    RouterTransport,
};
use tracing::{debug, info, warn};

use crate::convert::alias_with_uuid;
use crate::error::CoreError;
use crate::model::{DeviceMapping, FirewallAlias, SyncOptions, SyncResult};
use crate::validate::{parse_ip, validate_alias, validate_alias_name};

/// What a device-alias refresh will send.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AliasPlan {
    Update { uuid: String, alias: FirewallAlias },
    Create(FirewallAlias),
}

/// Valid, de-duplicated device addresses in fleet order.
fn device_ips(alias_name: &str, devices: &[DeviceMapping]) -> Result<Vec<String>, CoreError> {
    let mut ips: Vec<String> = Vec::with_capacity(devices.len());
    for device in devices {
        match parse_ip(&device.shelly_ip) {
            Ok(ip) => {
                let ip = ip.to_string();
                if !ips.contains(&ip) {
                    ips.push(ip);
                }
            }
            Err(_) => warn!(
                alias = alias_name,
                mac = %device.shelly_mac,
                ip = %device.shelly_ip,
                "dropping invalid device IP from alias"
            ),
        }
    }

    if ips.is_empty() {
        return Err(CoreError::NoValidIps {
            alias: alias_name.to_owned(),
        });
    }
    Ok(ips)
}

fn stamped_description() -> String {
    format!(
        "Shelly devices (updated {})",
        Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

/// Firewall aliases on one router.
pub struct AliasStore<T> {
    transport: Arc<T>,
}

impl<T> Clone for AliasStore<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: RouterTransport> AliasStore<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub async fn list(&self) -> Result<Vec<FirewallAlias>, CoreError> {
        let value = self
            .transport
            .request(Method::Get, alias::SEARCH_ITEM, None)
            .await?;
        let response: AliasSearchResponse = decode(value)?;
        let aliases: Vec<FirewallAlias> = response
            .aliases
            .into_iter()
            .map(|(uuid, record)| alias_with_uuid(uuid, record))
            .collect();
        debug!(count = aliases.len(), "listed aliases");
        Ok(aliases)
    }

    pub async fn get(&self, uuid: &str) -> Result<FirewallAlias, CoreError> {
        let value = self
            .transport
            .request(Method::Get, &alias::get_item(uuid), None)
            .await?;
        let record: AliasRecord = decode(unwrap_item(value, "alias"))?;
        if record.name.is_empty() {
            return Err(CoreError::not_found("alias", uuid));
        }
        Ok(alias_with_uuid(uuid.to_owned(), record))
    }

    /// Case-insensitive exact match on the alias name.
    pub async fn find_by_name(&self, name: &str) -> Result<FirewallAlias, CoreError> {
        self.list()
            .await?
            .into_iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::not_found("alias", name))
    }

    pub async fn create(&self, alias: &FirewallAlias) -> Result<MutationResponse, CoreError> {
        let body = Self::body(alias)?;
        let value = self
            .transport
            .request(Method::Post, alias::ADD_ITEM, Some(&body))
            .await?;
        let response = decode::<MutationResponse>(value)?.ensure_ok()?;
        debug!(name = %alias.name, uuid = ?response.uuid, "created alias");
        Ok(response)
    }

    pub async fn update(
        &self,
        uuid: &str,
        alias: &FirewallAlias,
    ) -> Result<MutationResponse, CoreError> {
        let body = Self::body(alias)?;
        let value = self
            .transport
            .request(Method::Post, &alias::set_item(uuid), Some(&body))
            .await?;
        let response = decode::<MutationResponse>(value)?.ensure_ok()?;
        debug!(%uuid, name = %alias.name, "updated alias");
        Ok(response)
    }

    pub async fn delete(&self, uuid: &str) -> Result<MutationResponse, CoreError> {
        let value = self
            .transport
            .request(Method::Post, &alias::del_item(uuid), None)
            .await?;
        let response = decode::<MutationResponse>(value)?.ensure_ok()?;
        debug!(%uuid, "deleted alias");
        Ok(response)
    }

    /// Reload the alias tables so pending changes take effect.
    pub async fn apply_configuration(&self) -> Result<ReconfigureResponse, CoreError> {
        let value = self
            .transport
            .request(Method::Post, alias::RECONFIGURE, None)
            .await?;
        let response = decode::<ReconfigureResponse>(value)?.ensure_ok()?;
        info!(changed = response.changed, "applied alias configuration");
        Ok(response)
    }

    fn body(alias: &FirewallAlias) -> Result<serde_json::Value, CoreError> {
        validate_alias(alias)?;
        Ok(wrap_item("alias", &AliasRecord::from(alias))?)
    }

    // ── Device aliases ───────────────────────────────────────────────

    /// Replace the content of `alias_name` with the devices' addresses.
    ///
    /// Invalid addresses are dropped with a warning; if none remain this
    /// fails with `NoValidIps` before touching the router. A missing alias is
    /// created as a `host` alias when `create_if_missing` is set.
    pub async fn update_shelly_device_alias(
        &self,
        alias_name: &str,
        devices: &[DeviceMapping],
        create_if_missing: bool,
    ) -> Result<MutationResponse, CoreError> {
        let plan = self
            .plan_device_alias(alias_name, devices, create_if_missing)
            .await?;
        self.execute(plan).await
    }

    /// Work out the create/update for a device alias using read-only calls.
    async fn plan_device_alias(
        &self,
        alias_name: &str,
        devices: &[DeviceMapping],
        create_if_missing: bool,
    ) -> Result<AliasPlan, CoreError> {
        validate_alias_name(alias_name)?;
        let ips = device_ips(alias_name, devices)?;

        match self.find_by_name(alias_name).await {
            Ok(mut existing) => {
                let Some(uuid) = existing.uuid.clone() else {
                    return Err(CoreError::not_found("alias uuid", alias_name));
                };
                existing.content = ips;
                existing.description = stamped_description();
                validate_alias(&existing)?;
                Ok(AliasPlan::Update {
                    uuid,
                    alias: existing,
                })
            }
            Err(CoreError::NotFound { .. }) if create_if_missing => {
                let mut alias = FirewallAlias::host(alias_name, ips);
                alias.description = stamped_description();
                validate_alias(&alias)?;
                Ok(AliasPlan::Create(alias))
            }
            Err(e) => Err(e),
        }
    }

    async fn execute(&self, plan: AliasPlan) -> Result<MutationResponse, CoreError> {
        match plan {
            AliasPlan::Update { uuid, alias } => self.update(&uuid, &alias).await,
            AliasPlan::Create(alias) => self.create(&alias).await,
        }
    }

    /// Refresh every alias group in insertion order, then apply once.
    ///
    /// A failing group is recorded in `errors` and does not stop the rest.
    /// Under `dry_run` each group is planned with read-only calls and
    /// counted exactly when the real run would send it.
    pub async fn sync_shelly_device_aliases(
        &self,
        groups: &IndexMap<String, Vec<DeviceMapping>>,
        options: &SyncOptions,
    ) -> SyncResult {
        let started = Instant::now();
        let mut result = SyncResult::default();
        let mut changed = false;

        for (name, devices) in groups {
            let plan = match self
                .plan_device_alias(name, devices, options.create_missing_aliases)
                .await
            {
                Ok(plan) => plan,
                Err(e) => {
                    warn!(alias = %name, error = %e, "alias sync failed");
                    result.errors.push(format!("alias {name}: {e}"));
                    continue;
                }
            };

            if options.dry_run {
                info!(alias = %name, create = matches!(plan, AliasPlan::Create(_)), "dry run: would update alias");
                result.aliases_updated += 1;
                continue;
            }

            match self.execute(plan).await {
                Ok(_) => {
                    result.aliases_updated += 1;
                    changed = true;
                }
                Err(e) => {
                    warn!(alias = %name, error = %e, "alias sync failed");
                    result.errors.push(format!("alias {name}: {e}"));
                }
            }
        }

        if changed && options.apply_changes && !options.dry_run {
            if let Err(e) = self.apply_configuration().await {
                warn!(error = %e, "alias apply failed");
                result
                    .warnings
                    .push(format!("failed to apply alias configuration: {e}"));
            }
        }

        result.duration = started.elapsed();
        result.success = result.errors.is_empty();
        result
    }
}
