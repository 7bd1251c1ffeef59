//! Firewall alias command handlers.

use std::sync::Arc;

use tabled::Tabled;

use opnsync_api::OpnSenseClient;
use opnsync_core::{AliasStore, DeviceMapping, FirewallAlias};

use crate::cli::{AliasesArgs, AliasesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct AliasRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    alias_type: String,
    #[tabled(rename = "Entries")]
    entries: usize,
    #[tabled(rename = "Enabled")]
    enabled: bool,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&FirewallAlias> for AliasRow {
    fn from(a: &FirewallAlias) -> Self {
        Self {
            name: a.name.clone(),
            alias_type: a.alias_type.to_string(),
            entries: a.content.len(),
            enabled: a.enabled,
            description: util::or_dash(&a.description),
        }
    }
}

fn detail(a: &FirewallAlias) -> String {
    let mut lines = vec![
        format!("UUID:        {}", a.uuid.as_deref().unwrap_or("-")),
        format!("Name:        {}", a.name),
        format!("Type:        {}", a.alias_type),
        format!("Enabled:     {}", a.enabled),
        format!("Description: {}", util::or_dash(&a.description)),
        "Content:".to_owned(),
    ];
    lines.extend(a.content.iter().map(|entry| format!("  {entry}")));
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: Arc<OpnSenseClient>,
    args: AliasesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = AliasStore::new(client);

    match args.command {
        AliasesCommand::List => {
            let all = store.list().await?;
            let out = output::render_list(&global.output, &all, |a| AliasRow::from(a), |a| {
                a.name.clone()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AliasesCommand::Get { name } => {
            let alias = store.find_by_name(&name).await?;
            let out = output::render_single(&global.output, &alias, detail, |a| {
                a.content.join("\n")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AliasesCommand::UpdateDevices {
            name,
            devices,
            create,
            apply,
        } => {
            let devices: Vec<DeviceMapping> = util::read_data_file(&devices)?;
            store
                .update_shelly_device_alias(&name, &devices, create)
                .await?;
            if apply {
                store.apply_configuration().await?;
            }
            if !global.quiet {
                eprintln!("Alias '{name}' updated");
            }
            Ok(())
        }

        AliasesCommand::Apply => {
            let response = store.apply_configuration().await?;
            if !global.quiet {
                eprintln!("Alias configuration applied (status: {})", response.status);
            }
            Ok(())
        }
    }
}
