//! Reservation command handlers.

use std::sync::Arc;

use tabled::Tabled;

use opnsync_api::OpnSenseClient;
use opnsync_core::{DhcpReservation, ReservationStore};

use crate::cli::{GlobalOpts, ReservationsArgs, ReservationsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ReservationRow {
    #[tabled(rename = "UUID")]
    uuid: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Interface")]
    interface: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&DhcpReservation> for ReservationRow {
    fn from(r: &DhcpReservation) -> Self {
        Self {
            uuid: r.uuid.clone().unwrap_or_default(),
            mac: r.mac.clone(),
            ip: r.ip.clone(),
            hostname: util::or_dash(&r.hostname),
            interface: util::or_dash(&r.interface),
            description: util::or_dash(&r.description),
        }
    }
}

fn detail(r: &DhcpReservation) -> String {
    [
        format!("UUID:        {}", r.uuid.as_deref().unwrap_or("-")),
        format!("MAC:         {}", r.mac),
        format!("IP:          {}", r.ip),
        format!("Hostname:    {}", util::or_dash(&r.hostname)),
        format!("Interface:   {}", util::or_dash(&r.interface)),
        format!("Description: {}", util::or_dash(&r.description)),
        format!("Disabled:    {}", r.disabled),
    ]
    .join("\n")
}

fn print_one(r: &DhcpReservation, global: &GlobalOpts) {
    let out = output::render_single(&global.output, r, detail, |r| {
        r.uuid.clone().unwrap_or_default()
    });
    output::print_output(&out, global.quiet);
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: Arc<OpnSenseClient>,
    args: ReservationsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let store = ReservationStore::new(client);

    match args.command {
        ReservationsCommand::List { interface } => {
            let all = store.list(interface.as_deref()).await?;
            let out = output::render_list(&global.output, &all, |r| ReservationRow::from(r), |r| {
                r.uuid.clone().unwrap_or_default()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ReservationsCommand::Get { uuid } => {
            let reservation = store.get(&uuid).await?;
            print_one(&reservation, global);
            Ok(())
        }

        ReservationsCommand::Find { mac, ip, interface } => {
            let reservation = match (mac, ip) {
                (Some(mac), _) => store.find_by_mac(&mac, interface.as_deref()).await?,
                (None, Some(ip)) => store.find_by_ip(&ip, interface.as_deref()).await?,
                (None, None) => {
                    return Err(CliError::Validation {
                        field: "find".into(),
                        reason: "pass --mac or --ip".into(),
                    });
                }
            };
            print_one(&reservation, global);
            Ok(())
        }

        ReservationsCommand::Create {
            mac,
            ip,
            hostname,
            description,
            interface,
            apply,
        } => {
            let reservation = DhcpReservation {
                description,
                interface,
                ..DhcpReservation::new(mac, ip, hostname)
            };
            let response = store.create(&reservation).await?;
            if apply {
                store.apply_configuration().await?;
            }
            if !global.quiet {
                eprintln!(
                    "Reservation created{}",
                    response.uuid.map(|u| format!(": {u}")).unwrap_or_default()
                );
            }
            Ok(())
        }

        ReservationsCommand::Delete { uuid, apply } => {
            if !util::confirm(&format!("Delete reservation {uuid}?"), global.yes)? {
                return Ok(());
            }
            store.delete(&uuid).await?;
            if apply {
                store.apply_configuration().await?;
            }
            if !global.quiet {
                eprintln!("Reservation deleted");
            }
            Ok(())
        }

        ReservationsCommand::Apply => {
            let response = store.apply_configuration().await?;
            if !global.quiet {
                eprintln!("DHCP configuration applied (status: {})", response.status);
            }
            Ok(())
        }
    }
}
