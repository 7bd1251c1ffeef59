//! `opnsync hostname` — preview generated hostnames offline.

use serde::Serialize;

use opnsync_core::{DeviceMapping, MacAddress, generate_hostname};

use crate::cli::{GlobalOpts, HostnameArgs};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Preview {
    mac: String,
    name: String,
    template: Option<String>,
    hostname: String,
}

pub fn handle(args: &HostnameArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mac = MacAddress::parse(&args.mac)?;
    let device = DeviceMapping::new(mac.to_colon_string(), "").with_name(args.name.clone());
    let preview = Preview {
        hostname: generate_hostname(&device, args.template.as_deref()),
        mac: mac.to_colon_string(),
        name: args.name.clone(),
        template: args.template.clone(),
    };

    let out = output::render_single(
        &global.output,
        &preview,
        |p| p.hostname.clone(),
        |p| p.hostname.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
