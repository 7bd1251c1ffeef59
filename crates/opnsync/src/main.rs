mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Offline commands never touch the router
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),
        Command::Classify(args) => commands::classify::handle(&args, &cli.global),
        Command::Hostname(args) => commands::hostname::handle(&args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "opnsync", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let resolved = config::resolve_router(&cli.global)?;
            let client = Arc::new(resolved.router.client()?);

            tracing::debug!(command = ?cmd, router = %resolved.router.url, "dispatching command");
            commands::dispatch(cmd, client, &resolved, &cli.global).await
        }
    }
}
