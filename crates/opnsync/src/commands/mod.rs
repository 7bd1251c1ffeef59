//! Command dispatch: bridges CLI args -> core stores -> output formatting.

pub mod aliases;
pub mod classify;
pub mod config_cmd;
pub mod hostname;
pub mod reservations;
pub mod sync;
pub mod util;

use std::sync::Arc;

use opnsync_api::OpnSenseClient;

use crate::cli::{Command, GlobalOpts};
use crate::config::ResolvedRouter;
use crate::error::CliError;

/// Dispatch a router-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: Arc<OpnSenseClient>,
    resolved: &ResolvedRouter,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Reservations(args) => reservations::handle(client, args, global).await,
        Command::Aliases(args) => aliases::handle(client, args, global).await,
        Command::Sync(args) => sync::handle(client, args, resolved, global).await,
        // Offline commands are handled before a router is resolved
        Command::Config(_)
        | Command::Classify(_)
        | Command::Hostname(_)
        | Command::Completions(_) => Ok(()),
    }
}
