//! Clap derive structures for the `opnsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// opnsync -- keep OPNsense DHCP reservations and aliases in step with a Shelly fleet
#[derive(Debug, Parser)]
#[command(
    name = "opnsync",
    version,
    about = "Reconcile a Shelly device fleet with an OPNsense router",
    long_about = "Keeps static DHCP reservations and firewall host aliases on an\n\
        OPNsense router consistent with a Shelly device inventory, importing\n\
        Shelly-looking reservations back and resolving conflicts by strategy.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Router profile to use
    #[arg(long, short = 'p', env = "OPNSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Router URL (overrides profile)
    #[arg(long, short = 'r', env = "OPNSYNC_ROUTER", global = true)]
    pub router: Option<String>,

    /// API key
    #[arg(long, env = "OPNSYNC_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// API secret
    #[arg(long, env = "OPNSYNC_API_SECRET", global = true, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "OPNSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "OPNSYNC_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "OPNSYNC_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Strategy {
    /// Keep both values and report the conflict
    Manual,
    /// The fleet's value wins
    ManagerWins,
    /// The router's value wins
    OpnsenseWins,
    /// Leave conflicting fields untouched and report them
    Skip,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage static DHCP reservations
    #[command(alias = "res", alias = "r")]
    Reservations(ReservationsArgs),

    /// Manage firewall aliases
    #[command(alias = "alias", alias = "a")]
    Aliases(AliasesArgs),

    /// Reconcile a device inventory with the router
    Sync(SyncArgs),

    /// Score reservations from a file for Shelly likelihood (offline)
    Classify(ClassifyArgs),

    /// Preview the hostname generated for a device (offline)
    Hostname(HostnameArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RESERVATIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReservationsArgs {
    #[command(subcommand)]
    pub command: ReservationsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReservationsCommand {
    /// List reservations
    #[command(alias = "ls")]
    List {
        /// Only reservations on this interface
        #[arg(long, short = 'i')]
        interface: Option<String>,
    },

    /// Show one reservation by UUID
    Get {
        /// Reservation UUID
        uuid: String,
    },

    /// Look a reservation up by MAC or IP address
    #[command(group(clap::ArgGroup::new("key").required(true).args(["mac", "ip"])))]
    Find {
        /// MAC address (any notation)
        #[arg(long)]
        mac: Option<String>,

        /// IP address
        #[arg(long)]
        ip: Option<String>,

        /// Only search this interface
        #[arg(long, short = 'i')]
        interface: Option<String>,
    },

    /// Create a reservation
    Create {
        #[arg(long)]
        mac: String,

        #[arg(long)]
        ip: String,

        /// Hostname (sanitized before sending)
        #[arg(long)]
        hostname: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, short = 'i', default_value = "")]
        interface: String,

        /// Apply the DHCP configuration afterwards
        #[arg(long)]
        apply: bool,
    },

    /// Delete a reservation by UUID
    #[command(alias = "rm")]
    Delete {
        /// Reservation UUID
        uuid: String,

        /// Apply the DHCP configuration afterwards
        #[arg(long)]
        apply: bool,
    },

    /// Apply pending DHCP changes on the router
    Apply,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALIASES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AliasesArgs {
    #[command(subcommand)]
    pub command: AliasesCommand,
}

#[derive(Debug, Subcommand)]
pub enum AliasesCommand {
    /// List firewall aliases
    #[command(alias = "ls")]
    List,

    /// Show one alias by name (case-insensitive)
    Get {
        /// Alias name
        name: String,
    },

    /// Replace an alias's addresses with those of a device inventory
    UpdateDevices {
        /// Alias name
        name: String,

        /// Device inventory (JSON or YAML list of devices)
        #[arg(long, short = 'd')]
        devices: PathBuf,

        /// Create the alias if it does not exist
        #[arg(long)]
        create: bool,

        /// Apply the alias configuration afterwards
        #[arg(long)]
        apply: bool,
    },

    /// Apply pending alias changes on the router
    Apply,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYNC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct SyncArgs {
    /// Device inventory (JSON or YAML list of devices)
    #[arg(long, short = 'd')]
    pub devices: PathBuf,

    /// Plan and count changes without sending any
    #[arg(long, short = 'n')]
    pub dry_run: bool,

    /// Conflict resolution strategy (overrides profile)
    #[arg(long, short = 's')]
    pub strategy: Option<Strategy>,

    /// Import Shelly reservations from the router
    #[arg(long)]
    pub import: bool,

    /// Import every reservation, not only Shelly-looking ones
    #[arg(long, requires = "import")]
    pub import_all: bool,

    /// Only import reservations from this interface
    #[arg(long, requires = "import")]
    pub import_interface: Option<String>,

    /// Skip writing reservations to the router
    #[arg(long)]
    pub no_export: bool,

    /// Firewall alias to refresh (repeatable)
    #[arg(long = "alias", short = 'a')]
    pub aliases: Vec<String>,

    /// Extra classifier keyword (repeatable)
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Interface for new reservations
    #[arg(long, short = 'i')]
    pub interface: Option<String>,

    /// Hostname template ({name}, {mac4}, {mac})
    #[arg(long)]
    pub hostname_template: Option<String>,

    /// Apply configuration after changes (overrides profile)
    #[arg(long, overrides_with = "no_apply")]
    pub apply: bool,

    /// Leave changes pending on the router
    #[arg(long, overrides_with = "apply")]
    pub no_apply: bool,

    /// Delete managed reservations for devices no longer in the inventory
    #[arg(long)]
    pub delete_orphaned: bool,

    /// Snapshot router state before changing it and write it here
    #[arg(long)]
    pub backup_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OFFLINE TOOLS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Reservations to score (JSON or YAML list)
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    /// Classifier keyword (repeatable; replaces the defaults)
    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Only show reservations classified as Shelly
    #[arg(long)]
    pub only_shelly: bool,
}

#[derive(Debug, Args)]
pub struct HostnameArgs {
    /// Device name
    #[arg(long, default_value = "")]
    pub name: String,

    /// Device MAC address
    #[arg(long)]
    pub mac: String,

    /// Template ({name}, {mac4}, {mac})
    #[arg(long, short = 't')]
    pub template: Option<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Print the config file location
    Path,

    /// Display current resolved configuration
    Show,

    /// Set a profile value
    Set {
        /// Profile key (e.g., "router", "api_key", "sync.interface")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the API secret in the system keyring
    SetSecret {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn sync_flags_parse() {
        let cli = Cli::try_parse_from([
            "opnsync",
            "sync",
            "--devices",
            "fleet.yaml",
            "--dry-run",
            "--strategy",
            "opnsense-wins",
            "--import",
            "--alias",
            "SHELLY",
            "--alias",
            "IOT",
            "--no-apply",
        ])
        .map_err(|e| e.to_string());
        let Ok(Cli {
            command: Command::Sync(args),
            ..
        }) = cli
        else {
            panic!("expected the sync command to parse");
        };
        assert!(args.dry_run);
        assert!(args.import);
        assert!(args.no_apply);
        assert!(!args.apply);
        assert!(matches!(args.strategy, Some(Strategy::OpnsenseWins)));
        assert_eq!(args.aliases, ["SHELLY", "IOT"]);
    }

    #[test]
    fn sync_accepts_skip_strategy() {
        let cli = Cli::try_parse_from(["opnsync", "sync", "-s", "skip"]).map_err(|e| e.to_string());
        let Ok(Cli {
            command: Command::Sync(args),
            ..
        }) = cli
        else {
            panic!("expected the sync command to parse");
        };
        assert!(matches!(args.strategy, Some(Strategy::Skip)));
    }

    #[test]
    fn find_requires_a_key() {
        assert!(Cli::try_parse_from(["opnsync", "reservations", "find"]).is_err());
        assert!(Cli::try_parse_from(["opnsync", "res", "find", "--mac", "aa:bb:cc:dd:ee:ff"]).is_ok());
    }
}
