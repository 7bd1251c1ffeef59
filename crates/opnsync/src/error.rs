//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use opnsync_config::ConfigError;
use opnsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach router: {message}")]
    #[diagnostic(
        code(opnsync::connection_failed),
        help(
            "Check that the router is reachable and the API is enabled.\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(opnsync::timeout),
        help("Increase timeout with --timeout or check router responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(opnsync::auth_failed),
        help(
            "Verify the API key and secret (System > Access > Users on the router).\n\
             Store a new secret with: opnsync config set-secret"
        )
    )]
    AuthFailed { message: String },

    #[error("No API {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(opnsync::no_credentials),
        help(
            "Configure credentials with: opnsync config init\n\
             Or set OPNSYNC_API_KEY / OPNSYNC_API_SECRET."
        )
    )]
    NoCredentials { profile: String, what: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(opnsync::not_found),
        help("Run: opnsync {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Router API ───────────────────────────────────────────────────

    #[error("Router rejected the request: {message}")]
    #[diagnostic(code(opnsync::api_error), help("{details}"))]
    ApiError { message: String, details: String },

    #[error("Sync finished with {count} error(s)")]
    #[diagnostic(
        code(opnsync::sync_failed),
        help("Run again with -v for per-step logs, or --output json for the full result.")
    )]
    SyncFailed { count: usize },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(opnsync::validation))]
    Validation { field: String, reason: String },

    #[error("No valid IP addresses for alias '{alias}'")]
    #[diagnostic(
        code(opnsync::no_valid_ips),
        help("Every device in the input had an empty or malformed shelly_ip.")
    )]
    NoValidIps { alias: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(opnsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: opnsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No router configured")]
    #[diagnostic(
        code(opnsync::no_config),
        help(
            "Create a profile with: opnsync config init\n\
             Or pass --router/--api-key/--api-secret.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(opnsync::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(opnsync::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(opnsync::json), help("Check the file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML payload: {0}")]
    #[diagnostic(code(opnsync::yaml), help("Check the file contents and try again."))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::SyncFailed { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::NoValidIps { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation { field, message } => CliError::Validation {
                field,
                reason: message,
            },

            CoreError::NotFound { entity, identifier } => {
                let list_command = if entity.contains("alias") {
                    "aliases list"
                } else {
                    "reservations list"
                };
                CliError::NotFound {
                    resource_type: entity,
                    identifier,
                    list_command: list_command.into(),
                }
            }

            CoreError::NoValidIps { alias } => CliError::NoValidIps { alias },

            CoreError::Api {
                message,
                status,
                validations,
            } => match status {
                Some(401 | 403) => CliError::AuthFailed { message },
                None if message.contains("timed out") => CliError::Timeout,
                None if message.starts_with("Deserialization") => CliError::ApiError {
                    message,
                    details: "The router answered with an unexpected body.".into(),
                },
                None => CliError::ConnectionFailed { message },
                Some(_) => CliError::ApiError {
                    message,
                    details: if validations.is_empty() {
                        "The router returned no field details.".into()
                    } else {
                        validations
                            .iter()
                            .map(|(field, reason)| format!("{field}: {reason}"))
                            .collect::<Vec<_>>()
                            .join("\n")
                    },
                },
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::NoCredentials { profile, what } => {
                CliError::NoCredentials { profile, what }
            }
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            other => CliError::Config(other),
        }
    }
}
