// ── Core error types ──
//
// Errors surfaced by the stores and the orchestrator. Consumers switch on
// `CoreError::kind()` rather than matching message text. Every
// `opnsync_api::Error` (including opaque transport failures) becomes
// `CoreError::Api`; the core does not retry or distinguish them further.

use std::collections::BTreeMap;

use thiserror::Error;

/// Closed classification of [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Api,
    NoValidIps,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed MAC/IP/hostname/alias field. Never reaches the network.
    #[error("Validation failed for {field}: {message}")]
    Validation { field: String, message: String },

    /// Lookup by MAC, IP, name or UUID found nothing.
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    /// The router (or the transport reaching it) reported a failure.
    #[error("API error: {message}")]
    Api {
        message: String,
        status: Option<u16>,
        validations: BTreeMap<String, String>,
    },

    /// An alias update was given zero usable addresses.
    #[error("No valid IP addresses for alias {alias}")]
    NoValidIps { alias: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Api { .. } => ErrorKind::Api,
            Self::NoValidIps { .. } => ErrorKind::NoValidIps,
        }
    }

    pub(crate) fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub(crate) fn not_found(entity: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            identifier: identifier.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<opnsync_api::Error> for CoreError {
    fn from(err: opnsync_api::Error) -> Self {
        let status = err.status();
        match err {
            opnsync_api::Error::Api {
                message,
                validations,
                ..
            } => CoreError::Api {
                message,
                status,
                validations,
            },
            other => CoreError::Api {
                message: other.to_string(),
                status,
                validations: BTreeMap::new(),
            },
        }
    }
}
