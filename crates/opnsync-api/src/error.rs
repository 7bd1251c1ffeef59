use std::collections::BTreeMap;

use thiserror::Error;

/// Top-level error type for the `opnsync-api` crate.
///
/// Covers every failure mode of the router API surface: authentication,
/// transport, router-reported failures and response decoding.
/// `opnsync-core` maps these into its own error kinds.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The router rejected the API key/secret pair (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Router API ──────────────────────────────────────────────────
    /// Non-2xx response, or a body whose `status` is not `"ok"`.
    ///
    /// `validations` maps field paths (e.g. `reservation.ipaddr`) to the
    /// router's reason, when the router supplied any.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        validations: BTreeMap<String, String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    ///
    /// Nothing in this workspace retries; the flag is exposed for callers
    /// that schedule syncs.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Field-level validation failures reported by the router.
    pub fn validations(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Api { validations, .. } if !validations.is_empty() => Some(validations),
            _ => None,
        }
    }
}
