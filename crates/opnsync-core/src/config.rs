// ── Runtime connection configuration ──
//
// Describes *how* to reach one OPNsense router. Carries credentials and
// connection tuning but never touches disk: the CLI builds a `RouterConfig`
// from a profile and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use opnsync_api::{Credentials, OpnSenseClient, TlsMode, TransportConfig};
use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed router certificates).
    DangerAcceptInvalid,
}

/// Connection settings for a single router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Router URL (e.g. `https://192.168.1.1`). `/api/` is appended.
    pub url: Url,
    pub api_key: String,
    pub api_secret: SecretString,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl RouterConfig {
    pub fn new(url: Url, api_key: impl Into<String>, api_secret: SecretString) -> Self {
        Self {
            url,
            api_key: api_key.into(),
            api_secret,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    /// Build the reqwest-backed router client.
    pub fn client(&self) -> Result<OpnSenseClient, CoreError> {
        let credentials = Credentials::new(self.api_key.clone(), self.api_secret.clone());
        Ok(OpnSenseClient::new(
            self.url.as_str(),
            credentials,
            &self.transport(),
        )?)
    }
}
