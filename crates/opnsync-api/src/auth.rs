use secrecy::{ExposeSecret, SecretString};

/// API credentials for an OPNsense router.
///
/// OPNsense issues a key/secret pair per user (System > Access > Users >
/// API keys). Every request authenticates with HTTP basic auth, key as the
/// username and secret as the password.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub key: String,
    pub secret: SecretString,
}

impl Credentials {
    pub fn new(key: impl Into<String>, secret: SecretString) -> Self {
        Self {
            key: key.into(),
            secret,
        }
    }

    /// Attach basic-auth headers to a request builder.
    pub(crate) fn apply(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.basic_auth(&self.key, Some(self.secret.expose_secret()))
    }
}
