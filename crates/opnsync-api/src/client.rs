// Async HTTP client for the OPNsense REST API.
//
// Base path: /api/
// Auth: HTTP basic (API key + secret)

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::auth::Credentials;
use crate::transport::{Method, RouterTransport, TransportConfig};

// ── Error response shape from the router ─────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
    #[serde(default)]
    validations: Option<BTreeMap<String, Value>>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for an OPNsense router.
///
/// Every request goes to `{base}/api/{path}` with basic auth attached.
/// Responses are returned as parsed JSON; typed decoding happens in the
/// layer above through [`crate::models::decode`].
pub struct OpnSenseClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
}

impl OpnSenseClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from the router URL, credentials and transport config.
    pub fn new(
        base_url: &str,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        base_url: &str,
        credentials: Credentials,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// The API root, always ending in `/api/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append `/api/` unless the URL already points at it.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();

        if path.ends_with("/api") {
            url.set_path(&format!("{path}/"));
        } else {
            url.set_path(&format!("{path}/api/"));
        }

        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Self::parse_error(status, resp).await);
        }

        let body = resp.text().await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: "router rejected the API key/secret".into(),
            };
        }

        let raw = resp.text().await.unwrap_or_default();

        if let Ok(err) = serde_json::from_str::<ErrorResponse>(&raw) {
            let validations = err
                .validations
                .unwrap_or_default()
                .into_iter()
                .map(|(field, reason)| {
                    let reason = reason
                        .as_str()
                        .map_or_else(|| reason.to_string(), str::to_owned);
                    (field, reason)
                })
                .collect();
            Error::Api {
                status: status.as_u16(),
                message: err
                    .message
                    .or(err.error_message)
                    .unwrap_or_else(|| status.to_string()),
                validations,
            }
        } else {
            Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw.chars().take(200).collect()
                },
                validations: BTreeMap::new(),
            }
        }
    }
}

impl RouterTransport for OpnSenseClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, Error> {
        let url = self.url(path)?;
        debug!("{method} {url}");

        // OPNsense rejects POSTs without a JSON body on some endpoints.
        let empty = Value::Object(serde_json::Map::new());
        let builder = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url).json(body.unwrap_or(&empty)),
        };

        let resp = self.credentials.apply(builder).send().await?;
        self.handle_response(resp).await
    }
}
