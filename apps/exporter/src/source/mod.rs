//! Resume data source: the only place that talks to the upstream portfolio service.
//!
//! The service answers `GET {base}/portfolio/{id}` with `{"data": {...resume...}}`.
//! Callers treat every failure as "no data" and render an empty record; nothing here
//! retries.
//!
//! Asset URIs come from upstream data, not from us, so `fetch_asset` only follows
//! them under an `AssetPolicy`: public http(s) hosts, a byte cap, and inline
//! `data:image/*;base64,` URIs decoded locally.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use bytes::Bytes;
use reqwest::{redirect, Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

const MAX_REDIRECTS: usize = 5;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("resume {0} not found")]
    NotFound(String),

    #[error("asset URI not allowed: {0}")]
    Disallowed(String),

    #[error("asset exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),
}

/// Read access to resume payloads and the assets they reference.
///
/// Carried in `AppState` as `Arc<dyn ResumeSource>`.
#[async_trait]
pub trait ResumeSource: Send + Sync {
    /// Returns the raw resume object for `id` (the envelope's `data` member).
    async fn fetch(&self, id: &str) -> Result<Value, SourceError>;

    /// Loads the bytes behind an asset URI such as a profile image.
    async fn fetch_asset(&self, uri: &str) -> Result<Bytes, SourceError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Asset policy
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AssetPolicy {
    /// Hosts (and their subdomains) assets may be loaded from. Empty allows any
    /// public host.
    pub allowed_hosts: Vec<String>,
    pub max_bytes: usize,
}

impl AssetPolicy {
    fn check(&self, url: &Url) -> Result<(), SourceError> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SourceError::Disallowed(format!("scheme '{}'", url.scheme())));
        }
        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase())
            .ok_or_else(|| SourceError::Disallowed("missing host".to_string()))?;

        if host == "localhost" || host.ends_with(".localhost") {
            return Err(SourceError::Disallowed(format!("host '{host}'")));
        }
        if let Ok(ip) = host.parse::<IpAddr>() {
            if !is_public(ip) {
                return Err(SourceError::Disallowed(format!("address {ip}")));
            }
        }
        if !self.allowed_hosts.is_empty()
            && !self
                .allowed_hosts
                .iter()
                .any(|allowed| host == *allowed || host.ends_with(&format!(".{allowed}")))
        {
            return Err(SourceError::Disallowed(format!("host '{host}' is not allow-listed")));
        }
        Ok(())
    }

    fn decode_data_uri(&self, uri: &str) -> Result<Bytes, SourceError> {
        let (meta, payload) = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(','))
            .ok_or_else(|| SourceError::InvalidDataUri("missing ',' separator".to_string()))?;
        let media_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| SourceError::InvalidDataUri("only base64 payloads are supported".to_string()))?;
        if !media_type.starts_with("image/") {
            return Err(SourceError::InvalidDataUri(format!("media type '{media_type}'")));
        }
        if payload.len() / 4 * 3 > self.max_bytes {
            return Err(SourceError::TooLarge { limit: self.max_bytes });
        }
        STANDARD
            .decode(payload.trim())
            .map(Bytes::from)
            .map_err(|e| SourceError::InvalidDataUri(e.to_string()))
    }
}

fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => is_public_v6(v6),
        },
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, ..] = ip.octets();
    !(ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        // 100.64.0.0/10 carrier-grade NAT
        || (a == 100 && (64..128).contains(&b))
        || a == 0)
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    let first = ip.segments()[0];
    !(ip.is_loopback()
        || ip.is_unspecified()
        // fc00::/7 unique local, fe80::/10 link local
        || (first & 0xfe00) == 0xfc00
        || (first & 0xffc0) == 0xfe80)
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP source
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpResumeSource {
    client: Client,
    /// Separate client so every redirect hop of an asset fetch is re-checked.
    asset_client: Client,
    base_url: String,
    assets: AssetPolicy,
}

impl HttpResumeSource {
    pub fn new(base_url: &str, timeout: Duration, assets: AssetPolicy) -> Result<Self, SourceError> {
        let redirect_policy = assets.clone();
        let asset_client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::custom(move |attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    attempt.stop()
                } else if redirect_policy.check(attempt.url()).is_err() {
                    attempt.stop()
                } else {
                    attempt.follow()
                }
            }))
            .build()?;

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            asset_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            assets,
        })
    }

    fn resume_url(&self, id: &str) -> String {
        format!("{}/portfolio/{}", self.base_url, id)
    }
}

async fn get(client: &Client, url: &str) -> Result<reqwest::Response, SourceError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if status.as_u16() == 404 {
        return Err(SourceError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        return Err(SourceError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(response)
}

#[async_trait]
impl ResumeSource for HttpResumeSource {
    async fn fetch(&self, id: &str) -> Result<Value, SourceError> {
        let url = self.resume_url(id);
        let envelope: Value = get(&self.client, &url).await?.json().await?;
        debug!(url = %url, "Fetched resume payload");
        extract_data(envelope)
    }

    async fn fetch_asset(&self, uri: &str) -> Result<Bytes, SourceError> {
        if uri.starts_with("data:") {
            return self.assets.decode_data_uri(uri);
        }

        let url = Url::parse(uri).map_err(|e| SourceError::Disallowed(e.to_string()))?;
        self.assets.check(&url)?;

        let limit = self.assets.max_bytes;
        let mut response = get(&self.asset_client, url.as_str()).await?;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(SourceError::TooLarge { limit });
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(SourceError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        debug!(url = %url, bytes = body.len(), "Fetched asset");
        Ok(Bytes::from(body))
    }
}

/// Pulls the resume object out of the upstream envelope.
fn extract_data(mut envelope: Value) -> Result<Value, SourceError> {
    match envelope.get_mut("data").map(Value::take) {
        Some(data @ Value::Object(_)) => Ok(data),
        Some(other) => Err(SourceError::Malformed(format!(
            "expected an object under 'data', found {}",
            json_kind(&other)
        ))),
        None => Err(SourceError::Malformed("missing 'data' member".to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
