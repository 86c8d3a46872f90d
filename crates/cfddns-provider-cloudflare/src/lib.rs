// # Cloudflare DNS Record Store
//
// This crate provides the Cloudflare implementation of `RecordStore`.
//
// - ✅ One HTTP request per call (GET to read, PUT to write)
// - ✅ HTTP timeout configured (10 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ API envelope `success: false` surfaced as an error
// - ❌ NO retry logic (owned by the reconciler's cycle cadence)
// - ❌ NO change detection (owned by the reconciler)
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - Store creation fails fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - DNS Record Details: GET `/zones/:zone_id/dns_records/:record_id`
// - Overwrite DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfddns_core::config::RecordTarget;
use cfddns_core::traits::RecordStore;
use cfddns_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (10 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefix of the comment attached to every write
const COMMENT_PREFIX: &str = "Automatically edited by cfddns worker.";

/// Cloudflare API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

/// The subset of a DNS record the store reads back
#[derive(Debug, Deserialize)]
struct DnsRecord {
    content: String,
}

/// Body of an overwrite request
#[derive(Debug, Serialize, PartialEq)]
struct UpdateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
    proxied: bool,
    comment: String,
}

/// Cloudflare DNS record store
///
/// Stateless apart from the HTTP client. Each call targets exactly one
/// `(zone_id, record_id)` pair.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct CloudflareRecordStore {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL (overridable for tests)
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareRecordStore")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CloudflareRecordStore {
    /// Create a new Cloudflare record store
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the token is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_token, DEFAULT_HTTP_TIMEOUT)
    }

    /// Create with a custom per-request timeout
    pub fn with_timeout(api_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
        })
    }

    /// Point the store at a different API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn record_url(&self, target: &RecordTarget) -> String {
        format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, target.zone_id, target.record_id
        )
    }

    /// Turn a transport result into a checked, decoded API envelope
    async fn decode<T>(
        target: &RecordTarget,
        action: &str,
        sent: std::result::Result<reqwest::Response, reqwest::Error>,
    ) -> Result<ApiResponse<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = sent.map_err(|e| {
            Error::provider(&target.name, format!("HTTP request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(target, action, status.as_u16(), &error_text));
        }

        let envelope: ApiResponse<T> = response.json().await.map_err(|e| {
            Error::provider(&target.name, format!("Failed to parse response: {}", e))
        })?;

        if !envelope.success {
            let messages = envelope
                .errors
                .iter()
                .map(|e| format!("{} ({})", e.message, e.code))
                .collect::<Vec<_>>()
                .join("; ");
            return Err(Error::provider(
                &target.name,
                format!("{} rejected by Cloudflare: {}", action, messages),
            ));
        }

        Ok(envelope)
    }
}

/// Map a non-success HTTP status to a provider error
fn status_error(target: &RecordTarget, action: &str, status: u16, error_text: &str) -> Error {
    let message = match status {
        401 | 403 => {
            "Authentication failed: Invalid API token or insufficient permissions".to_string()
        }
        404 => format!(
            "DNS record not found: zone {} record {}",
            target.zone_id, target.record_id
        ),
        409 => "Conflict: Record is being updated by another process".to_string(),
        429 => "Rate limit exceeded. Please retry later".to_string(),
        500..=599 => format!("Cloudflare server error (transient): {}", error_text),
        _ => format!("{} failed: {}", action, error_text),
    };
    Error::provider_status(&target.name, status, message)
}

/// Comment attached to a write, stamped with local wall-clock time
fn update_comment(now: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{} Update: {}",
        COMMENT_PREFIX,
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

fn update_request<'a>(
    target: &'a RecordTarget,
    ip: &'a str,
    ttl: u32,
    comment: String,
) -> UpdateRecordRequest<'a> {
    UpdateRecordRequest {
        record_type: "A",
        name: &target.name,
        content: ip,
        ttl,
        proxied: true,
        comment,
    }
}

#[async_trait]
impl RecordStore for CloudflareRecordStore {
    /// Read the record's current content
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records/:record_id
    /// Authorization: Bearer <token>
    /// ```
    async fn read_record(&self, target: &RecordTarget) -> Result<String> {
        tracing::debug!("Reading Cloudflare DNS record {}", target.name);

        let sent = self
            .client
            .get(self.record_url(target))
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .send()
            .await;

        let envelope: ApiResponse<DnsRecord> = Self::decode(target, "Record lookup", sent).await?;

        envelope
            .result
            .map(|record| record.content)
            .ok_or_else(|| {
                Error::provider(&target.name, "Invalid response format: result is missing")
            })
    }

    /// Overwrite the record
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// {
    ///   "type": "A",
    ///   "name": "home.example.com",
    ///   "content": "1.2.3.4",
    ///   "ttl": 120,
    ///   "proxied": true,
    ///   "comment": "Automatically edited by cfddns worker. Update: 2024-01-01 12:00:00"
    /// }
    /// ```
    async fn write_record(&self, target: &RecordTarget, ip: &str, ttl: u32) -> Result<()> {
        let payload = update_request(target, ip, ttl, update_comment(chrono::Local::now()));

        let sent = self
            .client
            .put(self.record_url(target))
            .bearer_auth(&self.api_token)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await;

        let _: ApiResponse<serde_json::Value> = Self::decode(target, "Record update", sent).await?;

        tracing::debug!("DNS record updated successfully: {} -> {}", target.name, ip);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}
