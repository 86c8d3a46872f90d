// # HTTP IP Resolver
//
// This crate provides the public IP resolver for cfddns.
//
// ## Architecture
//
// Fetches the current address from a plain-text echo service (e.g.
// api.ipify.org, ifconfig.me/ip, icanhazip.com). The whole response body is
// the address. One request per call; retries are the reconciler's cadence.

use cfddns_core::traits::IpResolver;
use cfddns_core::{Error, Result};

use std::net::Ipv4Addr;
use std::time::Duration;

/// Per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-based public IPv4 resolver
#[derive(Debug, Clone)]
pub struct HttpIpResolver {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpResolver {
    /// Create a new resolver for the given echo endpoint
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create with a custom request timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Endpoint this resolver queries
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpResolver for HttpIpResolver {
    async fn resolve(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "{} returned HTTP {}",
                self.url,
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        let ip_text = body.trim();
        let ip: Ipv4Addr = ip_text
            .parse()
            .map_err(|_| Error::network(format!("Invalid IPv4 address: {:?}", ip_text)))?;

        tracing::debug!("Resolved public IP {} from {}", ip, self.url);
        Ok(ip)
    }

    fn resolver_name(&self) -> &str {
        &self.url
    }
}
