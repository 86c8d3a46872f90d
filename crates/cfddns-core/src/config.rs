//! Configuration types for the cfddns system
//!
//! Configuration is environment-style key/value and is loaded exactly once at
//! startup. [`DdnsConfig::from_lookup`] takes the lookup as a closure so the
//! parsing rules can be exercised without touching the process environment.

use crate::error::{Error, Result};
use std::time::Duration;

/// Environment key holding the Cloudflare API token
pub const API_TOKEN_KEY: &str = "CF_API_TOKEN";

/// Prefix of the indexed record descriptors (`DNS_RECORD_0`, `DNS_RECORD_1`, ...)
pub const RECORD_KEY_PREFIX: &str = "DNS_RECORD_";

/// Environment key overriding the cycle interval in seconds
pub const INTERVAL_KEY: &str = "INTERVAL";

/// Environment key overriding the public IP echo endpoint
pub const IP_SOURCE_URL_KEY: &str = "IP_SOURCE_URL";

/// Environment key selecting the log level
pub const LOG_LEVEL_KEY: &str = "LOG_LEVEL";

/// Environment key selecting the run mode (`dry-run` or live)
pub const MODE_KEY: &str = "CFDDNS_MODE";

/// Default interval between reconciliation cycles
pub const DEFAULT_INTERVAL_SECS: u64 = 300;

/// Default public IP echo endpoint
pub const DEFAULT_IP_SOURCE_URL: &str = "https://api.ipify.org";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// One DNS record to keep in sync
///
/// Parsed from a `zone_id:record_id:name` descriptor. All three fields are
/// non-empty. Targets are not deduplicated; a repeated `(zone_id, record_id)`
/// pair is simply reconciled twice per cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Cloudflare zone identifier
    pub zone_id: String,
    /// Cloudflare record identifier within the zone
    pub record_id: String,
    /// Record name, used in the write payload and in log lines
    pub name: String,
}

impl RecordTarget {
    /// Create a record target from its three parts
    pub fn new(
        zone_id: impl Into<String>,
        record_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            zone_id: zone_id.into(),
            record_id: record_id.into(),
            name: name.into(),
        }
    }

    /// Parse a `zone_id:record_id:name` descriptor
    ///
    /// Fails with [`Error::Config`] on a wrong segment count or any empty segment.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let parts: Vec<&str> = descriptor.split(':').collect();
        match parts.as_slice() {
            [zone_id, record_id, name]
                if !zone_id.is_empty() && !record_id.is_empty() && !name.is_empty() =>
            {
                Ok(Self::new(*zone_id, *record_id, *name))
            }
            _ => Err(Error::config(format!(
                "Invalid record descriptor '{descriptor}': expected 'zone_id:record_id:name'"
            ))),
        }
    }
}

/// Main cfddns configuration
///
/// Immutable for the process lifetime. The API token is redacted from the
/// `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct DdnsConfig {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Records to reconcile, in configured order
    pub records: Vec<RecordTarget>,

    /// Seconds between cycles (always > 0)
    pub interval_secs: u64,

    /// Plain-text public IP echo endpoint
    pub ip_source_url: String,

    /// Log level name (trace, debug, info, warn, error)
    pub log_level: String,

    /// Read records but never write them
    pub dry_run: bool,
}

impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("api_token", &"<REDACTED>")
            .field("records", &self.records)
            .field("interval_secs", &self.interval_secs)
            .field("ip_source_url", &self.ip_source_url)
            .field("log_level", &self.log_level)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but token and records
    pub fn new(api_token: impl Into<String>, records: Vec<RecordTarget>) -> Self {
        Self {
            api_token: api_token.into(),
            records,
            interval_secs: DEFAULT_INTERVAL_SECS,
            ip_source_url: DEFAULT_IP_SOURCE_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            dry_run: false,
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value lookup
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the token is missing, a record
    /// descriptor is malformed, no records are defined, or an optional
    /// setting has an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup(API_TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                Error::config(format!("Missing required environment variable: {API_TOKEN_KEY}"))
            })?;

        let records = parse_records(&lookup)?;

        let interval_secs = match lookup(INTERVAL_KEY) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::config(format!(
                    "{INTERVAL_KEY} must be a positive integer number of seconds. Got: {raw}"
                ))
            })?,
            None => DEFAULT_INTERVAL_SECS,
        };

        let config = Self {
            api_token,
            records,
            interval_secs,
            ip_source_url: lookup(IP_SOURCE_URL_KEY)
                .unwrap_or_else(|| DEFAULT_IP_SOURCE_URL.to_string()),
            log_level: lookup(LOG_LEVEL_KEY)
                .map(|level| level.to_lowercase())
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            dry_run: lookup(MODE_KEY)
                .unwrap_or_default()
                .eq_ignore_ascii_case("dry-run"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_token.is_empty() {
            return Err(Error::config(format!(
                "Missing required environment variable: {API_TOKEN_KEY}"
            )));
        }

        if self.records.is_empty() {
            return Err(Error::config(
                "No DNS records defined. Set DNS_RECORD_0=zone_id:record_id:name, DNS_RECORD_1=..., etc.",
            ));
        }

        if self.interval_secs == 0 {
            return Err(Error::config(format!("{INTERVAL_KEY} must be > 0")));
        }

        if !self.ip_source_url.starts_with("https://") && !self.ip_source_url.starts_with("http://")
        {
            return Err(Error::config(format!(
                "{IP_SOURCE_URL_KEY} must use HTTP or HTTPS scheme. Got: {}",
                self.ip_source_url
            )));
        }

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(Error::config(format!(
                "{LOG_LEVEL_KEY} '{}' is not valid. Valid levels: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }

    /// Interval between the end of one cycle and the start of the next
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Comma-separated record names, for the startup banner
    pub fn record_names(&self) -> String {
        self.records
            .iter()
            .map(|record| record.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Enumerate `DNS_RECORD_<i>` from 0 until the first missing index
fn parse_records<F>(lookup: &F) -> Result<Vec<RecordTarget>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut records = Vec::new();

    for index in 0.. {
        let key = format!("{RECORD_KEY_PREFIX}{index}");
        let Some(descriptor) = lookup(&key) else {
            break;
        };

        let record = RecordTarget::parse(&descriptor).map_err(|_| {
            Error::config(format!(
                "Invalid format for {key}: expected 'zone_id:record_id:name'"
            ))
        })?;
        records.push(record);
    }

    Ok(records)
}
