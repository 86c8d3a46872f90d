//! Error types for the cfddns system
//!
//! Configuration errors are fatal and only occur at startup. Network and
//! provider errors are per-call and are always recovered by the reconciler.

use thiserror::Error;

/// Result type alias for cfddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the cfddns system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Public IP resolution errors
    #[error("Network error: {0}")]
    Network(String),

    /// DNS provider errors for a specific record
    #[error("{}", provider_message(.record, .status, .message))]
    Provider {
        /// Record name the call was made for
        record: String,
        /// HTTP status returned by the provider, if a response was received
        status: Option<u16>,
        /// Error message
        message: String,
    },
}

fn provider_message(record: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("Provider error ({record}, HTTP {status}): {message}"),
        None => format!("Provider error ({record}): {message}"),
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a provider error that carried no HTTP status
    pub fn provider(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            record: record.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Create a provider error from a non-success HTTP response
    pub fn provider_status(
        record: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            record: record.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    /// Whether this error must stop the process
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_includes_record_and_status() {
        let err = Error::provider_status("home.example.com", 429, "Rate limit exceeded");
        assert_eq!(
            err.to_string(),
            "Provider error (home.example.com, HTTP 429): Rate limit exceeded"
        );

        let err = Error::provider("home.example.com", "request timed out");
        assert_eq!(
            err.to_string(),
            "Provider error (home.example.com): request timed out"
        );
    }

    #[test]
    fn test_only_config_errors_are_fatal() {
        assert!(Error::config("missing token").is_fatal());
        assert!(!Error::network("timeout").is_fatal());
        assert!(!Error::provider("a.example.com", "boom").is_fatal());
    }
}
