// # Record Store Trait
//
// Defines the interface for reading and writing one DNS record's content.
//
// ## Implementations
//
// - Cloudflare API v4: `cfddns-provider-cloudflare` crate

use crate::config::RecordTarget;
use async_trait::async_trait;

/// TTL, in seconds, written with every record update
pub const DEFAULT_TTL: u32 = 120;

/// Trait for DNS record store implementations
///
/// Both operations are scoped to one `(zone_id, record_id)` pair and make a
/// single API call. Whether a write is needed is decided by the reconciler,
/// never by the store.
///
/// Every failure is reported as [`crate::Error::Provider`] carrying the
/// record name and, when a response was received, its HTTP status.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the content currently stored for the record
    ///
    /// The returned string is the comparison baseline for change detection.
    async fn read_record(&self, target: &RecordTarget) -> Result<String, crate::Error>;

    /// Overwrite the record so that it points at `ip`
    ///
    /// Implementations write an `A` record with the given TTL, proxied where
    /// the provider supports it, and an informational comment. Writing the
    /// same address twice leaves the record pointing at the same address.
    async fn write_record(
        &self,
        target: &RecordTarget,
        ip: &str,
        ttl: u32,
    ) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
