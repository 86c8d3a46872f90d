// # IP Resolver Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP echo service: `cfddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use cfddns_core::IpResolver;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let resolver = /* IpResolver implementation */;
//     let ip = resolver.resolve().await?;
//     println!("public address: {ip}");
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for public IP resolver implementations
///
/// A resolver makes one attempt per call. It never retries and never sleeps;
/// the reconciler's cycle cadence is the retry policy.
///
/// Any transport failure, non-success status, timeout or unparsable body is
/// reported as [`crate::Error::Network`].
#[async_trait]
pub trait IpResolver: Send + Sync {
    /// Resolve the current public IPv4 address
    async fn resolve(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Short name for logging (e.g. the endpoint host)
    fn resolver_name(&self) -> &str;
}
