//! Core traits for the cfddns system
//!
//! This module defines the two seams the reconciler talks through.
//!
//! - [`IpResolver`]: Discover the current public IPv4 address
//! - [`RecordStore`]: Read and write a single DNS record's content

pub mod ip_resolver;
pub mod record_store;

pub use ip_resolver::IpResolver;
pub use record_store::{RecordStore, DEFAULT_TTL};
