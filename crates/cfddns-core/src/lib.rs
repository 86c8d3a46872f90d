// # cfddns-core
//
// Core library for the cfddns reconciliation loop.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping Cloudflare `A`
// records pointed at the host's public address:
// - **IpResolver**: Trait for discovering the current public IPv4 address
// - **RecordStore**: Trait for reading and writing a single DNS record
// - **Reconciler**: Control loop that compares and conditionally rewrites records
// - **DdnsConfig**: Immutable configuration parsed once at startup
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The loop is separate from the HTTP clients
// 2. **Fault Isolation**: One record's failure never blocks the others
// 3. **Fail Fast per Cycle**: No record work happens without a resolved IP
// 4. **Library-First**: All loop logic can be driven from tests or other binaries

pub mod config;
pub mod error;
pub mod reconciler;
pub mod traits;

// Re-export core types for convenience
pub use config::{DdnsConfig, RecordTarget};
pub use error::{Error, Result};
pub use reconciler::{CycleReport, RecordOutcome, RecordReport, Reconciler};
pub use traits::{IpResolver, RecordStore};
