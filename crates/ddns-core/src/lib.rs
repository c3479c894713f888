// # ddns-core
//
// Core library for the qcloud DDNS synchronizer.
//
// ## Architecture Overview
//
// This library provides the provider-independent part of the updater:
// - **DnsProvider**: Trait for listing and modifying records via a provider API
// - **IpSource**: Trait for looking up the current public IP
// - **DdnsEngine**: Runs a synchronization pass and repeats it on a timer
// - **DdnsConfig**: Immutable configuration loaded once at startup
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Engine logic is separate from the HTTP integrations
// 2. **Library-First**: A single pass can be run directly, without the timer
// 3. **Fresh State**: Records and the public IP are fetched anew on every pass

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecord, ModifyOutcome};
pub use engine::{DdnsEngine, EngineEvent, PassReport};
pub use config::DdnsConfig;
pub use error::{Error, Result};
