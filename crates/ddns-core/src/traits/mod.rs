//! Core traits for the DDNS system
//!
//! This module defines the seams between the engine and its two external
//! collaborators.
//!
//! - [`DnsProvider`]: List and modify records via the provider API
//! - [`IpSource`]: Look up the current public IP

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord, ModifyOutcome};
