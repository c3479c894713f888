// # IP Source Trait
//
// Defines the interface for looking up the caller's public IP address.
//
// ## Implementations
//
// - HTTP JSON lookup: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// let source = /* IpSource implementation */;
// let ip = source.current().await?;
// println!("Your ip is {}", ip);
// ```

use async_trait::async_trait;

/// Trait for public IP lookups
///
/// The address is returned exactly as the lookup service reported it. No
/// format validation is applied; whatever text comes back is what gets
/// written into the DNS records.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public IP
    ///
    /// Called once per synchronization pass, never cached across passes.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The address as reported by the service
    /// - `Err(Error)`: If the lookup failed or the reply had no address
    async fn current(&self) -> Result<String, crate::Error>;
}
