// # DNS Provider Trait
//
// Defines the interface for reading and updating DNS records via a
// provider's HTTP API.
//
// ## Implementations
//
// - Tencent Cloud CNS: `ddns-provider-qcloud` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// let provider = /* DnsProvider implementation */;
// for record in provider.list_records("example.com").await? {
//     if record.is_a() {
//         provider.modify_record("example.com", &record, "203.0.113.7").await?;
//     }
// }
// ```

use async_trait::async_trait;

/// Record type managed by the engine
pub const RECORD_TYPE_A: &str = "A";

/// A DNS record as listed by the provider
///
/// Records are fetched fresh on every pass and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Provider-assigned record id
    pub id: String,
    /// Record type ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// Subdomain name ("www", "@", ...)
    pub name: String,
    /// Current record value
    pub value: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Provider routing line
    pub line: String,
}

impl DnsRecord {
    /// Whether this is an IPv4 address record
    pub fn is_a(&self) -> bool {
        self.record_type == RECORD_TYPE_A
    }
}

/// What a successful [`DnsProvider::modify_record`] call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOutcome {
    /// The provider accepted the new value
    Applied,
    /// Nothing was sent (dry-run)
    DryRun,
}

/// Trait for DNS provider implementations
///
/// Implementations make exactly one HTTP call per method invocation, do not
/// retry, and report a non-zero provider status as [`crate::Error::Api`] so
/// the engine can tell a rejected request from a failed transport.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record of `domain`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: All records, in provider order
    /// - `Err(Error::Api)`: The provider rejected the request
    /// - `Err(Error)`: The request did not complete
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Point `record` at `ip`
    ///
    /// # Parameters
    ///
    /// - `domain`: The root domain
    /// - `record`: A record previously returned by [`DnsProvider::list_records`]
    /// - `ip`: The new value, as returned by the IP source
    async fn modify_record(
        &self,
        domain: &str,
        record: &DnsRecord,
        ip: &str,
    ) -> Result<ModifyOutcome, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
