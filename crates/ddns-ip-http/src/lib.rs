// # HTTP IP Source
//
// This crate provides an HTTP-based public IP lookup for the DDNS system.
//
// ## Architecture
//
// One GET per synchronization pass against a JSON lookup service
// (`http://jsonip.com` by default) that answers `{"ip": "<address>"}`. The
// address is returned as text, unvalidated. Nothing is cached between calls.

use ddns_core::config::DdnsConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use serde::Deserialize;
use std::time::Duration;

/// Lookup service reply
#[derive(Debug, Deserialize)]
struct LookupReply {
    ip: Option<String>,
}

/// HTTP-based public IP lookup
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch the address from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: Lookup endpoint (e.g., "http://jsonip.com")
    /// - `timeout`: Per-request HTTP timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create a source from the daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        Self::new(config.ip_lookup_url.clone(), config.request_timeout())
    }

    /// The lookup endpoint
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::http(format!("IP lookup request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::ip_source(format!(
                "IP lookup returned HTTP {}",
                response.status()
            )));
        }

        let reply: LookupReply = response
            .json()
            .await
            .map_err(|e| Error::ip_source(format!("IP lookup reply is not JSON: {}", e)))?;

        let ip = reply
            .ip
            .ok_or_else(|| Error::ip_source("IP lookup reply has no `ip` field"))?;

        tracing::debug!("IP lookup via {} returned {}", self.url, ip);
        Ok(ip)
    }
}
