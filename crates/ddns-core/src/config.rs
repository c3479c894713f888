//! Configuration types for the DDNS system
//!
//! The configuration is a single JSON document read once at startup. Key
//! names from older deployments (`second_domain`, `update_interval`) are
//! accepted as aliases.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default CNS v2 API endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://cns.api.qcloud.com/v2/index.php";

/// Default public IP lookup endpoint
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://jsonip.com";

/// Main DDNS configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// API secret identifier
    pub secret_id: String,

    /// API secret key (never logged)
    pub secret_key: String,

    /// Root domain whose records are managed (e.g. "example.com")
    pub domain: String,

    /// Subdomain names to keep pointed at the public IP (e.g. "www", "@")
    #[serde(alias = "second_domain")]
    pub subdomains: BTreeSet<String>,

    /// Seconds to wait between synchronization passes
    #[serde(alias = "update_interval")]
    pub update_interval_secs: u64,

    /// Provider API endpoint (scheme, host and path)
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Public IP lookup endpoint, must answer JSON with an `ip` field
    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,

    /// Per-request HTTP timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// List records but only log the modifications that would be sent
    #[serde(default)]
    pub dry_run: bool,
}

// Custom Debug implementation that hides the secret key
impl std::fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("subdomains", &self.subdomains)
            .field("update_interval_secs", &self.update_interval_secs)
            .field("api_endpoint", &self.api_endpoint)
            .field("ip_lookup_url", &self.ip_lookup_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DdnsConfig {
    /// Create a configuration with the required fields and defaults for the rest
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
            domain: domain.into(),
            subdomains: BTreeSet::new(),
            update_interval_secs: default_update_interval_secs(),
            api_endpoint: default_api_endpoint(),
            ip_lookup_url: default_ip_lookup_url(),
            request_timeout_secs: default_request_timeout_secs(),
            log_level: default_log_level(),
            dry_run: false,
        }
    }

    /// Add a managed subdomain
    pub fn with_subdomain(mut self, name: impl Into<String>) -> Self {
        self.subdomains.insert(name.into());
        self
    }

    /// Set the interval between passes
    pub fn with_update_interval_secs(mut self, secs: u64) -> Self {
        self.update_interval_secs = secs;
        self
    }

    /// Parse and validate a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the configuration file at `path`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.secret_id.is_empty() {
            return Err(Error::config("secret_id cannot be empty"));
        }
        if self.secret_key.is_empty() {
            return Err(Error::config("secret_key cannot be empty"));
        }
        if self.domain.is_empty() {
            return Err(Error::config("domain cannot be empty"));
        }
        if self.subdomains.is_empty() {
            return Err(Error::config("No subdomains configured"));
        }
        if self.update_interval_secs == 0 {
            return Err(Error::config("update_interval_secs must be > 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::config("request_timeout_secs must be > 0"));
        }

        let endpoint = url::Url::parse(&self.api_endpoint)
            .map_err(|e| Error::config(format!("invalid api_endpoint: {}", e)))?;
        if endpoint.host_str().is_none() {
            return Err(Error::config("api_endpoint has no host"));
        }

        url::Url::parse(&self.ip_lookup_url)
            .map_err(|e| Error::config(format!("invalid ip_lookup_url: {}", e)))?;

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(Error::config(format!(
                    "log_level '{}' is not valid. Valid levels: trace, debug, info, warn, error",
                    self.log_level
                )));
            }
        }

        Ok(())
    }

    /// Interval between synchronization passes
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    /// Per-request HTTP timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Whether `name` is one of the managed subdomains
    pub fn manages(&self, name: &str) -> bool {
        self.subdomains.contains(name)
    }
}

fn default_update_interval_secs() -> u64 {
    300
}

fn default_api_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_ip_lookup_url() -> String {
    DEFAULT_IP_LOOKUP_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}
