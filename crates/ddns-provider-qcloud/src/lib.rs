// # Tencent Cloud CNS Provider
//
// This crate provides the qcloud CNS (v2 API) DNS provider for the DDNS system.
//
// ## API
//
// Every call is a signed GET to `https://cns.api.qcloud.com/v2/index.php`
// with the action and its arguments in the query string:
//
// - `RecordList`: list all records of a domain
// - `RecordModify`: point one record at a new value
//
// Each request carries `SecretId`, `Timestamp` (taken when the request is
// built), `Nonce` (`Timestamp + 1`), `SignatureMethod=HmacSHA256` and the
// `Signature` computed over all of the above (see [`sign`]).
//
// The response body is JSON with a `code` field; anything but `0` is a
// rejection and is reported as `Error::Api` with the provider's message.
//
// ## Behavior
//
// - One HTTP request per trait call, no retries
// - HTTP timeout taken from the configuration
// - Dry-run mode lists records but only logs the modify calls

pub mod sign;

use async_trait::async_trait;
use ddns_core::config::DdnsConfig;
use ddns_core::traits::dns_provider::RECORD_TYPE_A;
use ddns_core::traits::{DnsProvider, DnsRecord, ModifyOutcome};
use ddns_core::{Error, Result};
use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;
use std::time::Duration;
use url::Url;

pub use sign::{Params, Signer, canonical_query};

/// Record line selector sent with every modification
pub const RECORD_LINE: &str = "默认";

/// TTL (seconds) sent with every modification
pub const RECORD_TTL: u32 = 3600;

/// Response envelope shared by all actions
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct RecordListData {
    #[serde(default)]
    records: Vec<ApiRecord>,
}

/// A listed record. Only `id`, `type` and `name` drive the pass; the other
/// fields are informational and decoded leniently.
#[derive(Debug, Deserialize)]
struct ApiRecord {
    /// Numeric in practice; strings are accepted as well
    id: Value,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    ttl: Value,
    #[serde(default)]
    line: Value,
}

/// Scalar JSON value as text; `null` becomes empty
fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// TTL given as a number or numeric string; anything else becomes 0
fn ttl_secs(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
    .unwrap_or(0)
}

impl From<ApiRecord> for DnsRecord {
    fn from(record: ApiRecord) -> Self {
        Self {
            id: value_text(record.id),
            record_type: record.record_type,
            name: record.name,
            ttl: ttl_secs(&record.ttl),
            value: value_text(record.value),
            line: value_text(record.line),
        }
    }
}

/// qcloud CNS DNS provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the secret key.
pub struct QcloudProvider {
    /// API secret identifier
    secret_id: String,

    /// API secret key
    /// ⚠️ NEVER log this value
    secret_key: String,

    /// Full API endpoint
    endpoint: Url,

    /// Signer for the endpoint's host and path
    signer: Signer,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, list records but skip modifications
    dry_run: bool,
}

// Custom Debug implementation that hides the secret key
impl std::fmt::Debug for QcloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QcloudProvider")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"<REDACTED>")
            .field("endpoint", &self.endpoint.as_str())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl QcloudProvider {
    /// Create a new qcloud provider
    ///
    /// # Parameters
    ///
    /// - `secret_id`: API secret identifier
    /// - `secret_key`: API secret key
    /// - `endpoint`: API endpoint URL (scheme, host and path)
    /// - `timeout`: Per-request HTTP timeout
    /// - `dry_run`: If true, list records but skip modifications
    pub fn new(
        secret_id: impl Into<String>,
        secret_key: impl Into<String>,
        endpoint: &str,
        timeout: Duration,
        dry_run: bool,
    ) -> Result<Self> {
        let secret_id = secret_id.into();
        let secret_key = secret_key.into();
        if secret_id.is_empty() || secret_key.is_empty() {
            return Err(Error::config("qcloud secret_id and secret_key are required"));
        }

        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("invalid api_endpoint: {}", e)))?;
        let signer = Signer::from_endpoint(&endpoint)?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            secret_id,
            secret_key,
            endpoint,
            signer,
            client,
            dry_run,
        })
    }

    /// Create a provider from the daemon configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        if config.dry_run {
            tracing::warn!("qcloud provider running in DRY-RUN mode - no records will be modified");
        }

        Self::new(
            config.secret_id.clone(),
            config.secret_key.clone(),
            &config.api_endpoint,
            config.request_timeout(),
            config.dry_run,
        )
    }

    /// Parameters every request carries, for a request built at `timestamp`
    pub fn common_params(&self, timestamp: i64) -> Params {
        let mut params = Params::new();
        params.insert("SecretId".to_string(), self.secret_id.clone());
        params.insert("Timestamp".to_string(), timestamp.to_string());
        params.insert("Nonce".to_string(), (timestamp + 1).to_string());
        params.insert(
            "SignatureMethod".to_string(),
            sign::SIGNATURE_METHOD.to_string(),
        );
        params
    }

    /// Merge `action_params` into fresh common parameters and sign the result
    fn signed_params(&self, action_params: Params) -> Params {
        let mut params = self.common_params(chrono::Utc::now().timestamp());
        params.extend(action_params);

        let signature = self.signer.sign(&params, &self.secret_key);
        params.insert("Signature".to_string(), signature);
        params
    }

    /// Issue one signed call and unwrap the response envelope
    async fn call<T: DeserializeOwned>(&self, action_params: Params) -> Result<Option<T>> {
        let action = action_params.get("Action").cloned().unwrap_or_default();
        let params = self.signed_params(action_params);

        tracing::debug!("Calling qcloud {}", action);

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&params)
            .send()
            .await
            .map_err(|e| Error::http(format!("{} request failed: {}", action, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("{} response unreadable: {}", action, e)))?;

        let envelope: ApiResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::provider(
                "qcloud",
                format!("{} returned an unexpected body (HTTP {}): {}", action, status, e),
            )
        })?;

        if envelope.code != 0 {
            return Err(Error::api(envelope.code, envelope.message.unwrap_or_default()));
        }

        Ok(envelope.data)
    }
}

fn record_list_params(domain: &str) -> Params {
    let mut params = Params::new();
    params.insert("Action".to_string(), "RecordList".to_string());
    params.insert("domain".to_string(), domain.to_string());
    params
}

fn record_modify_params(domain: &str, record: &DnsRecord, ip: &str) -> Params {
    let mut params = Params::new();
    params.insert("Action".to_string(), "RecordModify".to_string());
    params.insert("domain".to_string(), domain.to_string());
    params.insert("recordId".to_string(), record.id.clone());
    params.insert("subDomain".to_string(), record.name.clone());
    params.insert("recordType".to_string(), RECORD_TYPE_A.to_string());
    params.insert("recordLine".to_string(), RECORD_LINE.to_string());
    params.insert("value".to_string(), ip.to_string());
    params.insert("ttl".to_string(), RECORD_TTL.to_string());
    params
}

#[async_trait]
impl DnsProvider for QcloudProvider {
    async fn list_records(&self, domain: &str) -> Result<Vec<DnsRecord>> {
        let data: Option<RecordListData> = self.call(record_list_params(domain)).await?;
        let data = data.ok_or_else(|| {
            Error::provider("qcloud", "RecordList response has no data.records")
        })?;

        Ok(data.records.into_iter().map(DnsRecord::from).collect())
    }

    async fn modify_record(
        &self,
        domain: &str,
        record: &DnsRecord,
        ip: &str,
    ) -> Result<ModifyOutcome> {
        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would modify {}.{} (id {}) -> {} (was: {})",
                record.name,
                domain,
                record.id,
                ip,
                record.value
            );
            return Ok(ModifyOutcome::DryRun);
        }

        let _: Option<IgnoredAny> = self.call(record_modify_params(domain, record, ip)).await?;
        Ok(ModifyOutcome::Applied)
    }

    fn provider_name(&self) -> &'static str {
        "qcloud"
    }
}
