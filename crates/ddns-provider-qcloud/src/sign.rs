//! Request signing for the CNS v2 API
//!
//! The signature is HMAC-SHA256 over
//! `GET` + host + path + `?` + canonical query, base64 encoded. The
//! canonical query is every parameter sorted by key (byte order) and joined
//! as `key=value` with `&`. Values are used exactly as given; they are not
//! URL-encoded before signing.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use ddns_core::{Error, Result};
use ring::hmac;
use std::collections::BTreeMap;
use url::Url;

/// Request parameters, ordered by key
pub type Params = BTreeMap<String, String>;

/// Value of the `SignatureMethod` parameter
pub const SIGNATURE_METHOD: &str = "HmacSHA256";

/// All API calls are GET requests
const HTTP_METHOD: &str = "GET";

/// Join parameters into the canonical query string
pub fn canonical_query(params: &Params) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs requests for one API host and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signer {
    host: String,
    path: String,
}

impl Signer {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    /// Build a signer for the host and path of `endpoint`
    ///
    /// The host carries `:port` only when the URL names a non-default port.
    pub fn from_endpoint(endpoint: &Url) -> Result<Self> {
        let host = endpoint
            .host_str()
            .ok_or_else(|| Error::config(format!("endpoint has no host: {}", endpoint)))?;
        let host = match endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        Ok(Self::new(host, endpoint.path()))
    }

    /// The string that gets signed
    pub fn signing_base(&self, params: &Params) -> String {
        format!(
            "{}{}{}?{}",
            HTTP_METHOD,
            self.host,
            self.path,
            canonical_query(params)
        )
    }

    /// Compute the signature token for `params` under `secret_key`
    pub fn sign(&self, params: &Params, secret_key: &str) -> String {
        let key = hmac::Key::new(hmac::HMAC_SHA256, secret_key.as_bytes());
        let tag = hmac::sign(&key, self.signing_base(params).as_bytes());
        BASE64.encode(tag.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn signer() -> Signer {
        Signer::new("example.com", "/v2/index.php")
    }

    #[test]
    fn known_vector() {
        let p = params(&[("Action", "RecordList"), ("domain", "test.com")]);

        assert_eq!(canonical_query(&p), "Action=RecordList&domain=test.com");
        assert_eq!(
            signer().signing_base(&p),
            "GETexample.com/v2/index.php?Action=RecordList&domain=test.com"
        );
        assert_eq!(
            signer().sign(&p, "k"),
            "FQ1vIo4UqviGPky3038DNsm6vU5YfJ63xDBNjoY4T88="
        );
    }

    #[test]
    fn signing_is_deterministic() {
        let p = params(&[
            ("SecretId", "AKIDexample"),
            ("Timestamp", "1700000000"),
            ("Nonce", "1700000001"),
            ("SignatureMethod", SIGNATURE_METHOD),
        ]);
        assert_eq!(signer().sign(&p, "secret"), signer().sign(&p, "secret"));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let ab = params(&[("b", "2"), ("a", "1")]);
        let ba = params(&[("a", "1"), ("b", "2")]);

        assert_eq!(canonical_query(&ab), "a=1&b=2");
        assert_eq!(signer().sign(&ab, "k"), signer().sign(&ba, "k"));
    }

    #[test]
    fn keys_sort_byte_wise() {
        // Uppercase sorts before lowercase
        let p = params(&[("domain", "x"), ("Action", "y"), ("Nonce", "z")]);
        assert_eq!(canonical_query(&p), "Action=y&Nonce=z&domain=x");
    }

    #[test]
    fn any_change_changes_the_signature() {
        let base = params(&[("Action", "RecordList"), ("domain", "test.com")]);
        let reference = signer().sign(&base, "k");

        let changed_value = params(&[("Action", "RecordList"), ("domain", "test.org")]);
        assert_ne!(signer().sign(&changed_value, "k"), reference);

        let added = params(&[("Action", "RecordList"), ("domain", "test.com"), ("x", "1")]);
        assert_ne!(signer().sign(&added, "k"), reference);

        let removed = params(&[("Action", "RecordList")]);
        assert_ne!(signer().sign(&removed, "k"), reference);

        assert_ne!(signer().sign(&base, "other-key"), reference);

        let other_host = Signer::new("cns.api.qcloud.com", "/v2/index.php");
        assert_ne!(other_host.sign(&base, "k"), reference);
    }

    #[test]
    fn values_are_not_url_encoded() {
        let p = params(&[("recordLine", "默认"), ("value", "a b&c")]);
        assert_eq!(canonical_query(&p), "recordLine=默认&value=a b&c");
    }

    #[test]
    fn from_endpoint_keeps_explicit_port_only() {
        let default_port = Url::parse("https://cns.api.qcloud.com/v2/index.php").unwrap();
        assert_eq!(
            Signer::from_endpoint(&default_port).unwrap(),
            Signer::new("cns.api.qcloud.com", "/v2/index.php")
        );

        let explicit = Url::parse("http://127.0.0.1:8080/v2/index.php").unwrap();
        assert_eq!(
            Signer::from_endpoint(&explicit).unwrap(),
            Signer::new("127.0.0.1:8080", "/v2/index.php")
        );
    }
}
