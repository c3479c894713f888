//! Test doubles and common utilities for engine contract tests
//!
//! These doubles count calls and record arguments so tests can verify which
//! HTTP calls a real provider would have made.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource, ModifyOutcome};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How the mock answers `list_records`
#[derive(Clone)]
pub enum ListBehavior {
    /// Return these records
    Records(Vec<DnsRecord>),
    /// Answer with a non-zero provider status
    ApiError { code: i64, message: String },
    /// Fail as if the connection dropped
    Transport,
}

/// A mock DnsProvider that tracks calls
pub struct MockDnsProvider {
    list_behavior: Arc<Mutex<ListBehavior>>,
    /// Record names whose modify call answers with an API error
    failing: Arc<Mutex<HashSet<String>>>,
    /// Answer modify calls with `ModifyOutcome::DryRun`
    dry_run: Arc<AtomicBool>,
    list_call_count: Arc<AtomicUsize>,
    modify_call_count: Arc<AtomicUsize>,
    /// (record id, record name, ip) per modify call, in call order
    modified: Arc<Mutex<Vec<(String, String, String)>>>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            list_behavior: Arc::new(Mutex::new(ListBehavior::Records(records))),
            failing: Arc::new(Mutex::new(HashSet::new())),
            dry_run: Arc::new(AtomicBool::new(false)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            modify_call_count: Arc::new(AtomicUsize::new(0)),
            modified: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_list_behavior(self, behavior: ListBehavior) -> Self {
        *self.list_behavior.lock().unwrap() = behavior;
        self
    }

    /// Make modify calls for `name` fail with a provider status
    pub fn failing_on(self, name: &str) -> Self {
        self.failing.lock().unwrap().insert(name.to_string());
        self
    }

    /// Report every modify call as a dry-run
    pub fn dry_run(self) -> Self {
        self.dry_run.store(true, Ordering::SeqCst);
        self
    }

    /// Change the list answer for subsequent passes
    pub fn set_list_behavior(&self, behavior: ListBehavior) {
        *self.list_behavior.lock().unwrap() = behavior;
    }

    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    pub fn modify_call_count(&self) -> usize {
        self.modify_call_count.load(Ordering::SeqCst)
    }

    pub fn modified(&self) -> Vec<(String, String, String)> {
        self.modified.lock().unwrap().clone()
    }

    /// Create a new MockDnsProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            list_behavior: Arc::clone(&other.list_behavior),
            failing: Arc::clone(&other.failing),
            dry_run: Arc::clone(&other.dry_run),
            list_call_count: Arc::clone(&other.list_call_count),
            modify_call_count: Arc::clone(&other.modify_call_count),
            modified: Arc::clone(&other.modified),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _domain: &str) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        match self.list_behavior.lock().unwrap().clone() {
            ListBehavior::Records(records) => Ok(records),
            ListBehavior::ApiError { code, message } => Err(Error::api(code, message)),
            ListBehavior::Transport => Err(Error::http("connection reset by peer")),
        }
    }

    async fn modify_record(
        &self,
        _domain: &str,
        record: &DnsRecord,
        ip: &str,
    ) -> Result<ModifyOutcome> {
        self.modify_call_count.fetch_add(1, Ordering::SeqCst);
        self.modified.lock().unwrap().push((
            record.id.clone(),
            record.name.clone(),
            ip.to_string(),
        ));

        if self.failing.lock().unwrap().contains(&record.name) {
            return Err(Error::api(4002, "record is locked"));
        }
        if self.dry_run.load(Ordering::SeqCst) {
            return Ok(ModifyOutcome::DryRun);
        }
        Ok(ModifyOutcome::Applied)
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IpSource that always reports the same address
pub struct StaticIpSource {
    ip: String,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.to_string(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip.clone(),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<String> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip.clone())
    }
}

/// An IpSource whose lookup never succeeds
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<String> {
        Err(Error::ip_source("lookup reply has no `ip` field"))
    }
}

/// Build a listed record
pub fn record(id: &str, record_type: &str, name: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type: record_type.to_string(),
        name: name.to_string(),
        value: "198.51.100.1".to_string(),
        ttl: 600,
        line: "默认".to_string(),
    }
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(subdomains: &[&str]) -> ddns_core::config::DdnsConfig {
    subdomains.iter().fold(
        ddns_core::config::DdnsConfig::new("test-id", "test-key", "example.com")
            .with_update_interval_secs(60),
        |config, name| config.with_subdomain(*name),
    )
}
