//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Listing the domain's records via DnsProvider
//! - Looking up the current public IP via IpSource
//! - Pointing every managed A record at that IP
//! - Repeating the pass on a fixed interval
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────┐
//!     timer ────▶ │  DdnsEngine  │ ──── EngineEvent ───▶ (monitoring)
//!                 └──────────────┘
//!                   │    │     │
//!          1. list  │    │     │ 3. modify (per managed A record)
//!                   ▼    │     ▼
//!          ┌─────────────┴──────────┐
//!          │      DnsProvider       │
//!          └────────────────────────┘
//!                        │ 2. resolve
//!                        ▼
//!                 ┌─────────────┐
//!                 │  IpSource   │
//!                 └─────────────┘
//! ```
//!
//! ## Pass Flow
//!
//! 1. List records. A provider rejection ends the pass here.
//! 2. Resolve the public IP.
//! 3. Modify each A record whose name is a managed subdomain. A failure on
//!    one record is logged and the next record is still attempted.
//!
//! Transport failures during steps 1 and 2 are returned from
//! [`DdnsEngine::run_pass`] as errors; the loop logs them and waits for the
//! next pass.

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource, ModifyOutcome};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started {
        subdomains_count: usize,
    },

    /// A synchronization pass began
    PassStarted,

    /// Public IP resolved for the current pass
    IpResolved {
        ip: String,
    },

    /// A record was pointed at the current IP
    RecordUpdated {
        record_name: String,
        ip: String,
    },

    /// Dry-run: a record would have been pointed at the current IP
    RecordDryRun {
        record_name: String,
        ip: String,
    },

    /// Modifying a record failed
    RecordFailed {
        record_name: String,
        error: String,
    },

    /// The provider rejected the record list; no records were modified
    PassAborted {
        code: i64,
        message: String,
    },

    /// The pass could not complete (transport or lookup failure)
    PassFailed {
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Outcome of a single synchronization pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// The IP the records were pointed at (None if the pass was aborted)
    pub ip: Option<String>,
    /// Names of records modified successfully
    pub updated: Vec<String>,
    /// Names of records whose modification failed
    pub failed: Vec<String>,
    /// Names of records the provider left untouched because of dry-run
    pub dry_run: Vec<String>,
    /// Listed records left untouched (not A, or not managed)
    pub skipped: usize,
    /// The provider rejected the record list
    pub aborted: bool,
}

impl PassReport {
    fn aborted() -> Self {
        Self {
            aborted: true,
            ..Self::default()
        }
    }
}

/// Core DDNS engine
///
/// The engine holds the immutable configuration and the two collaborators.
/// [`DdnsEngine::run_pass`] performs one synchronization and touches no
/// process-wide state, so tests can drive it directly without the timer.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Engine runs passes until a shutdown signal is received
pub struct DdnsEngine {
    /// IP source for the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for listing and modifying records
    provider: Box<dyn DnsProvider>,

    /// Validated configuration
    config: DdnsConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events.
    /// Dropping the receiver is allowed; events are then discarded silently.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            ip_source,
            provider,
            config,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine
    ///
    /// Runs a pass, waits the configured interval, and repeats until
    /// SIGINT (ctrl-c) is received.
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the engine, stopping when `shutdown_rx` fires (or its sender is
    /// dropped) instead of on ctrl-c
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(EngineEvent::Started {
            subdomains_count: self.config.subdomains.len(),
        });
        info!(
            "Managing {} subdomain(s) of {} every {:?}",
            self.config.subdomains.len(),
            self.config.domain,
            self.config.update_interval()
        );

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for ctrl-c: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                outcome = self.run_pass() => {
                    match outcome {
                        Ok(report) => debug!(
                            "Pass finished: {} updated, {} failed, {} dry-run, {} skipped, aborted={}",
                            report.updated.len(),
                            report.failed.len(),
                            report.dry_run.len(),
                            report.skipped,
                            report.aborted
                        ),
                        Err(e) => {
                            error!("Synchronization pass failed: {}", e);
                            self.emit_event(EngineEvent::PassFailed {
                                error: e.to_string(),
                            });
                        }
                    }
                }
                _ = &mut shutdown => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.update_interval()) => {}
                _ = &mut shutdown => break,
            }
        }

        info!("Shutdown signal received");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Run a single synchronization pass
    ///
    /// # Returns
    ///
    /// - `Ok(PassReport)`: The pass ran to completion, or was aborted because
    ///   the provider rejected the record list
    /// - `Err(Error)`: Listing or IP lookup did not complete
    pub async fn run_pass(&self) -> Result<PassReport> {
        self.emit_event(EngineEvent::PassStarted);

        let domain = &self.config.domain;
        let records = match self.provider.list_records(domain).await {
            Ok(records) => records,
            Err(Error::Api { code, message }) => {
                error!("Get record list error: code={}, msg={}", code, message);
                self.emit_event(EngineEvent::PassAborted { code, message });
                return Ok(PassReport::aborted());
            }
            Err(e) => return Err(e),
        };
        debug!(
            "{} listed {} record(s) for {}",
            self.provider.provider_name(),
            records.len(),
            domain
        );

        let ip = self.ip_source.current().await?;
        info!("Your ip is {}", ip);
        self.emit_event(EngineEvent::IpResolved { ip: ip.clone() });

        let mut report = PassReport {
            ip: Some(ip.clone()),
            ..PassReport::default()
        };

        for record in &records {
            if !record.is_a() || !self.config.manages(&record.name) {
                report.skipped += 1;
                continue;
            }

            match self.provider.modify_record(domain, record, &ip).await {
                Ok(ModifyOutcome::Applied) => {
                    info!("Modify dns {} record success", record.name);
                    self.emit_event(EngineEvent::RecordUpdated {
                        record_name: record.name.clone(),
                        ip: ip.clone(),
                    });
                    report.updated.push(record.name.clone());
                }
                Ok(ModifyOutcome::DryRun) => {
                    info!("Modify dns {} record skipped (dry-run)", record.name);
                    self.emit_event(EngineEvent::RecordDryRun {
                        record_name: record.name.clone(),
                        ip: ip.clone(),
                    });
                    report.dry_run.push(record.name.clone());
                }
                Err(e) => {
                    error!("Modify dns {} record error: {}", record.name, e);
                    self.emit_event(EngineEvent::RecordFailed {
                        record_name: record.name.clone(),
                        error: e.to_string(),
                    });
                    report.failed.push(record.name.clone());
                }
            }
        }

        Ok(report)
    }

    /// Emit an engine event
    ///
    /// A closed channel means nobody is listening; only a full one is worth a
    /// warning.
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => warn!("Event channel full, dropping event"),
        }
    }
}
