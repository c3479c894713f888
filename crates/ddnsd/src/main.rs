// # ddnsd - DDNS Daemon
//
// The ddnsd daemon is responsible for:
// 1. Reading `config.json` from the working directory
// 2. Initializing logging and the runtime
// 3. Building the qcloud provider and the HTTP IP source
// 4. Running the DDNS engine until SIGINT/SIGTERM
//
// ## Configuration
//
// ```json
// {
//     "secret_id": "AKID...",
//     "secret_key": "...",
//     "domain": "example.com",
//     "subdomains": ["www", "home"],
//     "update_interval_secs": 600
// }
// ```
//
// Optional keys: `api_endpoint`, `ip_lookup_url`, `request_timeout_secs`,
// `log_level`, `dry_run`. The keys `second_domain` and `update_interval` are
// accepted in place of `subdomains` and `update_interval_secs`.

use anyhow::Result;
use ddns_core::{DdnsConfig, DdnsEngine, EngineEvent};
use ddns_ip_http::HttpIpSource;
use ddns_provider_qcloud::QcloudProvider;
use std::process::ExitCode;
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Configuration file, relative to the working directory
const CONFIG_PATH: &str = "config.json";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    // Load and validate configuration
    let config = match DdnsConfig::from_file(CONFIG_PATH) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");
    info!(
        "Configuration loaded: {} subdomain(s) of {}",
        config.subdomains.len(),
        config.domain
    );

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let (engine, event_rx) = match build_engine(config) {
        Ok(built) => built,
        Err(e) => {
            error!("Startup error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(engine, event_rx).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire the provider and IP source into an engine
fn build_engine(config: DdnsConfig) -> Result<(DdnsEngine, mpsc::Receiver<EngineEvent>)> {
    let provider = QcloudProvider::from_config(&config)?;
    let ip_source = HttpIpSource::from_config(&config)?;

    info!("Public IP lookup via {}", ip_source.url());
    for name in &config.subdomains {
        info!("Managing record: {}.{}", name, config.domain);
    }

    Ok(DdnsEngine::new(
        Box::new(ip_source),
        Box::new(provider),
        config,
    )?)
}

/// Run the engine until a shutdown signal arrives
async fn run_daemon(engine: DdnsEngine, mut event_rx: mpsc::Receiver<EngineEvent>) -> Result<()> {
    // The engine logs every outcome itself; events are only traced
    let event_logger = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    {
        let engine = engine;
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let engine_run = engine.run_with_shutdown(Some(shutdown_rx));
        tokio::pin!(engine_run);

        tokio::select! {
            result = &mut engine_run => {
                result?;
            }
            signal = wait_for_shutdown() => {
                info!("Received shutdown signal: {}", signal?);
                let _ = shutdown_tx.send(());
                engine_run.await?;
            }
        }
    }

    // The engine held the event sender; the logger ends once it has drained
    let _ = event_logger.await;

    info!("Shutting down daemon");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
