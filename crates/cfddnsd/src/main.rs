// # cfddnsd - cfddns Daemon
//
// Thin integration layer. All reconciliation logic lives in cfddns-core.
//
// The cfddnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Building the IP resolver and the Cloudflare record store
// 4. Running the reconciler until SIGTERM/SIGINT
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// - `CF_API_TOKEN`: Cloudflare API token (required)
// - `DNS_RECORD_0`, `DNS_RECORD_1`, ...: `zone_id:record_id:name` (at least one)
// - `INTERVAL`: Seconds between cycles (default 300)
// - `IP_SOURCE_URL`: Public IP echo endpoint (default https://api.ipify.org)
// - `LOG_LEVEL`: trace, debug, info, warn, error (default info)
// - `CFDDNS_MODE`: `dry-run` to read records without writing them
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=your_token
// export DNS_RECORD_0=023e105f4ecef8ad9ca31a8372d0c353:372e67954025e0ba6aaa6d586b9e0b59:home.example.com
// export INTERVAL=300
//
// cfddnsd
// ```

use anyhow::Result;
use cfddns_core::{DdnsConfig, Reconciler};
use cfddns_ip_http::HttpIpResolver;
use cfddns_provider_cloudflare::CloudflareRecordStore;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

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

fn log_level(name: &str) -> Level {
    match name {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn main() -> ExitCode {
    // Load and validate configuration from environment
    let config = match DdnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(&config.log_level))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let reconciler = match build_reconciler(&config) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            eprintln!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(reconciler).await {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        } else {
            DdnsExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Wire the HTTP resolver and the Cloudflare store into a reconciler
fn build_reconciler(config: &DdnsConfig) -> cfddns_core::Result<Reconciler> {
    let resolver = HttpIpResolver::new(config.ip_source_url.clone())?;
    let store = CloudflareRecordStore::new(config.api_token.clone())?;

    Reconciler::new(Box::new(resolver), Box::new(store), config)
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(reconciler: Reconciler) -> Result<()> {
    let shutdown_rx = install_shutdown_handler()?;

    info!("Managing {} record(s)", reconciler.records().len());
    reconciler.run_with_shutdown(Some(shutdown_rx)).await;
    info!("Shutting down daemon");

    Ok(())
}

/// Forward SIGTERM/SIGINT to the reconciler's shutdown channel
#[cfg(unix)]
fn install_shutdown_handler() -> Result<oneshot::Receiver<()>> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let signal = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", signal);
        let _ = tx.send(());
    });

    Ok(rx)
}

/// Forward Ctrl-C to the reconciler's shutdown channel
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn install_shutdown_handler() -> Result<oneshot::Receiver<()>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal: SIGINT");
                let _ = tx.send(());
            }
            Err(e) => {
                // Keep the sender alive so the loop runs until the process is killed
                error!("Failed to wait for CTRL-C: {}", e);
                std::future::pending::<()>().await;
                drop(tx);
            }
        }
    });

    Ok(rx)
}
