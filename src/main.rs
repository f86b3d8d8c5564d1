//! finegate
//!
//! Serves authorization decisions for GitHub access over HTTP.

use clap::Parser;
use finegate::{
    config::{AppConfig, LogFormat, load_config},
    error::ConfigError,
    kernel::{Kernel, SharedKernel},
    server::{AppState, router},
    transport::{HttpConfig, run_http_blocking},
    upstream::UpstreamClient,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// finegate - fine-grained access control for GitHub
#[derive(Parser, Debug)]
#[command(name = "finegate")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "FINEGATE_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides logging.level
    #[arg(long, env = "FINEGATE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format; overrides logging.format
    #[arg(long, env = "FINEGATE_LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,

    /// HTTP server host; overrides server.host
    #[arg(long, env = "FINEGATE_HTTP_HOST")]
    host: Option<String>,

    /// HTTP server port; overrides server.port
    #[arg(long, env = "FINEGATE_HTTP_PORT")]
    port: Option<u16>,
}

fn init_logging(args: &Args, config: &AppConfig) {
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match args.log_format.unwrap_or(config.logging.format) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .init(),
    }
}

/// Log what a kernel snapshot enforces
fn log_snapshot(kernel: &Kernel) {
    let taxonomy = kernel.taxonomy();
    info!(
        actions = taxonomy.primitive_actions().len(),
        namespaces = taxonomy.namespaces().count(),
        bundles = taxonomy.bundles().count(),
        "Action catalog loaded"
    );

    for rule in kernel.evaluator().rules() {
        info!("  rule {}", rule.summary());
    }

    for credential in kernel.credentials().iter() {
        info!(
            credential = credential.name(),
            token = %credential.secret().masked(),
            repos = credential.repos().len(),
            "Credential configured"
        );
    }
}

fn build_kernel(config_path: Option<&str>) -> Result<Kernel, ConfigError> {
    let config = load_config(config_path)?;
    Kernel::from_config(&config)
}

/// Rebuild the kernel on SIGHUP. A failed reload keeps the current snapshot.
#[cfg(unix)]
fn spawn_reload(kernel: Arc<SharedKernel>, config_path: Option<String>, cancel: CancellationToken) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                error!(error = %e, "Failed to install SIGHUP handler; reload disabled");
                return;
            }
        };

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!("Received SIGHUP, reloading configuration");
                    match build_kernel(config_path.as_deref()) {
                        Ok(next) => {
                            log_snapshot(&next);
                            kernel.replace(next);
                            info!("Configuration reloaded");
                        }
                        Err(e) => {
                            error!(error = %e, "Reload failed, keeping previous configuration");
                        }
                    }
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Configuration decides the log format, so it loads before logging starts
    let config = load_config(args.config.as_deref())?;

    init_logging(&args, &config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting finegate");

    let kernel = Kernel::from_config(&config)
        .inspect_err(|e| error!(error = %e, "Failed to build authorization kernel"))?;
    log_snapshot(&kernel);
    let kernel = Arc::new(SharedKernel::new(kernel));

    let probe = Arc::new(
        UpstreamClient::new(&config.upstream)
            .inspect_err(|e| error!(error = %e, "Failed to create upstream client"))?,
    );

    let cancel = CancellationToken::new();

    #[cfg(unix)]
    spawn_reload(Arc::clone(&kernel), args.config.clone(), cancel.clone());

    let host = args.host.as_deref().unwrap_or(&config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let http_config = HttpConfig::from_host_port(host, port)?;

    run_http_blocking(
        router(AppState::new(kernel, probe)),
        http_config,
        cancel.clone(),
    )
    .await?;

    cancel.cancel();

    Ok(())
}
