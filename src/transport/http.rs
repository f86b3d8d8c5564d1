//! HTTP transport
//!
//! Binds a listener and serves the axum router with graceful shutdown.

use crate::error::TransportError;
use axum::Router;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Default port for the HTTP listener
pub const DEFAULT_HTTP_PORT: u16 = 8766;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:8766")
    pub bind: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with the specified bind address
    pub fn new(bind: SocketAddr) -> Self {
        Self { bind }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, TransportError> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self::new(addr))
    }
}

/// A server running in the background
#[derive(Debug)]
pub struct RunningServer {
    /// The address actually bound (differs from the config when port 0 is used)
    pub local_addr: SocketAddr,
    /// Cancel to begin a graceful shutdown
    pub shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl RunningServer {
    /// Trigger shutdown and wait for in-flight requests to finish
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "HTTP server task failed");
        }
    }
}

/// Start serving `app` in the background
///
/// # Returns
/// A handle whose cancellation token stops the server
pub async fn run_http(app: Router, config: HttpConfig) -> Result<RunningServer, TransportError> {
    let listener = TcpListener::bind(config.bind).await?;
    let local_addr = listener.local_addr()?;

    info!("HTTP server listening on http://{}", local_addr);
    info!("  Authorize endpoint: POST /v1/authorize");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    let on_exit = shutdown.clone();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .await;
        if let Err(e) = result {
            error!(error = %e, "HTTP server error");
        }
        on_exit.cancel();
    });

    Ok(RunningServer {
        local_addr,
        shutdown,
        task,
    })
}

/// Serve `app` and wait for a shutdown signal (Ctrl+C) or `cancel`
pub async fn run_http_blocking(
    app: Router,
    config: HttpConfig,
    cancel: CancellationToken,
) -> Result<(), TransportError> {
    let server = run_http(app, config).await?;

    info!("Press Ctrl+C to stop the server");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        _ = cancel.cancelled() => {
            info!("Server cancelled");
        }
        _ = server.shutdown.cancelled() => {
            info!("Server exited");
        }
    }

    server.stop().await;

    info!("HTTP server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_host_port() {
        let config = HttpConfig::from_host_port("0.0.0.0", 9000).unwrap();
        assert_eq!(config.bind.port(), 9000);
        assert!(config.bind.ip().is_unspecified());
    }

    #[test]
    fn test_from_host_port_invalid() {
        assert!(matches!(
            HttpConfig::from_host_port("not a host", 9000),
            Err(TransportError::Address(_))
        ));
    }

    #[test]
    fn test_default_config() {
        assert_eq!(HttpConfig::default().bind.port(), DEFAULT_HTTP_PORT);
    }
}
