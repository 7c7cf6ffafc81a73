use anyhow::{Context, Result};
use grounded_types::models::GatewayConfig;
use std::fmt;
use std::future::Future;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

pub async fn create_listener(config: &GatewayConfig) -> Result<TcpListener> {
    let addr = config.socket_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("[Server] Bound to {}", listener.local_addr()?);
    Ok(listener)
}

/// Why the gateway stopped accepting connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Resolves on the first SIGINT or SIGTERM; handed to axum's graceful shutdown.
pub async fn shutdown_signal() {
    drain_after(next_signal()).await;
}

/// Wait for `trigger`, then announce the drain.
async fn drain_after<F>(trigger: F) -> ShutdownReason
where
    F: Future<Output = ShutdownReason>,
{
    let reason = trigger.await;
    info!(reason = %reason, "[Server] Shutdown requested, draining in-flight requests");
    reason
}

/// A handler that fails to install never fires; the other one still can.
async fn next_signal() -> ShutdownReason {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("[Server] Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
        ShutdownReason::Interrupt
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                warn!("[Server] SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            },
        }
        ShutdownReason::Terminate
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<ShutdownReason>();

    tokio::select! {
        reason = interrupt => reason,
        reason = terminate => reason,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listener_binds_ephemeral_port() {
        let config = GatewayConfig { bind_address: "127.0.0.1".to_string(), port: 0, ..GatewayConfig::default() };
        let listener = create_listener(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_listener_reports_bad_address() {
        let config = GatewayConfig { bind_address: "192.0.2.1".to_string(), port: 0, ..GatewayConfig::default() };
        let err = create_listener(&config).await.unwrap_err();
        assert!(err.to_string().contains("192.0.2.1:0"));
    }

    #[tokio::test]
    async fn test_drain_reports_trigger_reason() {
        assert_eq!(drain_after(async { ShutdownReason::Terminate }).await, ShutdownReason::Terminate);
        assert_eq!(ShutdownReason::Interrupt.to_string(), "SIGINT");
    }
}
