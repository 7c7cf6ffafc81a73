//! Grounded Gateway - Headless Daemon
//!
//! Serves cited answers over HTTP:
//! - `POST /api/chat` buffered JSON answers
//! - `POST /api/chat/stream` Server-Sent Events
//! - `GET /health`, `GET /version`

use anyhow::Result;
use clap::Parser;
use grounded_core::providers::build_http_client;
use grounded_core::{build_router, AppState, HttpProviderFactory};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod server_utils;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::resolve(cli.config.as_deref(), cli.port)?;
    info!(
        "[Server] Grounded Gateway {} starting (default evidence: {:?}, {} trusted domains)",
        env!("CARGO_PKG_VERSION"),
        config.evidence.default_mode,
        config.trusted_domains.len()
    );

    let http = build_http_client()?;
    let factory = Arc::new(HttpProviderFactory::new(http, config.clone()));
    let state = AppState::new(config.clone(), factory);
    let sweeper = state.spawn_background_tasks();

    let app = build_router(state);
    let listener = server_utils::create_listener(&config).await?;
    info!("[Server] Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(server_utils::shutdown_signal())
        .await?;

    sweeper.abort();
    info!("[Server] Stopped");
    Ok(())
}
