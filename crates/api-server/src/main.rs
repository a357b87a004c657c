//! Tool-workflow sidecar
//!
//! Accepts run requests, streams run progress over SSE and proxies tool
//! calls to the downstream executor. Configured from the environment, see
//! [`config::SidecarConfig`].

mod auth;
mod config;
mod error;
mod routes;
mod state;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::SidecarConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tw_sidecar=debug,tw_core=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SidecarConfig::from_env();
    if config.shared_token == SidecarConfig::default().shared_token {
        tracing::warn!("TW_SHARED_TOKEN is not set, using the placeholder token");
    }
    tracing::info!("Reasoning backend and tool executor at {}", config.node_url);

    let bind_addr = config.bind_addr;
    let state = AppState::new(config).context("Failed to initialize application state")?;
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Sidecar listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Sidecar stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
