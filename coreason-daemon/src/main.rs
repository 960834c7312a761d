//! Federated query broker daemon.
//!
//! Exposes the catalog registry and the federation broker over a small REST surface:
//! `GET /health`, `POST /v1/sources`, `POST /v1/query`.

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod api;
mod config;
mod error;
mod services;
mod state;

use config::Config;
use services::Services;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.log_level.clone().into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = config.listen_addr;
    tracing::info!(
        %addr,
        vector_index_path = ?config.vector_index_path,
        policy_timeout_secs = config.policy_timeout_secs,
        dispatch_timeout_secs = config.dispatch_timeout_secs,
        default_limit = config.default_limit,
        "starting coreason-daemon"
    );
    let services = Arc::new(Services::new(config));
    let state = AppState::new(services);
    let app = api::create_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "coreason-daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("coreason-daemon shutting down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("received terminate signal, initiating graceful shutdown"),
    }
}
