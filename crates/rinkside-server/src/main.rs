//! rinkside-server - waiting list endpoint.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use rinkside_core::{ApiClient, Config};
use rinkside_server::{router, AppState};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Service-role key; falls back to the anon key when unset
const ENV_SERVICE_KEY: &str = "RINKSIDE_SERVICE_KEY";

const ENV_BIND: &str = "RINKSIDE_BIND";

const DEFAULT_BIND: &str = "127.0.0.1:3000";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::load().context("Failed to load configuration")?;
    let (backend_url, anon_key) = config.backend()?;
    let key = std::env::var(ENV_SERVICE_KEY)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .unwrap_or(anon_key);
    let client = ApiClient::new(&backend_url, &key)?;

    let bind = std::env::var(ENV_BIND).unwrap_or_else(|_| DEFAULT_BIND.to_string());
    let address: SocketAddr = bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", bind))?;
    let listener = TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind to {}", address))?;

    info!(%address, backend = %backend_url, "Starting rinkside server");
    axum::serve(listener, router(AppState::new(client)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;
    info!("Server stopped");
    Ok(())
}
