//! # Billbook API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  env ──► ApiConfig ──► Database (migrations) ──► AppState ──► Router   │
//! │                                                                  │      │
//! │                                         TcpListener ◄── axum::serve     │
//! │                                              │                          │
//! │                              Ctrl+C / SIGTERM ──► graceful shutdown     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use billbook_api::auth::LogCodeSender;
use billbook_api::{build_router, ApiConfig, AppState};
use billbook_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Billbook API server...");

    let config = ApiConfig::load().context("invalid configuration")?;
    info!(
        environment = %config.environment,
        bind_addr = %config.bind_addr,
        db_path = %config.db_path,
        store_state = %config.store_state_code,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(&config.db_path))
        .await
        .context("failed to open database")?;

    let staff = db.staff().count().await?;
    if staff == 0 {
        info!("No staff accounts yet; run the seed binary to create an admin");
    }

    let bind_addr = config.bind_addr;
    let state = AppState::new(config, db.clone(), Arc::new(LogCodeSender));
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(%bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise info, with debug for the `billbook_*` crates.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,billbook=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
