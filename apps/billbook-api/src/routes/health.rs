//! Liveness and schema status.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use billbook_db::migrations::{migration_status, MigrationStatus};

use crate::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store: StoreInfo,
    pub database: bool,
    pub migrations: MigrationStatus,
    pub open_sessions: usize,
}

/// Store details the till prints on receipts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    pub name: String,
    pub state_code: String,
    pub currency_symbol: String,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let database = state.db.health_check().await;
    let migrations = migration_status(state.db.pool()).await?;

    let status = if database && migrations.is_current() {
        "ok"
    } else {
        "degraded"
    };

    Ok(Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        store: StoreInfo {
            name: state.config.store_name.clone(),
            state_code: state.config.store_state_code.clone(),
            currency_symbol: state.config.currency_symbol.clone(),
        },
        database,
        migrations,
        open_sessions: state.sessions.len().await,
    }))
}
