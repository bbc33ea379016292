//! # Billbook API
//!
//! HTTP billing service: carts, GST totals, loyalty redemption and
//! invoices over JSON.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Billbook API                                    │
//! │                                                                         │
//! │  request ──► TraceLayer ──► Router ──► handler                         │
//! │                                          │                              │
//! │                     AuthUser (Bearer JWT)┤                              │
//! │                                          ▼                              │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                          AppState                                 │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌─────────────────────┐ │  │
//! │  │  │ SessionReg.  │  │ Ports (Arc<dyn>) │  │ Authenticator       │ │  │
//! │  │  │ one Mutex    │  │ ProductCatalog   │  │ challenge / verify  │ │  │
//! │  │  │ per cart     │  │ CustomerDirectory│  │ JwtManager          │ │  │
//! │  │  │              │  │ CartStore        │  │                     │ │  │
//! │  │  │              │  │ InvoiceStore     │  │                     │ │  │
//! │  │  └──────────────┘  └────────┬─────────┘  └─────────────────────┘ │  │
//! │  └─────────────────────────────┼─────────────────────────────────────┘  │
//! │                                ▼                                        │
//! │                     billbook-db (SQLite, WAL)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables, see [`config::ApiConfig`]:
//! - `BILLBOOK_BIND_ADDR` - listen address (default: 0.0.0.0:8080)
//! - `BILLBOOK_DB_PATH` - SQLite file (default: ./billbook.db)
//! - `BILLBOOK_JWT_SECRET` - token signing secret, required in production
//! - `BILLBOOK_STORE_STATE_CODE` - GST state code of the store (default: 29)

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod sessions;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use billbook_core::ports::{CartStore, CustomerDirectory, InvoiceStore, ProductCatalog};
use billbook_db::Database;

use crate::auth::{Authenticator, CodeSender, JwtManager};
use crate::sessions::SessionRegistry;

// Re-exports
pub use config::ApiConfig;
pub use error::ApiError;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub db: Database,
    pub catalog: Arc<dyn ProductCatalog>,
    pub customers: Arc<dyn CustomerDirectory>,
    pub carts: Arc<dyn CartStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub sessions: Arc<SessionRegistry>,
    pub jwt: Arc<JwtManager>,
    pub auth: Arc<Authenticator>,
}

impl AppState {
    /// Wires the SQLite repositories and auth around `db`.
    pub fn new(config: ApiConfig, db: Database, sender: Arc<dyn CodeSender>) -> Self {
        let jwt = Arc::new(JwtManager::new(
            config.jwt_secret.clone(),
            config.token_lifetime_secs,
        ));
        let auth = Arc::new(Authenticator::new(
            db.staff(),
            jwt.clone(),
            sender,
            config.challenge_lifetime_secs,
            config.challenge_max_attempts,
        ));

        AppState {
            catalog: Arc::new(db.products()),
            customers: Arc::new(db.customers()),
            carts: Arc::new(db.held_carts()),
            invoices: Arc::new(db.invoices()),
            sessions: Arc::new(SessionRegistry::new()),
            config: Arc::new(config),
            db,
            jwt,
            auth,
        }
    }
}

/// Builds the router with request tracing.
pub fn build_router(state: AppState) -> Router {
    routes::routes()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
