//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RepoError (billbook-core ports) ← NotFound / Conflict / Storage       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (billbook-api) ← Serialized for HTTP clients                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use billbook_core::RepoError;
use thiserror::Error;

/// Errors from the SQLite repositories.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - `fetch_one` returns no rows
    /// - ID doesn't exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Inserting duplicate SKU
    /// - Second customer with the same phone
    /// - Any UNIQUE index violation
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Invoice referencing a customer that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// The customer's balance no longer covers the redemption.
    ///
    /// ## When This Occurs
    /// ```text
    /// Session A: attach customer (100 pts) ── redeem 80 ── checkout ✓
    /// Session B: attach customer (100 pts) ── redeem 80 ── checkout ✗
    ///                                                   (only 20 left)
    /// ```
    #[error("Customer {customer_id} has insufficient loyalty points: requested {requested}")]
    InsufficientPoints { customer_id: String, requested: i64 },

    /// The database file could not be opened or the pool is closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other constraint or SQL failure.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored JSON payload or enum column could not be decoded.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Classifies sqlx errors.
///
/// ```text
/// RowNotFound                   → NotFound
/// Database (UNIQUE)             → UniqueViolation  (field = "table.column")
/// Database (FOREIGN KEY)        → ForeignKeyViolation
/// PoolTimedOut / PoolClosed     → PoolExhausted / ConnectionFailed
/// ColumnDecode / Decode         → Serialization
/// ```
///
/// Repositories replace the `"unknown"` placeholders with the offending
/// value when they know it.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => unique_violation(message),
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation {
                        message: message.to_string(),
                    },
                    // Builds without extended result codes only carry the text
                    _ if message.starts_with("UNIQUE constraint failed") => unique_violation(message),
                    _ if message.starts_with("FOREIGN KEY constraint failed") => {
                        DbError::ForeignKeyViolation {
                            message: message.to_string(),
                        }
                    }
                    _ => DbError::QueryFailed(message.to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Serialization(err.to_string())
            }

            other => DbError::Internal(other.to_string()),
        }
    }
}

/// SQLite reports `UNIQUE constraint failed: products.sku`.
fn unique_violation(message: &str) -> DbError {
    let field = message.rsplit(": ").next().unwrap_or("unknown");
    DbError::duplicate(field, "unknown")
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Folds database errors into the port error type.
///
/// ```text
/// NotFound                               → RepoError::NotFound
/// UniqueViolation / ForeignKeyViolation  → RepoError::Conflict
/// InsufficientPoints                     → RepoError::Conflict
/// everything else                        → RepoError::Storage
/// ```
impl From<DbError> for RepoError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RepoError::NotFound { entity, id },
            DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }
            | DbError::InsufficientPoints { .. } => RepoError::Conflict(err.to_string()),
            other => RepoError::Storage(other.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
