//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Billbook                               │
//! │                                                                         │
//! │  Handler  Result<Json<T>, ApiError>                                    │
//! │     │                                                                   │
//! │     ├── CoreError::InvalidArgument ──► 400 VALIDATION_ERROR            │
//! │     ├── CoreError::NotFound ─────────► 404 NOT_FOUND                   │
//! │     ├── CoreError::Forbidden ────────► 403 FORBIDDEN                   │
//! │     ├── RepoError::Conflict ─────────► 409 CONFLICT                    │
//! │     ├── RepoError::Storage ──────────► 500 DATABASE_ERROR (logged)     │
//! │     └── bad / missing token ─────────► 401 UNAUTHORIZED                │
//! │                                                                         │
//! │  Client receives:                                                      │
//! │  { "code": "NOT_FOUND", "message": "Line item not found: abc" }        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage details are logged with `tracing::error!` and replaced by a
//! generic message before they reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use billbook_core::{CoreError, ErrorKind, RepoError, ValidationError};
use billbook_db::DbError;
use serde::Serialize;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 5f0c…"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Missing, expired or invalid credentials (401)
    Unauthorized,

    /// Authenticated but lacking the capability (403)
    Forbidden,

    /// State changed underneath the request (409)
    Conflict,

    /// Too many wrong login codes (429)
    TooManyAttempts,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Logs the detail and returns a generic internal error.
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        tracing::error!(error = %detail, "Internal error");
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match err.kind() {
            ErrorKind::InvalidArgument => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::Forbidden => ErrorCode::Forbidden,
        };
        let message = match err {
            // The wrapper prefix adds nothing for a form field error
            CoreError::InvalidArgument(e) => e.to_string(),
            other => other.to_string(),
        };
        ApiError::new(code, message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts repository errors to API errors.
impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            RepoError::Conflict(message) => ApiError::new(ErrorCode::Conflict, message),
            RepoError::Storage(e) => {
                // Log the actual error but return a generic message
                tracing::error!(error = %e, "Storage operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        RepoError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use billbook_core::{Capability, Role};

    #[test]
    fn test_core_error_mapping() {
        let err: ApiError = CoreError::not_found("Line item", "x").into();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err: ApiError = CoreError::Forbidden {
            role: Role::Sales,
            capability: Capability::ViewReports,
        }
        .into();
        assert_eq!(err.code.status(), StatusCode::FORBIDDEN);

        let err: ApiError = ValidationError::Required {
            field: "phone".to_string(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "phone is required");
    }

    #[test]
    fn test_storage_detail_not_leaked() {
        let err: ApiError = RepoError::Storage("disk I/O error at /var/db".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("/var/db"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Invoice", "i-1")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Invoice not found: i-1");
    }
}
