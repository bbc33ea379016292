//! # Error Types
//!
//! Domain-specific error types for billbook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  billbook-core errors (this file)                                      │
//! │  ├── CoreError        - Domain errors, classified by ErrorKind          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── RepoError        - What a repository port reports                 │
//! │                                                                         │
//! │  billbook-db errors (separate crate)                                   │
//! │  └── DbError          - SQLite failures, folded into RepoError          │
//! │                                                                         │
//! │  billbook-api errors (in app)                                          │
//! │  └── ApiError         - What HTTP clients see (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │        DbError → RepoError ─────────┴──► ApiError → JSON               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, item id, etc.)
//! 3. Nothing is silently swallowed: an unknown line item is `NotFound`,
//!    an out-of-range discount is `InvalidArgument`

use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

use crate::access::{Capability, Role};

// =============================================================================
// Error Kind
// =============================================================================

/// Coarse classification of a [`CoreError`].
///
/// Callers branch on the kind; the message carries the detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Negative quantity, out-of-range discount, negative redemption, bad text.
    InvalidArgument,
    /// An operation referenced a line item, product or customer that is absent.
    NotFound,
    /// The caller's role lacks the capability for the operation.
    Forbidden,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input was rejected at the validation boundary.
    ///
    /// ## When This Occurs
    /// - `set_discount` with a value outside 0..=100
    /// - `set_quantity` with a negative quantity
    /// - `redeem` with negative points
    /// - Unparseable text from a form field
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// A referenced entity does not exist.
    ///
    /// ## When This Occurs
    /// ```text
    /// set_quantity(cart, "item-42", 3)
    ///      │
    ///      ▼
    /// cart.items has no "item-42"
    ///      │
    ///      ▼
    /// NotFound { entity: "Line item", id: "item-42" }
    /// ```
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Role lacks a capability.
    #[error("Role {role} is not allowed to {capability}")]
    Forbidden { role: Role, capability: Capability },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CoreError::NotFound { .. } => ErrorKind::NotFound,
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range. Bounds are rendered as given.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Invalid format (e.g., invalid UUID, unparseable number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }

    pub(crate) fn invalid_format(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(field: &str, min: impl ToString, max: impl ToString) -> Self {
        ValidationError::OutOfRange {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }
}

// =============================================================================
// Repository Error
// =============================================================================

/// Errors reported through the repository ports in [`crate::ports`].
///
/// Storage adapters translate their own failures into these variants so the
/// service layer never sees a concrete database error type.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The requested record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The write conflicts with existing state (duplicate key, balance moved).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store failed.
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl RepoError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        RepoError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for repository port operations.
pub type RepoResult<T> = Result<T, RepoError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::not_found("Line item", "abc");
        assert_eq!(err.to_string(), "Line item not found: abc");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::required("name");
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::out_of_range("discount", 0, 100);
        assert_eq!(err.to_string(), "discount must be between 0 and 100");
    }

    #[test]
    fn test_validation_converts_to_invalid_argument() {
        let core_err: CoreError = ValidationError::negative("points").into();
        assert_eq!(core_err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            core_err.to_string(),
            "Invalid argument: points must not be negative"
        );
    }

    #[test]
    fn test_forbidden_kind() {
        let err = CoreError::Forbidden {
            role: Role::Sales,
            capability: Capability::ViewReports,
        };
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(err.to_string(), "Role sales is not allowed to view reports");
    }
}
