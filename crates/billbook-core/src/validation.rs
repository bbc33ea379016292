//! # Validation Module
//!
//! Field validators for catalog, customer and staff records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler                                                 │
//! │  ├── Type validation (deserialization)                                 │
//! │  ├── crate::parse: text → Money / DiscountRate / quantity              │
//! │  └── THIS MODULE: field rules (sku, phone, state code)                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Cart / LineItem model                                        │
//! │  └── Range invariants (discount 0..=100, quantity >= 0)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  └── UNIQUE constraints (sku, phone)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billbook_core::validation::{normalize_phone, validate_sku};
//!
//! validate_sku("HAIR-001").unwrap();
//! assert_eq!(normalize_phone("+91 98450 12345").unwrap(), "9845012345");
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use billbook_core::validation::validate_sku;
///
/// assert!(validate_sku("BEV-CHAI-01").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("A".repeat(100).as_str()).is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::required("sku"));
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a display name (products, customers, staff).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name)
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Contact Validators
// =============================================================================

/// Validates an Indian mobile number and returns its 10-digit form.
///
/// ## Rules
/// - Optional `+91` or `91` prefix, spaces and hyphens are ignored
/// - Exactly 10 digits remain
/// - First digit is 6-9
///
/// ```text
/// "+91 98450-12345" ──► "9845012345"
/// "09845012345"     ──► rejected (11 digits)
/// ```
pub fn normalize_phone(phone: &str) -> ValidationResult<String> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required("phone"));
    }

    let without_prefix = trimmed.strip_prefix("+91").unwrap_or(trimmed);
    let digits: String = without_prefix
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format("phone", "must contain only digits"));
    }

    let digits = if digits.len() == 12 && digits.starts_with("91") {
        digits[2..].to_string()
    } else {
        digits
    };

    if digits.len() != 10 {
        return Err(ValidationError::invalid_format("phone", "must be a 10-digit mobile number"));
    }

    if !matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return Err(ValidationError::invalid_format("phone", "must start with 6, 7, 8 or 9"));
    }

    Ok(digits)
}

/// Validates an Indian mobile number.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    normalize_phone(phone).map(|_| ())
}

/// Validates a two-digit GST state code ("01" to "38", plus "97" and "99").
pub fn validate_state_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();
    let valid = code.len() == 2
        && code.chars().all(|c| c.is_ascii_digit())
        && matches!(code.parse::<u8>(), Ok(1..=38) | Ok(97) | Ok(99));

    if !valid {
        return Err(ValidationError::invalid_format(
            "state_code",
            "must be a two-digit GST state code",
        ));
    }

    Ok(())
}

/// Light e-mail check: one `@` with text on both sides and a dot in the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format("email", "must be a valid e-mail address"));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in paise.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (complimentary items)
///
/// ## Example
/// ```rust
/// use billbook_core::validation::validate_price;
///
/// assert!(validate_price(45_000).is_ok()); // ₹450.00
/// assert!(validate_price(0).is_ok());
/// assert!(validate_price(-100).is_err());
/// ```
pub fn validate_price(paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::negative("price"));
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::out_of_range("tax_rate", 0, 100));
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ## Example
/// ```rust
/// use billbook_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid_format("id", "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("HAIR-001").is_ok());
        assert!(validate_sku("ABC123").is_ok());
        assert!(validate_sku("masala_chai").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("Paneer Tikka").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
        assert_eq!(
            validate_name("customer name", " ").unwrap_err(),
            ValidationError::required("customer name")
        );
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("9845012345").unwrap(), "9845012345");
        assert_eq!(normalize_phone("+91 98450 12345").unwrap(), "9845012345");
        assert_eq!(normalize_phone("91-9845012345").unwrap(), "9845012345");

        assert!(normalize_phone("").is_err());
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("5845012345").is_err());
        assert!(normalize_phone("98450abcde").is_err());
        assert!(normalize_phone("09845012345").is_err());
    }

    #[test]
    fn test_validate_state_code() {
        assert!(validate_state_code("29").is_ok());
        assert!(validate_state_code("07").is_ok());
        assert!(validate_state_code("97").is_ok());

        assert!(validate_state_code("00").is_err());
        assert!(validate_state_code("7").is_err());
        assert!(validate_state_code("KA").is_err());
        assert!(validate_state_code("45").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("asha@example.in").is_ok());
        assert!(validate_email("asha").is_err());
        assert!(validate_email("@example.in").is_err());
        assert!(validate_email("asha@localhost").is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(1099).is_ok());
        assert!(validate_price(-100).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(2800).is_ok());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}
