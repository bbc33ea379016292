//! # Parsing Boundary
//!
//! Turns untrusted text from forms and JSON bodies into typed, range-checked
//! values. Nothing here coerces: bad input is an error, never `0`.
//!
//! ```text
//!   "₹1,299.50"  ──parse_money──►     Money(129950)
//!   "12.5"       ──parse_discount──►  DiscountRate(1250)
//!   "18%"        ──parse_tax_rate──►  TaxRate(1800)
//!   "3"          ──parse_quantity──►  3
//!   "-2" / "abc" / "1.005"  ──────►   ValidationError
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::{Money, DISPLAY_DECIMALS};
use crate::rates::{DiscountRate, TaxRate};
use crate::validation::ValidationResult;
use crate::MAX_ITEM_QUANTITY;

/// Currency markers accepted in front of an amount. Longest first.
const CURRENCY_PREFIXES: [&str; 4] = ["₹", "INR", "RS.", "RS"];

// =============================================================================
// Numeric Input
// =============================================================================

/// A JSON value that may arrive as `12.5` or `"12.5"`.
///
/// Request bodies use this for every numeric field; the text is then run
/// through the parsers below, so both shapes get identical checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    /// The raw text of the value.
    pub fn as_text(&self) -> String {
        match self {
            NumericInput::Number(n) => n.to_string(),
            NumericInput::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for NumericInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

impl From<i64> for NumericInput {
    fn from(value: i64) -> Self {
        NumericInput::Number(value.into())
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

// =============================================================================
// Decimal Parsing
// =============================================================================

/// Parses a non-negative decimal with at most `max_dp` fractional digits.
///
/// Thousands separators and surrounding whitespace are ignored.
fn parse_decimal(field: &str, input: &str, max_dp: u32) -> ValidationResult<Decimal> {
    let text: String = input
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    if text.is_empty() {
        return Err(ValidationError::required(field));
    }

    if text.starts_with('-') {
        return Err(ValidationError::negative(field));
    }

    let digits = text.strip_prefix('+').unwrap_or(&text);
    let dots = digits.chars().filter(|c| *c == '.').count();
    if dots > 1
        || !digits.chars().any(|c| c.is_ascii_digit())
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '.')
    {
        return Err(ValidationError::invalid_format(field, "must be a number"));
    }

    let value = Decimal::from_str(digits)
        .map_err(|_| ValidationError::invalid_format(field, "must be a number"))?;

    if value.normalize().scale() > max_dp {
        return Err(ValidationError::invalid_format(
            field,
            format!("at most {max_dp} decimal places"),
        ));
    }

    Ok(value)
}

/// Parses a whole, non-negative number.
fn parse_whole(field: &str, input: &str) -> ValidationResult<i64> {
    let text = input.trim();

    if text.is_empty() {
        return Err(ValidationError::required(field));
    }

    if text.starts_with('-') {
        return Err(ValidationError::negative(field));
    }

    let digits = text.strip_prefix('+').unwrap_or(text);
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid_format(field, "must be a whole number"));
    }

    digits
        .parse::<i64>()
        .map_err(|_| ValidationError::out_of_range(field, 0, i64::MAX))
}

fn strip_currency(input: &str) -> &str {
    let trimmed = input.trim();
    for prefix in CURRENCY_PREFIXES {
        if let Some(head) = trimmed.get(..prefix.len()) {
            if head.eq_ignore_ascii_case(prefix) {
                return &trimmed[prefix.len()..];
            }
        }
    }
    trimmed
}

// =============================================================================
// Public Parsers
// =============================================================================

/// Parses a rupee amount into paise.
///
/// ## Example
/// ```rust
/// use billbook_core::parse::parse_money;
///
/// assert_eq!(parse_money("₹1,299.50").unwrap().paise(), 129_950);
/// assert_eq!(parse_money("Rs. 45").unwrap().paise(), 4_500);
/// assert!(parse_money("-10").is_err());
/// assert!(parse_money("12.345").is_err());
/// ```
pub fn parse_money(input: &str) -> ValidationResult<Money> {
    let value = parse_decimal("amount", strip_currency(input), DISPLAY_DECIMALS)?;
    let paise = value
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|paise| paise.to_i64())
        .ok_or_else(|| ValidationError::out_of_range("amount", 0, i64::MAX / 100))?;
    Ok(Money::from_paise(paise))
}

/// Parses a percentage (`"12.5"`, `"18%"`) into basis points within 0..=100%.
pub fn parse_percent(field: &str, input: &str) -> ValidationResult<u32> {
    let text = input.trim();
    let text = text.strip_suffix('%').unwrap_or(text);
    let value = parse_decimal(field, text, 2)?;

    if value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::out_of_range(field, 0, 100));
    }

    (value * Decimal::ONE_HUNDRED)
        .to_u32()
        .ok_or_else(|| ValidationError::out_of_range(field, 0, 100))
}

/// Parses a line discount percentage.
pub fn parse_discount(input: &str) -> ValidationResult<DiscountRate> {
    let bps = parse_percent("discount", input)?;
    DiscountRate::from_bps(bps).map_err(|_| ValidationError::out_of_range("discount", 0, 100))
}

/// Parses a GST rate percentage.
pub fn parse_tax_rate(input: &str) -> ValidationResult<TaxRate> {
    parse_percent("tax_rate", input).map(TaxRate::from_bps)
}

/// Parses a line quantity. `0` is allowed and means "remove the line".
///
/// ## Example
/// ```rust
/// use billbook_core::parse::parse_quantity;
///
/// assert_eq!(parse_quantity(" 3 ").unwrap(), 3);
/// assert_eq!(parse_quantity("0").unwrap(), 0);
/// assert!(parse_quantity("-1").is_err());
/// assert!(parse_quantity("1.5").is_err());
/// ```
pub fn parse_quantity(input: &str) -> ValidationResult<i64> {
    let qty = parse_whole("quantity", input)?;
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::out_of_range("quantity", 0, MAX_ITEM_QUANTITY));
    }
    Ok(qty)
}

/// Parses a loyalty point count.
pub fn parse_points(input: &str) -> ValidationResult<i64> {
    parse_whole("points", input)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money_accepts() {
        let cases = [
            ("100", 10_000),
            ("100.5", 10_050),
            ("0.05", 5),
            ("₹1,299.50", 129_950),
            ("₹ 450", 45_000),
            ("Rs.45", 4_500),
            ("rs 45.00", 4_500),
            ("INR 1,00,000", 10_000_000),
            ("  12.10  ", 1_210),
            ("0", 0),
        ];
        for (input, paise) in cases {
            assert_eq!(parse_money(input).unwrap().paise(), paise, "input {input:?}");
        }
    }

    #[test]
    fn test_parse_money_rejects() {
        for input in ["", "   ", "₹", "-10", "₹-10", "abc", "12.345", "1.2.3", "NaN", "1e3"] {
            assert!(parse_money(input).is_err(), "input {input:?} should fail");
        }
        assert_eq!(
            parse_money("-10").unwrap_err(),
            ValidationError::negative("amount")
        );
    }

    #[test]
    fn test_parse_money_rejects_oversized_amounts() {
        let too_large = ValidationError::out_of_range("amount", 0, i64::MAX / 100);
        // Largest Decimal: scaling to paise overflows
        assert_eq!(parse_money("79228162514264337593543950335").unwrap_err(), too_large);
        // Fits a Decimal, not an i64 of paise
        assert_eq!(parse_money("1000000000000000000").unwrap_err(), too_large);
    }

    #[test]
    fn test_trailing_zeros_do_not_count_as_precision() {
        assert_eq!(parse_money("12.5000").unwrap().paise(), 1_250);
    }

    #[test]
    fn test_parse_discount() {
        assert_eq!(parse_discount("0").unwrap().bps(), 0);
        assert_eq!(parse_discount("10").unwrap().bps(), 1000);
        assert_eq!(parse_discount("12.5%").unwrap().bps(), 1250);
        assert_eq!(parse_discount("100").unwrap().bps(), 10_000);

        assert!(parse_discount("100.01").is_err());
        assert!(parse_discount("150").is_err());
        assert!(parse_discount("-5").is_err());
        assert!(parse_discount("ten").is_err());
    }

    #[test]
    fn test_parse_tax_rate() {
        assert_eq!(parse_tax_rate("18").unwrap(), TaxRate::GST_18);
        assert_eq!(parse_tax_rate("5%").unwrap(), TaxRate::GST_5);
        assert!(parse_tax_rate("101").is_err());
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("1").unwrap(), 1);
        assert_eq!(parse_quantity("+2").unwrap(), 2);
        assert_eq!(parse_quantity("0").unwrap(), 0);

        assert!(parse_quantity("").is_err());
        assert!(parse_quantity("-1").is_err());
        assert!(parse_quantity("2.0").is_err());
        assert!(parse_quantity("two").is_err());
        assert!(parse_quantity("1000000").is_err());
    }

    #[test]
    fn test_parse_points() {
        assert_eq!(parse_points("80").unwrap(), 80);
        assert_eq!(parse_points("-1").unwrap_err(), ValidationError::negative("points"));
        assert!(parse_points("99999999999999999999999").is_err());
    }

    #[test]
    fn test_numeric_input_accepts_both_shapes() {
        let n: NumericInput = serde_json::from_str("12.5").unwrap();
        let s: NumericInput = serde_json::from_str("\"12.5\"").unwrap();
        assert_eq!(parse_discount(&n.as_text()).unwrap(), parse_discount(&s.as_text()).unwrap());

        let q: NumericInput = serde_json::from_str("3").unwrap();
        assert_eq!(parse_quantity(&q.as_text()).unwrap(), 3);
    }
}
