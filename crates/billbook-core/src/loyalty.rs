//! # Loyalty Redemption
//!
//! One point is worth one rupee. A redemption is bounded twice:
//!
//! ```text
//! max_redeemable = min(available, floor(grand_total))
//! redeemed       = clamp(requested, 0, max_redeemable)
//! payable        = grand_total − redeemed          (never negative)
//! ```
//!
//! Redemption is a calculation. The customer's balance is only reduced when
//! an invoice is finalized by the invoice store.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, ValidationError};

/// Outcome of applying a redemption request to a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub max_redeemable: i64,
    pub redeemed: i64,
    pub payable_after_redemption: Decimal,
}

/// Applies a redemption request of `requested` points to `grand_total`.
///
/// A negative `requested` is an error. A request above the bound is
/// clamped, matching how the till caps the points field.
///
/// ## Example
/// ```rust
/// use billbook_core::loyalty::redeem;
/// use rust_decimal::Decimal;
///
/// let r = redeem(50, Decimal::from(236), 80).unwrap();
/// assert_eq!(r.redeemed, 50);
/// assert_eq!(r.payable_after_redemption, Decimal::from(186));
/// ```
pub fn redeem(available: i64, grand_total: Decimal, requested: i64) -> CoreResult<Redemption> {
    if requested < 0 {
        return Err(ValidationError::negative("points").into());
    }

    Ok(apply(available, grand_total, requested))
}

/// The bounding rule without input validation; negative requests count as 0.
pub(crate) fn apply(available: i64, grand_total: Decimal, requested: i64) -> Redemption {
    let bill_cap = grand_total.floor().max(Decimal::ZERO).to_i64().unwrap_or(i64::MAX);
    let max_redeemable = available.max(0).min(bill_cap);
    let redeemed = requested.clamp(0, max_redeemable);

    Redemption {
        max_redeemable,
        redeemed,
        payable_after_redemption: grand_total - Decimal::from(redeemed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_scenario_d_clamps_to_balance() {
        let r = redeem(50, Decimal::from(236), 80).unwrap();
        assert_eq!(r.max_redeemable, 50);
        assert_eq!(r.redeemed, 50);
        assert_eq!(r.payable_after_redemption, Decimal::from(186));
    }

    #[test]
    fn test_bounded_by_floor_of_bill() {
        let r = redeem(1_000, Decimal::new(6405, 1), 1_000).unwrap();
        assert_eq!(r.max_redeemable, 640);
        assert_eq!(r.redeemed, 640);
        assert_eq!(r.payable_after_redemption, Decimal::new(5, 1));
    }

    #[test]
    fn test_request_within_bounds_is_kept() {
        let r = redeem(50, Decimal::from(236), 20).unwrap();
        assert_eq!(r.redeemed, 20);
        assert_eq!(r.payable_after_redemption, Decimal::from(216));
    }

    #[test]
    fn test_zero_bill_and_zero_balance() {
        let r = redeem(50, Decimal::ZERO, 10).unwrap();
        assert_eq!(r.redeemed, 0);
        assert_eq!(r.payable_after_redemption, Decimal::ZERO);

        let r = redeem(0, Decimal::from(100), 10).unwrap();
        assert_eq!(r.redeemed, 0);

        let r = redeem(-5, Decimal::from(100), 10).unwrap();
        assert_eq!(r.max_redeemable, 0);
    }

    #[test]
    fn test_negative_request_rejected() {
        let err = redeem(50, Decimal::from(236), -1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_payable_never_negative() {
        for available in [0, 1, 99, 100, 101, 10_000] {
            for requested in [0, 1, 50, 100, 500, i64::MAX] {
                for total in [Decimal::ZERO, Decimal::new(5, 1), Decimal::new(9999, 2), Decimal::from(100)] {
                    let r = redeem(available, total, requested).unwrap();
                    assert!(r.payable_after_redemption >= Decimal::ZERO);
                    assert!(r.redeemed <= available.min(total.floor().to_i64().unwrap()));
                }
            }
        }
    }
}
