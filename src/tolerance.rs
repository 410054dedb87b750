//! The tolerance evaluator (C6): accepts or rejects a materialized spend
//! against a `[min, max]` window on residual over/undershoot.

use crate::decimal::{Decimal, CANONICAL_SCALE};
use crate::error::Result;
use crate::money::Money;
use crate::request::ToleranceWindow;
use std::cmp::Ordering;

/// The observed `|actual - requested| / requested` residual, at canonical
/// scale, that a materialized spend produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecimalTolerance(Decimal);

impl DecimalTolerance {
    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Evaluates `actual` spend against `requested` spend and `window`.
/// `requested` and `actual` must be denominated in the same currency.
///
/// Returns `Ok(None)` when the spend falls outside the window (rejected,
/// not an error); `Ok(Some(tolerance))` when accepted.
pub fn evaluate(
    requested: &Money,
    actual: &Money,
    window: &ToleranceWindow,
) -> Result<Option<DecimalTolerance>> {
    let residual = if requested.amount().is_zero() {
        if actual.amount().is_zero() {
            Decimal::zero().with_scale(CANONICAL_SCALE)?
        } else {
            Decimal::one().with_scale(CANONICAL_SCALE)?
        }
    } else {
        let diff = if actual.amount().cmp_value(&requested.amount()) == Ordering::Less {
            requested.amount().sub(&actual.amount(), CANONICAL_SCALE)?
        } else {
            actual.amount().sub(&requested.amount(), CANONICAL_SCALE)?
        };
        diff.div(&requested.amount(), CANONICAL_SCALE)?
    };

    let underspent = actual.amount().cmp_value(&requested.amount()) == Ordering::Less;
    let overspent = actual.amount().cmp_value(&requested.amount()) == Ordering::Greater;

    if underspent && residual.cmp_value(&window.min()) == Ordering::Greater {
        return Ok(None);
    }
    if overspent && residual.cmp_value(&window.max()) == Ordering::Greater {
        return Ok(None);
    }

    Ok(Some(DecimalTolerance(residual)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Currency;
    use crate::test_support::cur;

    fn usd() -> Currency {
        cur("USD")
    }
    fn money(amount: &str) -> Money {
        crate::test_support::money(amount, usd())
    }
    fn window(min: &str, max: &str) -> ToleranceWindow {
        ToleranceWindow::new(Decimal::parse(min).unwrap(), Decimal::parse(max).unwrap()).unwrap()
    }

    #[test]
    fn exact_spend_is_zero_residual() {
        let result = evaluate(&money("100"), &money("100"), &window("0", "0.05")).unwrap();
        assert!(result.unwrap().value().is_zero());
    }

    #[test]
    fn overspend_beyond_max_is_rejected() {
        let result = evaluate(&money("100"), &money("112"), &window("0", "0.10")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn underspend_within_min_is_accepted() {
        let result = evaluate(&money("100"), &money("98"), &window("0.05", "0.10")).unwrap();
        assert!(result.is_some());
    }

    #[test]
    fn zero_requested_with_zero_actual_has_zero_residual() {
        let zero = Money::new(Decimal::zero(), usd()).unwrap();
        let result = evaluate(&zero, &zero, &window("0", "0")).unwrap();
        assert!(result.unwrap().value().is_zero());
    }

    #[test]
    fn zero_requested_with_nonzero_actual_is_full_residual_and_rejected_by_max_zero() {
        let zero = Money::new(Decimal::zero(), usd()).unwrap();
        let result = evaluate(&zero, &money("1"), &window("0", "0")).unwrap();
        assert!(result.is_none());
    }
}
