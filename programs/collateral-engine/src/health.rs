//! Health factor calculation
//!
//! Pure function of a position's debt and collateral value. Only half of
//! the collateral value counts toward solvency, which is what makes every
//! position over-collateralized while it remains healthy.

use crate::constants::{
    LIQUIDATION_PRECISION, LIQUIDATION_THRESHOLD, MIN_HEALTH_FACTOR, PRECISION,
};
use crate::math::mul_div_saturating;

/// Health factor of a position, 18-decimal fixed point
///
/// A position with no debt is infinitely solvent and reports the maximum
/// representable value.
pub fn health_factor(total_debt: u128, collateral_usd: u128) -> u128 {
    if total_debt == 0 {
        return u128::MAX;
    }
    let adjusted =
        mul_div_saturating(collateral_usd, LIQUIDATION_THRESHOLD, LIQUIDATION_PRECISION);
    mul_div_saturating(adjusted, PRECISION, total_debt)
}

/// Whether a health factor satisfies the solvency minimum
pub fn is_healthy(factor: u128) -> bool {
    factor >= MIN_HEALTH_FACTOR
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_debt_is_infinitely_solvent() {
        assert_eq!(health_factor(0, 0), u128::MAX);
        assert_eq!(health_factor(0, 123 * PRECISION), u128::MAX);
    }

    #[test]
    fn test_scenario_values() {
        // $20000 collateral against 100 debt units: factor 100
        let hf = health_factor(100 * PRECISION, 20_000 * PRECISION);
        assert_eq!(hf, 100 * PRECISION);
        assert!(is_healthy(hf));

        // Price crash leaves $180 collateral: factor 0.9
        let hf = health_factor(100 * PRECISION, 180 * PRECISION);
        assert_eq!(hf, 9 * PRECISION / 10);
        assert!(!is_healthy(hf));
    }

    #[test]
    fn test_boundary_exactly_one() {
        // $200 collateral against 100 debt: exactly the minimum
        let hf = health_factor(100 * PRECISION, 200 * PRECISION);
        assert_eq!(hf, MIN_HEALTH_FACTOR);
        assert!(is_healthy(hf));
    }

    #[test]
    fn test_huge_ratio_saturates() {
        assert_eq!(health_factor(1, u128::MAX / 2), u128::MAX);
    }
}
