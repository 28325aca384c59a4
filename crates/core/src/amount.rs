//! Fixed-point amount arithmetic.
//!
//! Ledger balances are integer base units scaled by `10^decimals` of their
//! asset. Every decision compares raw U256 base units; conversion to f64
//! exists for display and logging only.

use alloy::primitives::U256;

/// Pre-computed powers of 10 for fast decimal conversion
const POW10: [u128; 39] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
    100_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000,
    1_000_000_000_000_000_000_000_000_000_000_000_000,
    10_000_000_000_000_000_000_000_000_000_000_000_000,
    100_000_000_000_000_000_000_000_000_000_000_000_000,
];

/// Precision divisor `10^decimals` (table lookup up to 10^38).
#[inline(always)]
pub fn pow10(exp: u8) -> U256 {
    if exp < 39 {
        U256::from(POW10[exp as usize])
    } else {
        U256::from(10u64).pow(U256::from(exp))
    }
}

/// Scale a base-unit amount to a human-readable value.
/// Use only for display/logging, never in a comparison.
///
/// Example: to_display(1_500_000, 6) = 1.5
#[inline(always)]
pub fn to_display(amount: U256, decimals: u8) -> f64 {
    let precision = pow10(decimals);
    let whole = amount / precision;
    let fraction = amount % precision;
    u256_to_f64(whole) + u256_to_f64(fraction) / u256_to_f64(precision)
}

/// Lossy U256 -> f64 conversion.
#[inline(always)]
fn u256_to_f64(value: U256) -> f64 {
    if value <= U256::from(u128::MAX) {
        let v: u128 = value.to();
        v as f64
    } else {
        value
            .as_limbs()
            .iter()
            .rev()
            .fold(0.0, |acc, limb| acc * (u64::MAX as f64 + 1.0) + *limb as f64)
    }
}

/// Proportional share: `(amount * numerator) / denominator`, truncating.
///
/// Multiplies first to keep precision. Returns `None` when the denominator
/// is zero or the product overflows.
#[inline(always)]
pub fn mul_div(amount: U256, numerator: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    amount.checked_mul(numerator).map(|product| product / denominator)
}

/// Safe maximum of two U256 values
#[inline(always)]
pub fn max(a: U256, b: U256) -> U256 {
    if a > b {
        a
    } else {
        b
    }
}
