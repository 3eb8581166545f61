//! Full-width arithmetic helpers over 256-bit integers.
//!
//! Reserves are bounded to 112 bits, but their products and the
//! fee-scaled invariant comparison need up to 244 bits, so the engine
//! widens to [`U256`] for every product and narrows back only when the
//! result is proven to fit.

use alloy_primitives::U256;

use crate::error::{AmmError, Result};

/// The product `a * b` as a 256-bit integer. Cannot overflow.
#[must_use]
pub fn wide_mul(a: u128, b: u128) -> U256 {
    U256::from(a) * U256::from(b)
}

/// The low 128 bits of `v`, discarding the high half.
///
/// Used only where wrapping truncation is intended (price
/// accumulation).
#[must_use]
pub fn low_u128(v: U256) -> u128 {
    let limbs = v.as_limbs();
    (u128::from(limbs[1]) << 64) | u128::from(limbs[0])
}

/// Narrows `v` to `u128`.
///
/// # Errors
///
/// Returns [`AmmError::Overflow`] if `v` does not fit.
pub fn to_u128(v: U256) -> Result<u128> {
    if v > U256::from(u128::MAX) {
        return Err(AmmError::Overflow("narrowing 256-bit value"));
    }
    Ok(low_u128(v))
}

/// Integer square root of a 256-bit value (Newton's method), rounding
/// down.
#[must_use]
pub fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return U256::ZERO;
    }
    let two = U256::from(2u8);
    let mut x = n;
    let mut y = (x + U256::from(1u8)) / two;
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}
