//! Fee-adjusted swap pricing and proportional-deposit quoting.
//!
//! Pure functions shared by the pool engine and the router. All
//! intermediates widen to 256 bits; rounding always favors the pool:
//! outputs round down, required inputs round up.

use alloy_primitives::U256;

use super::wide::{to_u128, wide_mul};
use crate::constants::{FEE_DENOMINATOR, FEE_NUMERATOR};
use crate::domain::Amount;
use crate::error::{AmmError, Result};

/// Proportional quote: the amount of asset B matching `amount_a` at the
/// current reserve ratio, `⌊amount_a · reserve_b / reserve_a⌋`.
///
/// # Errors
///
/// - [`AmmError::InsufficientAmount`] if `amount_a` is zero.
/// - [`AmmError::InsufficientLiquidity`] if either reserve is zero.
pub fn quote(amount_a: Amount, reserve_a: Amount, reserve_b: Amount) -> Result<Amount> {
    if amount_a.is_zero() {
        return Err(AmmError::InsufficientAmount);
    }
    if reserve_a.is_zero() || reserve_b.is_zero() {
        return Err(AmmError::InsufficientLiquidity);
    }
    let n = wide_mul(amount_a.get(), reserve_b.get()) / U256::from(reserve_a.get());
    Ok(Amount::new(to_u128(n)?))
}

/// Maximum output for a given input after the 0.3% input-side fee:
/// `⌊997 · in · reserve_out / (1000 · reserve_in + 997 · in)⌋`.
///
/// The result is strictly less than `reserve_out` for all valid inputs.
///
/// # Errors
///
/// - [`AmmError::InsufficientInputAmount`] if `amount_in` is zero.
/// - [`AmmError::InsufficientLiquidity`] if either reserve is zero.
pub fn amount_out(amount_in: Amount, reserve_in: Amount, reserve_out: Amount) -> Result<Amount> {
    if amount_in.is_zero() {
        return Err(AmmError::InsufficientInputAmount);
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(AmmError::InsufficientLiquidity);
    }
    let in_with_fee = wide_mul(amount_in.get(), FEE_NUMERATOR);
    let numerator = in_with_fee * U256::from(reserve_out.get());
    let denominator = wide_mul(reserve_in.get(), FEE_DENOMINATOR) + in_with_fee;
    Ok(Amount::new(to_u128(numerator / denominator)?))
}

/// Minimum input for a given output, rounded up so the fee-adjusted
/// invariant can never fail by an off-by-one shortfall:
/// `⌊1000 · reserve_in · out / (997 · (reserve_out − out))⌋ + 1`.
///
/// # Errors
///
/// - [`AmmError::InsufficientOutputAmount`] if `amount_out` is zero.
/// - [`AmmError::InsufficientLiquidity`] if either reserve is zero or the
///   requested output does not leave the output reserve positive.
pub fn amount_in(amount_out: Amount, reserve_in: Amount, reserve_out: Amount) -> Result<Amount> {
    if amount_out.is_zero() {
        return Err(AmmError::InsufficientOutputAmount);
    }
    if reserve_in.is_zero() || reserve_out.is_zero() || amount_out >= reserve_out {
        return Err(AmmError::InsufficientLiquidity);
    }
    let numerator = wide_mul(reserve_in.get(), FEE_DENOMINATOR) * U256::from(amount_out.get());
    let denominator = wide_mul(reserve_out.get() - amount_out.get(), FEE_NUMERATOR);
    let floor = to_u128(numerator / denominator)?;
    floor
        .checked_add(1)
        .map(Amount::new)
        .ok_or(AmmError::Overflow("required input"))
}

/// Propagates an input forward across a path of hops, returning the full
/// amounts vector `[amount_in, out_1, …, out_n]`.
///
/// `hops[i]` holds `(reserve_in, reserve_out)` oriented in trade
/// direction for hop `i`; a path of `n ≥ 2` assets has `n − 1` hops.
///
/// # Errors
///
/// - [`AmmError::InvalidPath`] if `hops` is empty.
/// - Any error from [`amount_out`] on an individual hop.
pub fn amounts_out(amount_in: Amount, hops: &[(Amount, Amount)]) -> Result<Vec<Amount>> {
    if hops.is_empty() {
        return Err(AmmError::InvalidPath);
    }
    let mut amounts = Vec::with_capacity(hops.len() + 1);
    amounts.push(amount_in);
    for &(reserve_in, reserve_out) in hops {
        let prev = amounts[amounts.len() - 1];
        amounts.push(amount_out(prev, reserve_in, reserve_out)?);
    }
    Ok(amounts)
}

/// Propagates a desired output backward across a path of hops, returning
/// the full amounts vector `[in_1, …, amount_out]`.
///
/// Same orientation convention as [`amounts_out`].
///
/// # Errors
///
/// - [`AmmError::InvalidPath`] if `hops` is empty.
/// - Any error from [`amount_in`] on an individual hop.
pub fn amounts_in(amount_out: Amount, hops: &[(Amount, Amount)]) -> Result<Vec<Amount>> {
    if hops.is_empty() {
        return Err(AmmError::InvalidPath);
    }
    let mut amounts = vec![Amount::ZERO; hops.len() + 1];
    amounts[hops.len()] = amount_out;
    for (i, &(reserve_in, reserve_out)) in hops.iter().enumerate().rev() {
        amounts[i] = amount_in(amounts[i + 1], reserve_in, reserve_out)?;
    }
    Ok(amounts)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn amt(v: u128) -> Amount {
        Amount::new(v)
    }

    // -- quote --------------------------------------------------------------

    #[test]
    fn quote_proportional() {
        let Ok(q) = quote(amt(1_000), amt(10_000), amt(20_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(q, amt(2_000));
    }

    #[test]
    fn quote_rounds_down() {
        let Ok(q) = quote(amt(1), amt(3), amt(2)) else {
            panic!("expected Ok");
        };
        assert_eq!(q, amt(0));
    }

    #[test]
    fn quote_rejects_zeroes() {
        assert_eq!(
            quote(amt(0), amt(1), amt(1)),
            Err(AmmError::InsufficientAmount)
        );
        assert_eq!(
            quote(amt(1), amt(0), amt(1)),
            Err(AmmError::InsufficientLiquidity)
        );
        assert_eq!(
            quote(amt(1), amt(1), amt(0)),
            Err(AmmError::InsufficientLiquidity)
        );
    }

    // -- amount_out ---------------------------------------------------------

    #[test]
    fn amount_out_reference_vector() {
        // 997 * 1000 * 10000 / (10000 * 1000 + 997 * 1000) = 906 (floor)
        let Ok(out) = amount_out(amt(1_000), amt(10_000), amt(10_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(out, amt(906));
    }

    #[test]
    fn amount_out_never_drains_reserve() {
        // Even an enormous input cannot extract the full output reserve.
        let Ok(out) = amount_out(amt(u128::MAX >> 16), amt(1_000), amt(1_000)) else {
            panic!("expected Ok");
        };
        assert!(out < amt(1_000));
    }

    #[test]
    fn amount_out_rejects_zeroes() {
        assert_eq!(
            amount_out(amt(0), amt(1), amt(1)),
            Err(AmmError::InsufficientInputAmount)
        );
        assert_eq!(
            amount_out(amt(1), amt(0), amt(1)),
            Err(AmmError::InsufficientLiquidity)
        );
    }

    // -- amount_in ----------------------------------------------------------

    #[test]
    fn amount_in_reference_vector() {
        // Inverse of the 906-out vector: the required input is the
        // original 1000 (the +1 compensates the floor on the way out).
        let Ok(input) = amount_in(amt(906), amt(10_000), amt(10_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(input, amt(1_000));
    }

    #[test]
    fn amount_in_rejects_draining_output_reserve() {
        assert_eq!(
            amount_in(amt(1_000), amt(1_000), amt(1_000)),
            Err(AmmError::InsufficientLiquidity)
        );
        assert_eq!(
            amount_in(amt(1_001), amt(1_000), amt(1_000)),
            Err(AmmError::InsufficientLiquidity)
        );
    }

    #[test]
    fn amount_in_rejects_zero_output() {
        assert_eq!(
            amount_in(amt(0), amt(1_000), amt(1_000)),
            Err(AmmError::InsufficientOutputAmount)
        );
    }

    #[test]
    fn round_trip_never_favors_trader() {
        for input in [10u128, 997, 1_000, 123_456, 5_000_000] {
            let Ok(out) = amount_out(amt(input), amt(10_000_000), amt(30_000_000)) else {
                panic!("expected Ok");
            };
            let Ok(back) = amount_in(out, amt(10_000_000), amt(30_000_000)) else {
                panic!("expected Ok");
            };
            assert!(back <= amt(input), "input {input}: {back} > {input}");
        }
    }

    // -- path folds ---------------------------------------------------------

    #[test]
    fn amounts_out_folds_forward() {
        let hops = [(amt(10_000), amt(10_000)), (amt(10_000), amt(10_000))];
        let Ok(amounts) = amounts_out(amt(1_000), &hops) else {
            panic!("expected Ok");
        };
        assert_eq!(amounts.len(), 3);
        assert_eq!(amounts[0], amt(1_000));
        assert_eq!(amounts[1], amt(906));
        // Second hop prices 906 in on fresh 10000/10000 reserves.
        let Ok(expected) = amount_out(amt(906), amt(10_000), amt(10_000)) else {
            panic!("expected Ok");
        };
        assert_eq!(amounts[2], expected);
    }

    #[test]
    fn amounts_in_folds_backward() {
        let hops = [(amt(10_000), amt(10_000)), (amt(10_000), amt(10_000))];
        let Ok(amounts) = amounts_in(amt(800), &hops) else {
            panic!("expected Ok");
        };
        assert_eq!(amounts.len(), 3);
        assert_eq!(amounts[2], amt(800));
        // Forward application of the computed inputs covers the target.
        let Ok(mid) = amount_out(amounts[0], amt(10_000), amt(10_000)) else {
            panic!("expected Ok");
        };
        assert!(mid >= amounts[1]);
    }

    #[test]
    fn empty_path_rejected() {
        assert_eq!(amounts_out(amt(1), &[]), Err(AmmError::InvalidPath));
        assert_eq!(amounts_in(amt(1), &[]), Err(AmmError::InvalidPath));
    }
}
