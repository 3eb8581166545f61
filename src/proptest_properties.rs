//! Property-based tests for the engine's core guarantees.
//!
//! 1. **Output bound** — a priced output never reaches the output
//!    reserve.
//! 2. **Fee monotonicity** — pricing an output back to an input never
//!    favors the trader.
//! 3. **Invariant preservation** — executed swaps never decrease the
//!    reserve product.
//! 4. **First-mint accounting** — minted plus locked shares equal the
//!    square root of the deposit product.
//! 5. **Liquidity conservation** — deposit-then-withdraw never returns
//!    more than was deposited.
//! 6. **Addressing symmetry** — pool identities ignore argument order.

#![allow(clippy::panic)]

use proptest::prelude::*;

use crate::addressing;
use crate::config::ExchangeConfig;
use crate::constants::MINIMUM_LOCKED_SHARES;
use crate::domain::{Address, Amount};
use crate::error::AmmError;
use crate::exchange::Exchange;
use crate::ledger::InMemoryLedger;
use crate::math;

const ASSET_A: Address = Address::from_bytes([1u8; 32]);
const ASSET_B: Address = Address::from_bytes([2u8; 32]);
const ALICE: Address = Address::from_bytes([10u8; 32]);
const BOB: Address = Address::from_bytes([11u8; 32]);

/// Exchange with the A/B pool seeded at the given reserves.
fn seeded_exchange(reserve_a: u128, reserve_b: u128) -> (Exchange, Address) {
    let Ok(config) = ExchangeConfig::new(Address::from_bytes([9u8; 32]), 1_000) else {
        panic!("valid config");
    };
    let mut ledger = InMemoryLedger::new(Address::from_bytes([100u8; 32]));
    ledger.credit(ASSET_A, ALICE, Amount::new(u128::MAX >> 16));
    ledger.credit(ASSET_B, ALICE, Amount::new(u128::MAX >> 16));
    ledger.credit(ASSET_A, BOB, Amount::new(u128::MAX >> 16));
    ledger.credit(ASSET_B, BOB, Amount::new(u128::MAX >> 16));
    let mut ex = Exchange::new(config, ledger);
    let Ok(pool) = ex.create_pool(ASSET_A, ASSET_B) else {
        panic!("create failed");
    };
    let Ok(()) = ex.transfer_asset(ALICE, ASSET_A, pool, Amount::new(reserve_a)) else {
        panic!("fund failed");
    };
    let Ok(()) = ex.transfer_asset(ALICE, ASSET_B, pool, Amount::new(reserve_b)) else {
        panic!("fund failed");
    };
    let Ok(_) = ex.deposit_liquidity(pool, ALICE) else {
        panic!("seed deposit failed");
    };
    (ex, pool)
}

proptest! {
    // -- pure quote math ----------------------------------------------------

    #[test]
    fn output_stays_below_output_reserve(
        amount_in in 1u128..=1_000_000_000_000,
        reserve_in in 1u128..=1_000_000_000_000,
        reserve_out in 1u128..=1_000_000_000_000,
    ) {
        let Ok(out) = math::amount_out(
            Amount::new(amount_in),
            Amount::new(reserve_in),
            Amount::new(reserve_out),
        ) else {
            panic!("quote failed on valid inputs");
        };
        prop_assert!(out.get() < reserve_out);
    }

    #[test]
    fn round_trip_input_never_shrinks(
        amount_in in 1u128..=1_000_000_000,
        reserve_in in 1_000u128..=1_000_000_000_000,
        reserve_out in 1_000u128..=1_000_000_000_000,
    ) {
        let Ok(out) = math::amount_out(
            Amount::new(amount_in),
            Amount::new(reserve_in),
            Amount::new(reserve_out),
        ) else {
            panic!("quote failed on valid inputs");
        };
        // A dust-sized trade can price to zero output; there is nothing
        // to invert in that case.
        prop_assume!(!out.is_zero());
        let Ok(back) = math::amount_in(
            out,
            Amount::new(reserve_in),
            Amount::new(reserve_out),
        ) else {
            panic!("inverse quote failed");
        };
        prop_assert!(back.get() <= amount_in);
    }

    #[test]
    fn quote_is_ratio_preserving(
        amount in 1u128..=1_000_000_000,
        reserve_a in 1u128..=1_000_000_000_000,
        reserve_b in 1u128..=1_000_000_000_000,
    ) {
        let Ok(quoted) = math::quote(
            Amount::new(amount),
            Amount::new(reserve_a),
            Amount::new(reserve_b),
        ) else {
            panic!("quote failed on valid inputs");
        };
        // Floor of amount * reserve_b / reserve_a, by definition.
        let expected = (amount * reserve_b) / reserve_a;
        prop_assert_eq!(quoted.get(), expected);
    }

    // -- executed swaps -----------------------------------------------------

    #[test]
    fn executed_swap_preserves_reserve_product(
        reserve_a in 10_000u128..=1_000_000_000,
        reserve_b in 10_000u128..=1_000_000_000,
        amount_in in 1_000u128..=10_000_000,
    ) {
        let (mut ex, pool) = seeded_exchange(reserve_a, reserve_b);
        let Ok(out) = math::amount_out(
            Amount::new(amount_in),
            Amount::new(reserve_a),
            Amount::new(reserve_b),
        ) else {
            panic!("quote failed");
        };
        prop_assume!(!out.is_zero());

        let Ok(()) = ex.transfer_asset(BOB, ASSET_A, pool, Amount::new(amount_in)) else {
            panic!("fund failed");
        };
        let Ok(()) = ex.swap(BOB, pool, Amount::ZERO, out, BOB, &[], None) else {
            panic!("swap at the quoted output must succeed");
        };

        let Ok((r_a, r_b, _)) = ex.get_reserves(pool) else {
            panic!("reserves");
        };
        let k_before = math::wide_mul(reserve_a, reserve_b);
        let k_after = math::wide_mul(r_a.get(), r_b.get());
        prop_assert!(k_after >= k_before);
    }

    #[test]
    fn quoted_output_plus_one_is_rejected(
        reserve_a in 10_000u128..=1_000_000_000,
        reserve_b in 10_000u128..=1_000_000_000,
        amount_in in 1_000u128..=10_000_000,
    ) {
        let (mut ex, pool) = seeded_exchange(reserve_a, reserve_b);
        let Ok(out) = math::amount_out(
            Amount::new(amount_in),
            Amount::new(reserve_b),
            Amount::new(reserve_a),
        ) else {
            panic!("quote failed");
        };
        // Trade B -> A this time; taking one unit above the quote must
        // violate the fee-adjusted invariant.
        prop_assume!(out.get() + 1 < reserve_a);
        let Ok(()) = ex.transfer_asset(BOB, ASSET_B, pool, Amount::new(amount_in)) else {
            panic!("fund failed");
        };
        let result = ex.swap(
            BOB,
            pool,
            Amount::new(out.get() + 1),
            Amount::ZERO,
            BOB,
            &[],
            None,
        );
        prop_assert_eq!(result, Err(crate::error::AmmError::KInvariantViolation));
    }

    // -- liquidity ----------------------------------------------------------

    #[test]
    fn first_mint_accounts_for_locked_shares(
        amount_a in 2_000u128..=1_000_000_000,
        amount_b in 2_000u128..=1_000_000_000,
    ) {
        let (ex, pool) = seeded_exchange(amount_a, amount_b);
        let Ok(p) = ex.pool(pool) else {
            panic!("pool");
        };
        let root = math::low_u128(math::isqrt(math::wide_mul(amount_a, amount_b)));
        prop_assert_eq!(p.total_shares().get(), root);
        prop_assert_eq!(
            p.share_balance_of(ALICE).get(),
            root - MINIMUM_LOCKED_SHARES
        );
    }

    #[test]
    fn deposit_withdraw_round_trip_is_bounded(
        reserve_a in 10_000u128..=1_000_000_000,
        reserve_b in 10_000u128..=1_000_000_000,
        deposit_a in 1_000u128..=1_000_000,
    ) {
        let (mut ex, pool) = seeded_exchange(reserve_a, reserve_b);
        // Proportional B for the chosen A, rounded up so A is the
        // binding side.
        let Ok(deposit_b) = math::quote(
            Amount::new(deposit_a),
            Amount::new(reserve_a),
            Amount::new(reserve_b),
        ) else {
            panic!("quote failed");
        };
        prop_assume!(!deposit_b.is_zero());

        let Ok(()) = ex.transfer_asset(BOB, ASSET_A, pool, Amount::new(deposit_a)) else {
            panic!("fund failed");
        };
        let Ok(()) = ex.transfer_asset(BOB, ASSET_B, pool, deposit_b) else {
            panic!("fund failed");
        };
        let Ok(minted) = ex.deposit_liquidity(pool, BOB) else {
            panic!("deposit failed");
        };

        let Ok(()) = ex.transfer_shares(BOB, pool, pool, minted) else {
            panic!("share move failed");
        };
        let (out_a, out_b) = match ex.withdraw_liquidity(pool, BOB) {
            Ok(amounts) => amounts,
            // A dust position can round a payout to zero; the engine
            // rejects the redemption and nothing comes back, which
            // respects the bound trivially.
            Err(AmmError::InsufficientLiquidityBurned) => return Ok(()),
            Err(other) => panic!("withdraw failed: {other}"),
        };
        prop_assert!(out_a.get() <= deposit_a);
        prop_assert!(out_b <= deposit_b);
    }

    // -- addressing ---------------------------------------------------------

    #[test]
    fn pool_addresses_ignore_argument_order(
        x in any::<[u8; 32]>(),
        y in any::<[u8; 32]>(),
        registry in any::<[u8; 32]>(),
    ) {
        let x = Address::from_bytes(x);
        let y = Address::from_bytes(y);
        let registry = Address::from_bytes(registry);
        prop_assume!(x != y && !x.is_zero() && !y.is_zero() && !registry.is_zero());
        let Ok(forward) = addressing::pool_address(registry, x, y) else {
            panic!("derivation failed");
        };
        let Ok(reverse) = addressing::pool_address(registry, y, x) else {
            panic!("derivation failed");
        };
        prop_assert_eq!(forward, reverse);
    }
}
