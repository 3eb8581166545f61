//! Pool state: the data half of the invariant engine.
//!
//! A [`Pool`] owns everything durable about one canonical asset pair:
//! reserves, the price accumulators, the recorded invariant, the share
//! ledger (balances, allowances, permit nonces), and the reentrancy
//! guard. It performs no asset transfers itself — the
//! [`Exchange`](crate::exchange::Exchange) orchestrates those and drives
//! this state through the methods here, so every state transition in this
//! file is local, checked, and free of external calls.

use alloy_primitives::U256;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::constants::{PERMIT_DOMAIN_TAG, PRICE_SCALE, RESERVE_LIMIT};
use crate::domain::{Address, Amount, AssetPair, Shares, Timestamp};
use crate::error::{AmmError, Result};
use crate::math::{low_u128, wide_mul};

/// Reentrancy guard state. `Busy` is held across the borrower callback
/// suspension point, which is exactly when re-entry attempts arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Guard {
    /// No mutating call in progress.
    #[default]
    Idle,
    /// A mutating call holds the pool's exclusive section.
    Busy,
}

/// State of one constant-product pool.
#[derive(Debug, Clone)]
pub struct Pool {
    address: Address,
    registry: Address,
    pair: Option<AssetPair>,
    reserve_a: Amount,
    reserve_b: Amount,
    last_update: Timestamp,
    price_a_cumulative: u128,
    price_b_cumulative: u128,
    invariant_last: U256,
    total_shares: Shares,
    balances: BTreeMap<Address, Shares>,
    allowances: BTreeMap<(Address, Address), Shares>,
    nonces: BTreeMap<Address, u64>,
    guard: Guard,
}

impl Pool {
    /// Creates an uninitialized pool bound to its creating registry.
    #[must_use]
    pub fn new(address: Address, registry: Address) -> Self {
        Self {
            address,
            registry,
            pair: None,
            reserve_a: Amount::ZERO,
            reserve_b: Amount::ZERO,
            last_update: Timestamp::default(),
            price_a_cumulative: 0,
            price_b_cumulative: 0,
            invariant_last: U256::ZERO,
            total_shares: Shares::ZERO,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            nonces: BTreeMap::new(),
            guard: Guard::Idle,
        }
    }

    /// One-time binding of the asset pair, restricted to the registry.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Forbidden`] if `caller` is not the creating registry
    ///   or the pool is already initialized.
    pub fn initialize(&mut self, caller: Address, pair: AssetPair) -> Result<()> {
        if caller != self.registry {
            return Err(AmmError::Forbidden("only the registry may initialize"));
        }
        if self.pair.is_some() {
            return Err(AmmError::Forbidden("pool is already initialized"));
        }
        self.pair = Some(pair);
        Ok(())
    }

    // -- identity -----------------------------------------------------------

    /// The pool's own identity.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// The canonical asset pair.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Forbidden`] on an uninitialized pool; the
    /// registry initializes every pool it creates, so reaching this error
    /// means the pool was constructed outside the registry.
    pub fn pair(&self) -> Result<AssetPair> {
        self.pair
            .ok_or(AmmError::Forbidden("pool is not initialized"))
    }

    // -- reserves and accumulators ------------------------------------------

    /// Current reserves and the timestamp of the last update.
    #[must_use]
    pub const fn get_reserves(&self) -> (Amount, Amount, Timestamp) {
        (self.reserve_a, self.reserve_b, self.last_update)
    }

    /// Cumulative prices `(price_a, price_b)` at 2^64 fixed-point scale.
    /// Meaningful only as differences between two observations; both wrap
    /// modulo 2^128.
    #[must_use]
    pub const fn price_cumulatives(&self) -> (u128, u128) {
        (self.price_a_cumulative, self.price_b_cumulative)
    }

    /// Reserve product recorded after the last liquidity-affecting
    /// update. Kept for a protocol-fee mechanism that is dormant in this
    /// engine.
    #[must_use]
    pub const fn invariant_last(&self) -> U256 {
        self.invariant_last
    }

    /// The shared reserve/accumulator update routine. Always called with
    /// a pair of fresh balances; reserves and accumulators move together
    /// or not at all.
    ///
    /// Accumulation is skipped when no time has elapsed or a prior
    /// reserve was zero (no defined price).
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::ReserveOverflow`] if either balance exceeds
    /// the 112-bit bound; reserves are left untouched in that case.
    pub fn update(&mut self, balance_a: Amount, balance_b: Amount, now: Timestamp) -> Result<()> {
        if balance_a.get() > RESERVE_LIMIT || balance_b.get() > RESERVE_LIMIT {
            return Err(AmmError::ReserveOverflow);
        }
        let elapsed = now.elapsed_since(self.last_update);
        if elapsed != 0 && !self.reserve_a.is_zero() && !self.reserve_b.is_zero() {
            let elapsed = U256::from(elapsed);
            let price_a = wide_mul(self.reserve_b.get(), PRICE_SCALE)
                / U256::from(self.reserve_a.get())
                * elapsed;
            let price_b = wide_mul(self.reserve_a.get(), PRICE_SCALE)
                / U256::from(self.reserve_b.get())
                * elapsed;
            self.price_a_cumulative = self.price_a_cumulative.wrapping_add(low_u128(price_a));
            self.price_b_cumulative = self.price_b_cumulative.wrapping_add(low_u128(price_b));
        }
        self.reserve_a = balance_a;
        self.reserve_b = balance_b;
        self.last_update = now;
        Ok(())
    }

    /// Records the current reserve product as the last liquidity-epoch
    /// invariant.
    pub fn record_invariant(&mut self) {
        self.invariant_last = wide_mul(self.reserve_a.get(), self.reserve_b.get());
    }

    // -- reentrancy guard ---------------------------------------------------

    /// Enters the pool's exclusive section.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::ReentrantCall`] if the section is already
    /// held.
    pub fn enter(&mut self) -> Result<()> {
        if self.guard == Guard::Busy {
            return Err(AmmError::ReentrantCall);
        }
        self.guard = Guard::Busy;
        Ok(())
    }

    /// Leaves the exclusive section.
    pub fn exit(&mut self) {
        self.guard = Guard::Idle;
    }

    /// Current guard state.
    #[must_use]
    pub const fn guard(&self) -> Guard {
        self.guard
    }

    // -- share ledger -------------------------------------------------------

    /// Total outstanding shares.
    #[must_use]
    pub const fn total_shares(&self) -> Shares {
        self.total_shares
    }

    /// Share balance of `holder`.
    #[must_use]
    pub fn share_balance_of(&self, holder: Address) -> Shares {
        self.balances.get(&holder).copied().unwrap_or(Shares::ZERO)
    }

    /// Remaining allowance from `owner` to `spender`.
    #[must_use]
    pub fn allowance(&self, owner: Address, spender: Address) -> Shares {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(Shares::ZERO)
    }

    /// Current permit nonce of `owner`.
    #[must_use]
    pub fn nonce_of(&self, owner: Address) -> u64 {
        self.nonces.get(&owner).copied().unwrap_or(0)
    }

    /// Mints `value` shares to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::Overflow`] if the total supply would overflow.
    pub fn mint_shares(&mut self, to: Address, value: Shares) -> Result<()> {
        self.total_shares = self
            .total_shares
            .checked_add(value)
            .ok_or(AmmError::Overflow("share supply"))?;
        let balance = self.balances.entry(to).or_insert(Shares::ZERO);
        // Cannot overflow: balance <= total_shares, which just passed.
        *balance = Shares::new(balance.get() + value.get());
        Ok(())
    }

    /// Burns `value` shares from `from`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientShares`] if `from` holds less than
    /// `value`.
    pub fn burn_shares(&mut self, from: Address, value: Shares) -> Result<()> {
        let balance = self.balances.entry(from).or_insert(Shares::ZERO);
        *balance = balance
            .checked_sub(value)
            .ok_or(AmmError::InsufficientShares)?;
        // Supply >= any single balance, so this cannot underflow.
        self.total_shares = Shares::new(self.total_shares.get() - value.get());
        Ok(())
    }

    /// Moves `value` shares from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientShares`] on a short balance.
    pub fn transfer_shares(&mut self, from: Address, to: Address, value: Shares) -> Result<()> {
        let balance = self.balances.entry(from).or_insert(Shares::ZERO);
        *balance = balance
            .checked_sub(value)
            .ok_or(AmmError::InsufficientShares)?;
        let target = self.balances.entry(to).or_insert(Shares::ZERO);
        *target = Shares::new(target.get() + value.get());
        Ok(())
    }

    /// Sets the allowance from `owner` to `spender`.
    pub fn approve(&mut self, owner: Address, spender: Address, value: Shares) {
        self.allowances.insert((owner, spender), value);
    }

    /// Consumes `value` of the allowance from `owner` to `spender`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientAllowance`] if the remaining
    /// allowance is short.
    pub fn spend_allowance(
        &mut self,
        owner: Address,
        spender: Address,
        value: Shares,
    ) -> Result<()> {
        let entry = self
            .allowances
            .entry((owner, spender))
            .or_insert(Shares::ZERO);
        *entry = entry
            .checked_sub(value)
            .ok_or(AmmError::InsufficientAllowance)?;
        Ok(())
    }

    /// Increments `owner`'s permit nonce and returns the consumed value.
    pub fn bump_nonce(&mut self, owner: Address) -> u64 {
        let entry = self.nonces.entry(owner).or_insert(0);
        let used = *entry;
        *entry = entry.wrapping_add(1);
        used
    }

    /// Digest a permit signature must cover: domain tag, this pool's
    /// identity, owner, spender, value, the owner's current nonce, and
    /// the deadline. Binding the nonce makes every digest single-use.
    #[must_use]
    pub fn permit_digest(
        &self,
        owner: Address,
        spender: Address,
        value: Shares,
        deadline: u64,
    ) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(PERMIT_DOMAIN_TAG);
        hasher.update(self.address.as_bytes());
        hasher.update(owner.as_bytes());
        hasher.update(spender.as_bytes());
        hasher.update(value.get().to_be_bytes());
        hasher.update(self.nonce_of(owner).to_be_bytes());
        hasher.update(deadline.to_be_bytes());
        hasher.finalize().into()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::from_bytes([byte; 32])
    }

    fn pair() -> AssetPair {
        let Ok(p) = AssetPair::new(addr(1), addr(2)) else {
            panic!("valid pair");
        };
        p
    }

    fn initialized_pool() -> Pool {
        let mut pool = Pool::new(addr(50), addr(9));
        let Ok(()) = pool.initialize(addr(9), pair()) else {
            panic!("expected Ok");
        };
        pool
    }

    // -- initialize ---------------------------------------------------------

    #[test]
    fn initialize_restricted_to_registry() {
        let mut pool = Pool::new(addr(50), addr(9));
        assert_eq!(
            pool.initialize(addr(3), pair()),
            Err(AmmError::Forbidden("only the registry may initialize"))
        );
        let Ok(()) = pool.initialize(addr(9), pair()) else {
            panic!("expected Ok");
        };
        assert_eq!(
            pool.initialize(addr(9), pair()),
            Err(AmmError::Forbidden("pool is already initialized"))
        );
    }

    #[test]
    fn uninitialized_pair_lookup_fails() {
        let pool = Pool::new(addr(50), addr(9));
        assert!(pool.pair().is_err());
    }

    // -- update routine -----------------------------------------------------

    #[test]
    fn update_sets_reserves_and_time() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.update(
            Amount::new(1_000),
            Amount::new(2_000),
            Timestamp::new(100),
        ) else {
            panic!("expected Ok");
        };
        let (r_a, r_b, at) = pool.get_reserves();
        assert_eq!(r_a, Amount::new(1_000));
        assert_eq!(r_b, Amount::new(2_000));
        assert_eq!(at, Timestamp::new(100));
    }

    #[test]
    fn update_rejects_reserve_overflow() {
        let mut pool = initialized_pool();
        let over = Amount::new(RESERVE_LIMIT + 1);
        assert_eq!(
            pool.update(over, Amount::new(1), Timestamp::new(1)),
            Err(AmmError::ReserveOverflow)
        );
        // Reserves untouched after the rejection.
        let (r_a, _, _) = pool.get_reserves();
        assert_eq!(r_a, Amount::ZERO);
    }

    #[test]
    fn accumulators_integrate_price_times_elapsed() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.update(Amount::new(1_000), Amount::new(3_000), Timestamp::new(10))
        else {
            panic!("expected Ok");
        };
        assert_eq!(pool.price_cumulatives(), (0, 0));

        let Ok(()) = pool.update(Amount::new(1_000), Amount::new(3_000), Timestamp::new(17))
        else {
            panic!("expected Ok");
        };
        let (p_a, p_b) = pool.price_cumulatives();
        // price_a = 3000/1000 = 3, price_b = 1000/3000 = 1/3, elapsed 7.
        assert_eq!(p_a, 3 * PRICE_SCALE * 7);
        assert_eq!(p_b, PRICE_SCALE / 3 * 7);
    }

    #[test]
    fn zero_elapsed_skips_accumulation() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.update(Amount::new(1_000), Amount::new(3_000), Timestamp::new(10))
        else {
            panic!("expected Ok");
        };
        let Ok(()) = pool.update(Amount::new(9_000), Amount::new(9_000), Timestamp::new(10))
        else {
            panic!("expected Ok");
        };
        assert_eq!(pool.price_cumulatives(), (0, 0));
    }

    #[test]
    fn zero_reserves_skip_accumulation() {
        let mut pool = initialized_pool();
        // First funding update: prior reserves are zero, nothing to price.
        let Ok(()) = pool.update(Amount::new(1_000), Amount::new(1_000), Timestamp::new(99))
        else {
            panic!("expected Ok");
        };
        assert_eq!(pool.price_cumulatives(), (0, 0));
    }

    #[test]
    fn record_invariant_tracks_reserve_product() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.update(Amount::new(30), Amount::new(40), Timestamp::new(1)) else {
            panic!("expected Ok");
        };
        pool.record_invariant();
        assert_eq!(pool.invariant_last(), U256::from(1_200u64));
    }

    // -- guard --------------------------------------------------------------

    #[test]
    fn guard_rejects_nested_entry() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.enter() else {
            panic!("expected Ok");
        };
        assert_eq!(pool.enter(), Err(AmmError::ReentrantCall));
        pool.exit();
        let Ok(()) = pool.enter() else {
            panic!("expected Ok");
        };
    }

    // -- share ledger -------------------------------------------------------

    #[test]
    fn mint_burn_round_trip() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.mint_shares(addr(7), Shares::new(500)) else {
            panic!("expected Ok");
        };
        assert_eq!(pool.total_shares(), Shares::new(500));
        assert_eq!(pool.share_balance_of(addr(7)), Shares::new(500));

        let Ok(()) = pool.burn_shares(addr(7), Shares::new(200)) else {
            panic!("expected Ok");
        };
        assert_eq!(pool.total_shares(), Shares::new(300));
        assert_eq!(pool.share_balance_of(addr(7)), Shares::new(300));
    }

    #[test]
    fn burn_rejects_short_balance() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.mint_shares(addr(7), Shares::new(100)) else {
            panic!("expected Ok");
        };
        assert_eq!(
            pool.burn_shares(addr(7), Shares::new(101)),
            Err(AmmError::InsufficientShares)
        );
    }

    #[test]
    fn transfer_shares_moves_balance() {
        let mut pool = initialized_pool();
        let Ok(()) = pool.mint_shares(addr(7), Shares::new(100)) else {
            panic!("expected Ok");
        };
        let Ok(()) = pool.transfer_shares(addr(7), addr(8), Shares::new(60)) else {
            panic!("expected Ok");
        };
        assert_eq!(pool.share_balance_of(addr(7)), Shares::new(40));
        assert_eq!(pool.share_balance_of(addr(8)), Shares::new(60));
        assert_eq!(pool.total_shares(), Shares::new(100));
    }

    #[test]
    fn allowance_spend_and_exhaustion() {
        let mut pool = initialized_pool();
        pool.approve(addr(7), addr(8), Shares::new(50));
        assert_eq!(pool.allowance(addr(7), addr(8)), Shares::new(50));
        let Ok(()) = pool.spend_allowance(addr(7), addr(8), Shares::new(30)) else {
            panic!("expected Ok");
        };
        assert_eq!(pool.allowance(addr(7), addr(8)), Shares::new(20));
        assert_eq!(
            pool.spend_allowance(addr(7), addr(8), Shares::new(21)),
            Err(AmmError::InsufficientAllowance)
        );
    }

    // -- permit digest ------------------------------------------------------

    #[test]
    fn permit_digest_changes_with_nonce() {
        let mut pool = initialized_pool();
        let before = pool.permit_digest(addr(7), addr(8), Shares::new(10), 1_000);
        assert_eq!(pool.bump_nonce(addr(7)), 0);
        let after = pool.permit_digest(addr(7), addr(8), Shares::new(10), 1_000);
        assert_ne!(before, after);
        assert_eq!(pool.nonce_of(addr(7)), 1);
    }

    #[test]
    fn permit_digest_binds_every_field() {
        let pool = initialized_pool();
        let base = pool.permit_digest(addr(7), addr(8), Shares::new(10), 1_000);
        assert_ne!(
            base,
            pool.permit_digest(addr(6), addr(8), Shares::new(10), 1_000)
        );
        assert_ne!(
            base,
            pool.permit_digest(addr(7), addr(9), Shares::new(10), 1_000)
        );
        assert_ne!(
            base,
            pool.permit_digest(addr(7), addr(8), Shares::new(11), 1_000)
        );
        assert_ne!(
            base,
            pool.permit_digest(addr(7), addr(8), Shares::new(10), 1_001)
        );
    }
}
