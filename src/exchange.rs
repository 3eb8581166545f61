//! The exchange host: pools, registry, and ledger under one roof.
//!
//! Every mutating pool entry point lives here, because each one needs
//! three things the bare [`Pool`] state cannot provide on its own:
//!
//! 1. **The exclusive section.** The pool guard flips to `Busy` before
//!    any transfer or callback and back to `Idle` only after all effects
//!    of the call, so a borrower callback re-entering the same pool is
//!    rejected with [`AmmError::ReentrantCall`] instead of interleaving.
//!    Different pools stay independent: a callback may legitimately
//!    operate on another pool.
//! 2. **The callback suspension point.** [`Exchange::swap`] and
//!    [`Exchange::flash_borrow`] hand the whole exchange to the borrower
//!    mid-call; the guard is held across that hand-off.
//! 3. **Whole-call atomicity.** Each outermost entry point snapshots the
//!    durable state (registry, pools, ledger) and restores it on any
//!    error, so a failed call has no observable effect — including the
//!    optimistic transfers a failed swap already made.
//!
//! The engine follows a deposit-then-credit protocol throughout: amounts
//! are inferred from balance deltas against recorded reserves, never
//! taken from caller-supplied parameters.

use alloy_primitives::U256;
use std::collections::BTreeMap;

use crate::addressing;
use crate::config::ExchangeConfig;
use crate::constants::{BURN_ADDRESS, FEE_DENOMINATOR, MINIMUM_LOCKED_SHARES};
use crate::domain::{Address, Amount, AssetPair, Shares, Timestamp};
use crate::error::{AmmError, Result};
use crate::ledger::InMemoryLedger;
use crate::math::{isqrt, to_u128, wide_mul};
use crate::pool::Pool;
use crate::registry::Registry;
use crate::traits::{FungibleLedger, Signature, SignatureVerifier, SwapCallback};

/// Deterministic host for the invariant engine.
#[derive(Debug, Clone)]
pub struct Exchange {
    now: u64,
    registry: Registry,
    pools: BTreeMap<Address, Pool>,
    ledger: InMemoryLedger,
}

impl Exchange {
    /// Creates an exchange from a validated config and a funded ledger.
    #[must_use]
    pub fn new(config: ExchangeConfig, ledger: InMemoryLedger) -> Self {
        Self {
            now: config.genesis_time(),
            registry: Registry::new(config.registry()),
            pools: BTreeMap::new(),
            ledger,
        }
    }

    // -- host clock ---------------------------------------------------------

    /// Current host time in seconds.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.now
    }

    /// Advances the host clock.
    pub fn advance_time(&mut self, seconds: u64) {
        self.now = self.now.wrapping_add(seconds);
    }

    const fn timestamp(&self) -> Timestamp {
        Timestamp::from_seconds(self.now)
    }

    // -- read surface -------------------------------------------------------

    /// The registry.
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The asset ledger.
    #[must_use]
    pub const fn ledger(&self) -> &InMemoryLedger {
        &self.ledger
    }

    /// Mutable ledger access for host-side setup (faucets, wrapping).
    pub fn ledger_mut(&mut self) -> &mut InMemoryLedger {
        &mut self.ledger
    }

    /// The pool at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::PoolNotFound`] if no pool lives there.
    pub fn pool(&self, address: Address) -> Result<&Pool> {
        self.pools.get(&address).ok_or(AmmError::PoolNotFound)
    }

    /// Reserves and last-update timestamp of the pool at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::PoolNotFound`] if no pool lives there.
    pub fn get_reserves(&self, address: Address) -> Result<(Amount, Amount, Timestamp)> {
        Ok(self.pool(address)?.get_reserves())
    }

    /// Moves `value` of `asset` from `from` with host authority. The
    /// deposit-then-credit protocol means callers fund pools through
    /// this before calling the crediting entry point.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientBalance`] on a short balance.
    pub fn transfer_asset(
        &mut self,
        from: Address,
        asset: Address,
        to: Address,
        value: Amount,
    ) -> Result<()> {
        self.ledger.transfer(asset, from, to, value)
    }

    // -- rollback and guard plumbing ----------------------------------------

    /// Runs `f` against the exchange, restoring the pre-call snapshot of
    /// all durable state if it fails.
    pub(crate) fn with_rollback<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let registry = self.registry.clone();
        let pools = self.pools.clone();
        let ledger = self.ledger.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.registry = registry;
                self.pools = pools;
                self.ledger = ledger;
                Err(err)
            }
        }
    }

    fn pool_entry(&mut self, address: Address) -> Result<&mut Pool> {
        self.pools.get_mut(&address).ok_or(AmmError::PoolNotFound)
    }

    /// Rollback plus the pool's exclusive section around `f`. The guard
    /// is taken before `f` runs any transfer or callback and released
    /// only after `f` has fully succeeded; on failure the snapshot
    /// restore returns it to `Idle`.
    fn guarded<T>(
        &mut self,
        pool: Address,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        self.with_rollback(|ex| {
            ex.pool_entry(pool)?.enter()?;
            let value = f(ex)?;
            ex.pool_entry(pool)?.exit();
            Ok(value)
        })
    }

    // -- registry operations ------------------------------------------------

    /// Creates the pool for `(x, y)`: canonicalizes, derives the identity
    /// through pool addressing, constructs and initializes the pool, and
    /// records it.
    ///
    /// # Errors
    ///
    /// - [`AmmError::IdenticalAssets`] / [`AmmError::ZeroAddress`] on an
    ///   invalid pair.
    /// - [`AmmError::PoolExists`] if the pair already has a pool, in
    ///   either argument order.
    pub fn create_pool(&mut self, x: Address, y: Address) -> Result<Address> {
        self.with_rollback(|ex| {
            let pair = AssetPair::new(x, y)?;
            let registry_id = ex.registry.address();
            let address = addressing::pool_address_for_pair(registry_id, &pair);
            ex.registry.record(&pair, address)?;
            let mut pool = Pool::new(address, registry_id);
            pool.initialize(registry_id, pair)?;
            ex.pools.insert(address, pool);
            tracing::info!(
                pool = %address,
                asset_a = %pair.first(),
                asset_b = %pair.second(),
                "pool created"
            );
            Ok(address)
        })
    }

    // -- pool entry points --------------------------------------------------

    /// Credits `receiver` with shares for assets already transferred to
    /// the pool since its last reserve update.
    ///
    /// First deposit mints `⌊√(amount_a · amount_b)⌋ − 1000` to the
    /// receiver and locks the 1000 permanently at the burn sink; later
    /// deposits mint the worse of the two proportional ratios.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientLiquidityMinted`] if the deposit is too
    ///   small to mint anything.
    /// - [`AmmError::ReentrantCall`], [`AmmError::PoolNotFound`],
    ///   [`AmmError::ReserveOverflow`] as usual.
    pub fn deposit_liquidity(&mut self, pool: Address, receiver: Address) -> Result<Shares> {
        self.guarded(pool, |ex| ex.deposit_locked(pool, receiver))
    }

    fn deposit_locked(&mut self, pool_addr: Address, receiver: Address) -> Result<Shares> {
        let now = self.timestamp();
        let (pair, reserve_a, reserve_b, total) = {
            let pool = self.pool(pool_addr)?;
            let (r_a, r_b, _) = pool.get_reserves();
            (pool.pair()?, r_a, r_b, pool.total_shares())
        };
        let balance_a = self.ledger.balance_of(pair.first(), pool_addr);
        let balance_b = self.ledger.balance_of(pair.second(), pool_addr);
        let amount_a = balance_a
            .checked_sub(reserve_a)
            .ok_or(AmmError::Underflow("deposit balance below reserve"))?;
        let amount_b = balance_b
            .checked_sub(reserve_b)
            .ok_or(AmmError::Underflow("deposit balance below reserve"))?;

        let minted = if total.is_zero() {
            let root = to_u128(isqrt(wide_mul(amount_a.get(), amount_b.get())))?;
            let minted = root
                .checked_sub(MINIMUM_LOCKED_SHARES)
                .ok_or(AmmError::InsufficientLiquidityMinted)?;
            self.pool_entry(pool_addr)?
                .mint_shares(BURN_ADDRESS, Shares::new(MINIMUM_LOCKED_SHARES))?;
            Shares::new(minted)
        } else {
            if reserve_a.is_zero() || reserve_b.is_zero() {
                return Err(AmmError::InsufficientLiquidity);
            }
            let by_a = wide_mul(amount_a.get(), total.get()) / U256::from(reserve_a.get());
            let by_b = wide_mul(amount_b.get(), total.get()) / U256::from(reserve_b.get());
            Shares::new(to_u128(by_a.min(by_b))?)
        };
        if minted.is_zero() {
            return Err(AmmError::InsufficientLiquidityMinted);
        }

        let pool = self.pool_entry(pool_addr)?;
        pool.mint_shares(receiver, minted)?;
        pool.update(balance_a, balance_b, now)?;
        pool.record_invariant();
        tracing::debug!(pool = %pool_addr, receiver = %receiver, %minted, "liquidity deposited");
        Ok(minted)
    }

    /// Redeems the shares sitting on the pool's own balance for a
    /// proportional cut of both current balances, paid to `receiver`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientLiquidityBurned`] if either payout
    ///   rounds to zero.
    pub fn withdraw_liquidity(
        &mut self,
        pool: Address,
        receiver: Address,
    ) -> Result<(Amount, Amount)> {
        self.guarded(pool, |ex| ex.withdraw_locked(pool, receiver))
    }

    fn withdraw_locked(
        &mut self,
        pool_addr: Address,
        receiver: Address,
    ) -> Result<(Amount, Amount)> {
        let now = self.timestamp();
        let (pair, liquidity, total) = {
            let pool = self.pool(pool_addr)?;
            (
                pool.pair()?,
                pool.share_balance_of(pool_addr),
                pool.total_shares(),
            )
        };
        if total.is_zero() {
            return Err(AmmError::InsufficientLiquidityBurned);
        }
        let balance_a = self.ledger.balance_of(pair.first(), pool_addr);
        let balance_b = self.ledger.balance_of(pair.second(), pool_addr);
        // Pro-rata against current balances, not stale reserves, so any
        // unsynced donations are distributed too.
        let amount_a = Amount::new(to_u128(
            wide_mul(liquidity.get(), balance_a.get()) / U256::from(total.get()),
        )?);
        let amount_b = Amount::new(to_u128(
            wide_mul(liquidity.get(), balance_b.get()) / U256::from(total.get()),
        )?);
        if amount_a.is_zero() || amount_b.is_zero() {
            return Err(AmmError::InsufficientLiquidityBurned);
        }

        self.pool_entry(pool_addr)?.burn_shares(pool_addr, liquidity)?;
        self.ledger
            .transfer(pair.first(), pool_addr, receiver, amount_a)?;
        self.ledger
            .transfer(pair.second(), pool_addr, receiver, amount_b)?;

        let balance_a = self.ledger.balance_of(pair.first(), pool_addr);
        let balance_b = self.ledger.balance_of(pair.second(), pool_addr);
        let pool = self.pool_entry(pool_addr)?;
        pool.update(balance_a, balance_b, now)?;
        pool.record_invariant();
        tracing::debug!(pool = %pool_addr, receiver = %receiver, %amount_a, %amount_b, "liquidity withdrawn");
        Ok((amount_a, amount_b))
    }

    /// Swaps via optimistic transfer: the requested outputs are sent to
    /// `receiver` first, the borrower callback (invoked when `data` is
    /// non-empty) may deliver the inputs during the call, and the
    /// fee-adjusted constant-product check settles the difference.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientOutputAmount`] if both outputs are zero.
    /// - [`AmmError::InsufficientLiquidity`] if an output reaches its
    ///   reserve.
    /// - [`AmmError::InvalidRecipient`] if `receiver` is a pooled asset.
    /// - [`AmmError::InsufficientInputAmount`] if no input arrived.
    /// - [`AmmError::KInvariantViolation`] if the fee-adjusted invariant
    ///   fails; the optimistic transfers are rolled back.
    #[allow(clippy::too_many_arguments)]
    pub fn swap(
        &mut self,
        caller: Address,
        pool: Address,
        amount_a_out: Amount,
        amount_b_out: Amount,
        receiver: Address,
        data: &[u8],
        callback: Option<&mut dyn SwapCallback>,
    ) -> Result<()> {
        self.guarded(pool, |ex| {
            ex.swap_locked(caller, pool, amount_a_out, amount_b_out, receiver, data, callback)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn swap_locked(
        &mut self,
        caller: Address,
        pool_addr: Address,
        amount_a_out: Amount,
        amount_b_out: Amount,
        receiver: Address,
        data: &[u8],
        callback: Option<&mut dyn SwapCallback>,
    ) -> Result<()> {
        let now = self.timestamp();
        let (pair, reserve_a, reserve_b) = {
            let pool = self.pool(pool_addr)?;
            let (r_a, r_b, _) = pool.get_reserves();
            (pool.pair()?, r_a, r_b)
        };
        if amount_a_out.is_zero() && amount_b_out.is_zero() {
            return Err(AmmError::InsufficientOutputAmount);
        }
        if amount_a_out >= reserve_a || amount_b_out >= reserve_b {
            return Err(AmmError::InsufficientLiquidity);
        }
        if receiver == pair.first() || receiver == pair.second() {
            return Err(AmmError::InvalidRecipient);
        }

        // Optimistic transfers: outputs leave before inputs are known.
        self.ledger
            .transfer(pair.first(), pool_addr, receiver, amount_a_out)?;
        self.ledger
            .transfer(pair.second(), pool_addr, receiver, amount_b_out)?;
        if !data.is_empty() {
            if let Some(cb) = callback {
                cb.on_swap(self, caller, amount_a_out, amount_b_out, data)?;
            }
        }

        let balance_a = self.ledger.balance_of(pair.first(), pool_addr);
        let balance_b = self.ledger.balance_of(pair.second(), pool_addr);
        let amount_a_in =
            balance_a.saturating_sub(Amount::new(reserve_a.get() - amount_a_out.get()));
        let amount_b_in =
            balance_b.saturating_sub(Amount::new(reserve_b.get() - amount_b_out.get()));
        if amount_a_in.is_zero() && amount_b_in.is_zero() {
            return Err(AmmError::InsufficientInputAmount);
        }

        // Fee-adjusted invariant: scale balances by 1000, charge 3 per
        // 1000 on the input side only, compare full-width products.
        let adjusted_a = wide_mul(balance_a.get(), FEE_DENOMINATOR)
            .checked_sub(wide_mul(amount_a_in.get(), 3))
            .ok_or(AmmError::Underflow("fee-adjusted balance"))?;
        let adjusted_b = wide_mul(balance_b.get(), FEE_DENOMINATOR)
            .checked_sub(wide_mul(amount_b_in.get(), 3))
            .ok_or(AmmError::Underflow("fee-adjusted balance"))?;
        let lhs = adjusted_a
            .checked_mul(adjusted_b)
            .ok_or(AmmError::Overflow("adjusted balance product"))?;
        let rhs = wide_mul(reserve_a.get(), reserve_b.get())
            .checked_mul(U256::from(1_000_000u64))
            .ok_or(AmmError::Overflow("reserve product"))?;
        if lhs < rhs {
            return Err(AmmError::KInvariantViolation);
        }

        self.pool_entry(pool_addr)?.update(balance_a, balance_b, now)?;
        tracing::debug!(
            pool = %pool_addr,
            %amount_a_in, %amount_b_in, %amount_a_out, %amount_b_out,
            receiver = %receiver,
            "swap"
        );
        Ok(())
    }

    /// Lends `amount_a` / `amount_b` to `receiver` for the duration of
    /// the callback. Unlike [`Exchange::swap`], repayment must be full in
    /// both assets independently — no fee is taken on this path.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientRepaymentA`] /
    ///   [`AmmError::InsufficientRepaymentB`] if a post-callback balance
    ///   dropped below its pre-call value.
    #[allow(clippy::too_many_arguments)]
    pub fn flash_borrow(
        &mut self,
        caller: Address,
        pool: Address,
        receiver: Address,
        amount_a: Amount,
        amount_b: Amount,
        data: &[u8],
        callback: Option<&mut dyn SwapCallback>,
    ) -> Result<()> {
        self.guarded(pool, |ex| {
            ex.flash_locked(caller, pool, receiver, amount_a, amount_b, data, callback)
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn flash_locked(
        &mut self,
        caller: Address,
        pool_addr: Address,
        receiver: Address,
        amount_a: Amount,
        amount_b: Amount,
        data: &[u8],
        callback: Option<&mut dyn SwapCallback>,
    ) -> Result<()> {
        let now = self.timestamp();
        let pair = self.pool(pool_addr)?.pair()?;
        let before_a = self.ledger.balance_of(pair.first(), pool_addr);
        let before_b = self.ledger.balance_of(pair.second(), pool_addr);

        self.ledger
            .transfer(pair.first(), pool_addr, receiver, amount_a)?;
        self.ledger
            .transfer(pair.second(), pool_addr, receiver, amount_b)?;
        if let Some(cb) = callback {
            cb.on_swap(self, caller, amount_a, amount_b, data)?;
        }

        let after_a = self.ledger.balance_of(pair.first(), pool_addr);
        let after_b = self.ledger.balance_of(pair.second(), pool_addr);
        if after_a < before_a {
            return Err(AmmError::InsufficientRepaymentA);
        }
        if after_b < before_b {
            return Err(AmmError::InsufficientRepaymentB);
        }

        self.pool_entry(pool_addr)?.update(after_a, after_b, now)?;
        tracing::debug!(pool = %pool_addr, %amount_a, %amount_b, receiver = %receiver, "flash borrow repaid");
        Ok(())
    }

    /// Sweeps any balance in excess of recorded reserves to `receiver`,
    /// correcting accidental direct transfers.
    ///
    /// # Errors
    ///
    /// [`AmmError::ReentrantCall`] / [`AmmError::PoolNotFound`].
    pub fn skim(&mut self, pool: Address, receiver: Address) -> Result<()> {
        self.guarded(pool, |ex| {
            let (pair, reserve_a, reserve_b) = {
                let p = ex.pool(pool)?;
                let (r_a, r_b, _) = p.get_reserves();
                (p.pair()?, r_a, r_b)
            };
            let excess_a = ex
                .ledger
                .balance_of(pair.first(), pool)
                .saturating_sub(reserve_a);
            let excess_b = ex
                .ledger
                .balance_of(pair.second(), pool)
                .saturating_sub(reserve_b);
            ex.ledger.transfer(pair.first(), pool, receiver, excess_a)?;
            ex.ledger.transfer(pair.second(), pool, receiver, excess_b)?;
            Ok(())
        })
    }

    /// Forces reserves to equal current balances unconditionally.
    ///
    /// # Errors
    ///
    /// [`AmmError::ReserveOverflow`] if a balance exceeds the 112-bit
    /// bound.
    pub fn sync(&mut self, pool: Address) -> Result<()> {
        self.guarded(pool, |ex| {
            let now = ex.timestamp();
            let pair = ex.pool(pool)?.pair()?;
            let balance_a = ex.ledger.balance_of(pair.first(), pool);
            let balance_b = ex.ledger.balance_of(pair.second(), pool);
            ex.pool_entry(pool)?.update(balance_a, balance_b, now)
        })
    }

    // -- share-token surface ------------------------------------------------

    /// Moves `value` of `caller`'s shares in `pool` to `to`.
    ///
    /// # Errors
    ///
    /// [`AmmError::InsufficientShares`] on a short balance.
    pub fn transfer_shares(
        &mut self,
        caller: Address,
        pool: Address,
        to: Address,
        value: Shares,
    ) -> Result<()> {
        self.pool_entry(pool)?.transfer_shares(caller, to, value)
    }

    /// Sets `caller`'s allowance for `spender` over shares in `pool`.
    ///
    /// # Errors
    ///
    /// [`AmmError::PoolNotFound`].
    pub fn approve_shares(
        &mut self,
        caller: Address,
        pool: Address,
        spender: Address,
        value: Shares,
    ) -> Result<()> {
        self.pool_entry(pool)?.approve(caller, spender, value);
        Ok(())
    }

    /// Moves `value` of `owner`'s shares to `to`, consuming `caller`'s
    /// allowance.
    ///
    /// # Errors
    ///
    /// [`AmmError::InsufficientAllowance`] /
    /// [`AmmError::InsufficientShares`].
    pub fn transfer_shares_from(
        &mut self,
        caller: Address,
        pool: Address,
        owner: Address,
        to: Address,
        value: Shares,
    ) -> Result<()> {
        self.with_rollback(|ex| {
            let p = ex.pool_entry(pool)?;
            p.spend_allowance(owner, caller, value)?;
            p.transfer_shares(owner, to, value)
        })
    }

    /// Grants `spender` an allowance over `owner`'s shares on the
    /// strength of a signature instead of a direct call.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Expired`] if `deadline` has passed.
    /// - [`AmmError::InvalidSignature`] if recovery does not yield
    ///   `owner`.
    #[allow(clippy::too_many_arguments)]
    pub fn permit(
        &mut self,
        pool: Address,
        verifier: &dyn SignatureVerifier,
        owner: Address,
        spender: Address,
        value: Shares,
        deadline: u64,
        signature: &Signature,
    ) -> Result<()> {
        if self.now > deadline {
            return Err(AmmError::Expired);
        }
        let digest = self
            .pool(pool)?
            .permit_digest(owner, spender, value, deadline);
        if verifier.recover(digest, signature) != Some(owner) {
            return Err(AmmError::InvalidSignature);
        }
        let p = self.pool_entry(pool)?;
        p.bump_nonce(owner);
        p.approve(owner, spender, value);
        Ok(())
    }
}
