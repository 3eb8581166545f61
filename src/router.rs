//! Stateless orchestration over the exchange.
//!
//! The router owns nothing durable: it derives pool addresses through
//! [`addressing`](crate::addressing) (never a registry lookup), computes
//! amounts through [`math`](crate::math), and sequences exchange calls.
//! Multi-hop swaps deliver each intermediate hop's output straight to the
//! next pool's derived address, so pool guards are held strictly one at a
//! time.
//!
//! Every mutating entry point checks its deadline once on entry and runs
//! under a rollback scope, so a slippage bound that fails *after* some
//! transfers already happened still leaves no trace.

use crate::addressing;
use crate::config::RouterConfig;
use crate::domain::{Address, Amount, Shares};
use crate::error::{AmmError, Result};
use crate::exchange::Exchange;
use crate::math;
use crate::traits::{NativeWrapper, Signature, SignatureVerifier};

/// Stateless router over a registry and a wrapped-native asset.
#[derive(Debug, Clone, Copy)]
pub struct Router {
    config: RouterConfig,
}

impl Router {
    /// Creates a router from a validated config.
    #[must_use]
    pub const fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// The router's configuration.
    #[must_use]
    pub const fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Deadline precondition, checked once at entry of every mutating
    /// call and never re-checked mid-call.
    fn ensure(exchange: &Exchange, deadline: u64) -> Result<()> {
        if exchange.now() > deadline {
            return Err(AmmError::Expired);
        }
        Ok(())
    }

    // -- quoting helpers ----------------------------------------------------

    /// Reserves of the `(input, output)` pool oriented in trade
    /// direction.
    fn oriented_reserves(
        &self,
        exchange: &Exchange,
        input: Address,
        output: Address,
    ) -> Result<(Amount, Amount)> {
        let address = addressing::pool_address(self.config.registry(), input, output)?;
        let pool = exchange.pool(address)?;
        let pair = pool.pair()?;
        let (reserve_a, reserve_b, _) = pool.get_reserves();
        if input == pair.first() {
            Ok((reserve_a, reserve_b))
        } else {
            Ok((reserve_b, reserve_a))
        }
    }

    fn path_hops(&self, exchange: &Exchange, path: &[Address]) -> Result<Vec<(Amount, Amount)>> {
        if path.len() < 2 {
            return Err(AmmError::InvalidPath);
        }
        path.windows(2)
            .map(|hop| self.oriented_reserves(exchange, hop[0], hop[1]))
            .collect()
    }

    /// Full amounts vector for an exact-in trade along `path`.
    ///
    /// # Errors
    ///
    /// [`AmmError::InvalidPath`], [`AmmError::PoolNotFound`], or any
    /// quote-math error.
    pub fn quote_amounts_out(
        &self,
        exchange: &Exchange,
        amount_in: Amount,
        path: &[Address],
    ) -> Result<Vec<Amount>> {
        math::amounts_out(amount_in, &self.path_hops(exchange, path)?)
    }

    /// Full amounts vector for an exact-out trade along `path`.
    ///
    /// # Errors
    ///
    /// [`AmmError::InvalidPath`], [`AmmError::PoolNotFound`], or any
    /// quote-math error.
    pub fn quote_amounts_in(
        &self,
        exchange: &Exchange,
        amount_out: Amount,
        path: &[Address],
    ) -> Result<Vec<Amount>> {
        math::amounts_in(amount_out, &self.path_hops(exchange, path)?)
    }

    // -- liquidity ----------------------------------------------------------

    /// Optimal contribution against current reserves: take the full
    /// desired amount on one side and the proportional quote on the
    /// other, whichever respects both desired ceilings.
    #[allow(clippy::too_many_arguments)]
    fn optimal_contribution(
        &self,
        exchange: &Exchange,
        asset_a: Address,
        asset_b: Address,
        amount_a_desired: Amount,
        amount_b_desired: Amount,
        amount_a_min: Amount,
        amount_b_min: Amount,
    ) -> Result<(Amount, Amount)> {
        let (reserve_a, reserve_b) = self.oriented_reserves(exchange, asset_a, asset_b)?;
        if reserve_a.is_zero() && reserve_b.is_zero() {
            return Ok((amount_a_desired, amount_b_desired));
        }
        let b_optimal = math::quote(amount_a_desired, reserve_a, reserve_b)?;
        if b_optimal <= amount_b_desired {
            if b_optimal < amount_b_min {
                return Err(AmmError::InsufficientBAmount);
            }
            Ok((amount_a_desired, b_optimal))
        } else {
            let a_optimal = math::quote(amount_b_desired, reserve_b, reserve_a)?;
            if a_optimal > amount_a_desired {
                return Err(AmmError::ExcessiveInputAmount);
            }
            if a_optimal < amount_a_min {
                return Err(AmmError::InsufficientAAmount);
            }
            Ok((a_optimal, amount_b_desired))
        }
    }

    /// Adds liquidity to the `(asset_a, asset_b)` pool, creating it on
    /// first use. Returns the amounts actually taken and the shares
    /// minted to `receiver`.
    ///
    /// # Errors
    ///
    /// - [`AmmError::Expired`] past `deadline`.
    /// - [`AmmError::InsufficientAAmount`] /
    ///   [`AmmError::InsufficientBAmount`] if the optimal contribution
    ///   falls below a caller minimum.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        asset_a: Address,
        asset_b: Address,
        amount_a_desired: Amount,
        amount_b_desired: Amount,
        amount_a_min: Amount,
        amount_b_min: Amount,
        receiver: Address,
        deadline: u64,
    ) -> Result<(Amount, Amount, Shares)> {
        Self::ensure(exchange, deadline)?;
        exchange.with_rollback(|ex| {
            let pool = match ex.registry().get_pool(asset_a, asset_b) {
                Some(existing) => existing,
                None => ex.create_pool(asset_a, asset_b)?,
            };
            let (amount_a, amount_b) = self.optimal_contribution(
                ex,
                asset_a,
                asset_b,
                amount_a_desired,
                amount_b_desired,
                amount_a_min,
                amount_b_min,
            )?;
            ex.transfer_asset(caller, asset_a, pool, amount_a)?;
            ex.transfer_asset(caller, asset_b, pool, amount_b)?;
            let minted = ex.deposit_liquidity(pool, receiver)?;
            Ok((amount_a, amount_b, minted))
        })
    }

    /// [`Router::add_liquidity`] with the native asset on one side. Only
    /// the optimal native amount is wrapped; any excess of
    /// `native_desired` never leaves the caller, which is the refund.
    ///
    /// # Errors
    ///
    /// As [`Router::add_liquidity`], plus
    /// [`AmmError::InsufficientBalance`] on a short native balance.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity_native(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        asset: Address,
        amount_desired: Amount,
        amount_min: Amount,
        native_desired: Amount,
        native_min: Amount,
        receiver: Address,
        deadline: u64,
    ) -> Result<(Amount, Amount, Shares)> {
        Self::ensure(exchange, deadline)?;
        let wrapped = self.config.wrapped_native();
        exchange.with_rollback(|ex| {
            let pool = match ex.registry().get_pool(asset, wrapped) {
                Some(existing) => existing,
                None => ex.create_pool(asset, wrapped)?,
            };
            let (amount, native) = self.optimal_contribution(
                ex,
                asset,
                wrapped,
                amount_desired,
                native_desired,
                amount_min,
                native_min,
            )?;
            ex.transfer_asset(caller, asset, pool, amount)?;
            ex.ledger_mut().wrap(caller, native)?;
            ex.transfer_asset(caller, wrapped, pool, native)?;
            let minted = ex.deposit_liquidity(pool, receiver)?;
            Ok((amount, native, minted))
        })
    }

    /// Moves `shares` into the pool, redeems them, and enforces the
    /// caller's minimum-received amounts. Returns `(amount_a, amount_b)`
    /// in the caller's argument order.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientAAmount`] /
    ///   [`AmmError::InsufficientBAmount`] below a minimum.
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        asset_a: Address,
        asset_b: Address,
        shares: Shares,
        amount_a_min: Amount,
        amount_b_min: Amount,
        receiver: Address,
        deadline: u64,
    ) -> Result<(Amount, Amount)> {
        Self::ensure(exchange, deadline)?;
        exchange.with_rollback(|ex| {
            let pool = addressing::pool_address(self.config.registry(), asset_a, asset_b)?;
            ex.transfer_shares(caller, pool, pool, shares)?;
            self.finish_remove(ex, pool, asset_a, receiver, amount_a_min, amount_b_min)
        })
    }

    /// [`Router::remove_liquidity`] authorized by a permit signature
    /// instead of pre-positioned shares: the permit names this router as
    /// spender, and the router pulls the shares through the allowance.
    ///
    /// # Errors
    ///
    /// As [`Router::remove_liquidity`], plus permit failures
    /// ([`AmmError::Expired`], [`AmmError::InvalidSignature`]).
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity_with_permit(
        &self,
        exchange: &mut Exchange,
        verifier: &dyn SignatureVerifier,
        caller: Address,
        asset_a: Address,
        asset_b: Address,
        shares: Shares,
        amount_a_min: Amount,
        amount_b_min: Amount,
        receiver: Address,
        deadline: u64,
        signature: &Signature,
    ) -> Result<(Amount, Amount)> {
        Self::ensure(exchange, deadline)?;
        exchange.with_rollback(|ex| {
            let pool = addressing::pool_address(self.config.registry(), asset_a, asset_b)?;
            ex.permit(
                pool,
                verifier,
                caller,
                self.config.address(),
                shares,
                deadline,
                signature,
            )?;
            ex.transfer_shares_from(self.config.address(), pool, caller, pool, shares)?;
            self.finish_remove(ex, pool, asset_a, receiver, amount_a_min, amount_b_min)
        })
    }

    /// [`Router::remove_liquidity`] against the native pool: the token
    /// side goes to `receiver` as-is, the wrapped side is unwrapped to
    /// native in place.
    ///
    /// # Errors
    ///
    /// As [`Router::remove_liquidity`].
    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity_native(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        asset: Address,
        shares: Shares,
        amount_min: Amount,
        native_min: Amount,
        receiver: Address,
        deadline: u64,
    ) -> Result<(Amount, Amount)> {
        Self::ensure(exchange, deadline)?;
        let wrapped = self.config.wrapped_native();
        exchange.with_rollback(|ex| {
            let pool = addressing::pool_address(self.config.registry(), asset, wrapped)?;
            ex.transfer_shares(caller, pool, pool, shares)?;
            let (amount, native) =
                self.finish_remove(ex, pool, asset, receiver, amount_min, native_min)?;
            ex.ledger_mut().unwrap(receiver, native)?;
            Ok((amount, native))
        })
    }

    /// Shared tail of the remove variants: redeem, orient to the
    /// caller's asset order, enforce minimums.
    fn finish_remove(
        &self,
        exchange: &mut Exchange,
        pool: Address,
        asset_a: Address,
        receiver: Address,
        amount_a_min: Amount,
        amount_b_min: Amount,
    ) -> Result<(Amount, Amount)> {
        let (out_first, out_second) = exchange.withdraw_liquidity(pool, receiver)?;
        let pair = exchange.pool(pool)?.pair()?;
        let (amount_a, amount_b) = if asset_a == pair.first() {
            (out_first, out_second)
        } else {
            (out_second, out_first)
        };
        if amount_a < amount_a_min {
            return Err(AmmError::InsufficientAAmount);
        }
        if amount_b < amount_b_min {
            return Err(AmmError::InsufficientBAmount);
        }
        Ok((amount_a, amount_b))
    }

    // -- swaps --------------------------------------------------------------

    /// Walks the path calling `swap` on each pool; hop `i`'s output is
    /// delivered straight to hop `i + 1`'s pool, the last to `receiver`.
    fn execute_path(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        amounts: &[Amount],
        path: &[Address],
        receiver: Address,
    ) -> Result<()> {
        for i in 0..path.len() - 1 {
            let (input, output) = (path[i], path[i + 1]);
            let pool = addressing::pool_address(self.config.registry(), input, output)?;
            let pair = exchange.pool(pool)?.pair()?;
            let out = amounts[i + 1];
            let (amount_a_out, amount_b_out) = if output == pair.second() {
                (Amount::ZERO, out)
            } else {
                (out, Amount::ZERO)
            };
            let to = if i + 2 < path.len() {
                addressing::pool_address(self.config.registry(), output, path[i + 2])?
            } else {
                receiver
            };
            exchange.swap(caller, pool, amount_a_out, amount_b_out, to, &[], None)?;
        }
        Ok(())
    }

    /// Swaps an exact input along `path`, enforcing a minimum final
    /// output. Returns the full amounts vector.
    ///
    /// # Errors
    ///
    /// - [`AmmError::InsufficientOutputAmount`] below
    ///   `amount_out_min`.
    /// - [`AmmError::InvalidPath`] / [`AmmError::PoolNotFound`] on a bad
    ///   path.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_in(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        amount_in: Amount,
        amount_out_min: Amount,
        path: &[Address],
        receiver: Address,
        deadline: u64,
    ) -> Result<Vec<Amount>> {
        Self::ensure(exchange, deadline)?;
        exchange.with_rollback(|ex| {
            let amounts = self.quote_amounts_out(ex, amount_in, path)?;
            if amounts[amounts.len() - 1] < amount_out_min {
                return Err(AmmError::InsufficientOutputAmount);
            }
            let first_pool = addressing::pool_address(self.config.registry(), path[0], path[1])?;
            ex.transfer_asset(caller, path[0], first_pool, amounts[0])?;
            self.execute_path(ex, caller, &amounts, path, receiver)?;
            Ok(amounts)
        })
    }

    /// Swaps for an exact output along `path`, enforcing a maximum
    /// input. Returns the full amounts vector.
    ///
    /// # Errors
    ///
    /// - [`AmmError::ExcessiveInputAmount`] above `amount_in_max`.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_out(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        amount_out: Amount,
        amount_in_max: Amount,
        path: &[Address],
        receiver: Address,
        deadline: u64,
    ) -> Result<Vec<Amount>> {
        Self::ensure(exchange, deadline)?;
        exchange.with_rollback(|ex| {
            let amounts = self.quote_amounts_in(ex, amount_out, path)?;
            if amounts[0] > amount_in_max {
                return Err(AmmError::ExcessiveInputAmount);
            }
            let first_pool = addressing::pool_address(self.config.registry(), path[0], path[1])?;
            ex.transfer_asset(caller, path[0], first_pool, amounts[0])?;
            self.execute_path(ex, caller, &amounts, path, receiver)?;
            Ok(amounts)
        })
    }

    /// Exact-in swap funded by wrapping the caller's native balance;
    /// `path` must start at the wrapped-native asset.
    ///
    /// # Errors
    ///
    /// [`AmmError::InvalidPath`] if the path does not start at the
    /// wrapped asset; otherwise as [`Router::swap_exact_in`].
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_native_in(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        native_in: Amount,
        amount_out_min: Amount,
        path: &[Address],
        receiver: Address,
        deadline: u64,
    ) -> Result<Vec<Amount>> {
        Self::ensure(exchange, deadline)?;
        if path.first() != Some(&self.config.wrapped_native()) {
            return Err(AmmError::InvalidPath);
        }
        exchange.with_rollback(|ex| {
            ex.ledger_mut().wrap(caller, native_in)?;
            let amounts = self.quote_amounts_out(ex, native_in, path)?;
            if amounts[amounts.len() - 1] < amount_out_min {
                return Err(AmmError::InsufficientOutputAmount);
            }
            let first_pool = addressing::pool_address(self.config.registry(), path[0], path[1])?;
            ex.transfer_asset(caller, path[0], first_pool, amounts[0])?;
            self.execute_path(ex, caller, &amounts, path, receiver)?;
            Ok(amounts)
        })
    }

    /// Exact-in swap whose final output is unwrapped to native for
    /// `receiver`; `path` must end at the wrapped-native asset.
    ///
    /// # Errors
    ///
    /// [`AmmError::InvalidPath`] if the path does not end at the wrapped
    /// asset; otherwise as [`Router::swap_exact_in`].
    #[allow(clippy::too_many_arguments)]
    pub fn swap_exact_in_to_native(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        amount_in: Amount,
        native_out_min: Amount,
        path: &[Address],
        receiver: Address,
        deadline: u64,
    ) -> Result<Vec<Amount>> {
        Self::ensure(exchange, deadline)?;
        if path.last() != Some(&self.config.wrapped_native()) {
            return Err(AmmError::InvalidPath);
        }
        exchange.with_rollback(|ex| {
            let amounts = self.quote_amounts_out(ex, amount_in, path)?;
            let final_out = amounts[amounts.len() - 1];
            if final_out < native_out_min {
                return Err(AmmError::InsufficientOutputAmount);
            }
            let first_pool = addressing::pool_address(self.config.registry(), path[0], path[1])?;
            ex.transfer_asset(caller, path[0], first_pool, amounts[0])?;
            self.execute_path(ex, caller, &amounts, path, receiver)?;
            ex.ledger_mut().unwrap(receiver, final_out)?;
            Ok(amounts)
        })
    }

    /// Exact-out swap funded by native value: wraps only the computed
    /// input, so any excess of `native_in_max` never leaves the caller.
    ///
    /// # Errors
    ///
    /// [`AmmError::ExcessiveInputAmount`] if the required input exceeds
    /// `native_in_max`; [`AmmError::InvalidPath`] if the path does not
    /// start at the wrapped asset.
    #[allow(clippy::too_many_arguments)]
    pub fn swap_native_for_exact(
        &self,
        exchange: &mut Exchange,
        caller: Address,
        amount_out: Amount,
        native_in_max: Amount,
        path: &[Address],
        receiver: Address,
        deadline: u64,
    ) -> Result<Vec<Amount>> {
        Self::ensure(exchange, deadline)?;
        if path.first() != Some(&self.config.wrapped_native()) {
            return Err(AmmError::InvalidPath);
        }
        exchange.with_rollback(|ex| {
            let amounts = self.quote_amounts_in(ex, amount_out, path)?;
            if amounts[0] > native_in_max {
                return Err(AmmError::ExcessiveInputAmount);
            }
            ex.ledger_mut().wrap(caller, amounts[0])?;
            let first_pool = addressing::pool_address(self.config.registry(), path[0], path[1])?;
            ex.transfer_asset(caller, path[0], first_pool, amounts[0])?;
            self.execute_path(ex, caller, &amounts, path, receiver)?;
            Ok(amounts)
        })
    }
}
