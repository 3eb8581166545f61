//! Capability seams for the asset ledger the engine runs against.
//!
//! Token semantics are not this crate's business: the engine only ever
//! needs to read a balance and move value with host authority. Both
//! `transfer` and `transferFrom` of a conventional token surface collapse
//! to the single authed [`FungibleLedger::transfer`] here, because the
//! host — not the token — is the source of caller authenticity.

use crate::domain::{Address, Amount};
use crate::error::Result;

/// Read and move balances of any pooled asset.
///
/// Implementations must be exact: a successful `transfer` debits `from`
/// and credits `to` by precisely `value`, and `balance_of` reflects every
/// prior transfer. The engine's deposit-then-credit protocol depends on
/// balance reads being trustworthy.
pub trait FungibleLedger {
    /// Current balance of `holder` in `asset`. Unknown assets and holders
    /// read as zero.
    fn balance_of(&self, asset: Address, holder: Address) -> Amount;

    /// Moves `value` of `asset` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientBalance`](crate::error::AmmError)
    /// if `from` holds less than `value`.
    fn transfer(&mut self, asset: Address, from: Address, to: Address, value: Amount)
        -> Result<()>;
}

/// Wrap and unwrap the native asset at the engine boundary.
///
/// The wrapper asset is an ordinary [`FungibleLedger`] asset once
/// wrapped; this trait only covers the boundary crossing itself.
pub trait NativeWrapper {
    /// The identity of the wrapped-native asset.
    fn wrapped_asset(&self) -> Address;

    /// Native balance of `holder`.
    fn native_balance_of(&self, holder: Address) -> Amount;

    /// Converts `value` of `holder`'s native balance into the wrapped
    /// asset.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientBalance`](crate::error::AmmError)
    /// if the native balance is short.
    fn wrap(&mut self, holder: Address, value: Amount) -> Result<()>;

    /// Converts `value` of `holder`'s wrapped balance back to native.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::InsufficientBalance`](crate::error::AmmError)
    /// if the wrapped balance is short.
    fn unwrap(&mut self, holder: Address, value: Amount) -> Result<()>;
}
