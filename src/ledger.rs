//! In-memory asset ledger: the bundled host adapter behind the
//! [`FungibleLedger`] and [`NativeWrapper`] capabilities.
//!
//! Deliberately minimal — balances and transfers only, no allowances, no
//! metadata. It exists so the engine and router can be driven end-to-end
//! without an external host; a real deployment supplies its own
//! implementations of the capability traits.

use std::collections::BTreeMap;

use crate::domain::{Address, Amount};
use crate::error::{AmmError, Result};
use crate::traits::{FungibleLedger, NativeWrapper};

/// Balance books for every asset plus a native book, keyed by holder.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    assets: BTreeMap<Address, BTreeMap<Address, Amount>>,
    native: BTreeMap<Address, Amount>,
    wrapped_native: Address,
}

impl InMemoryLedger {
    /// Creates an empty ledger whose wrap/unwrap operations target
    /// `wrapped_native`.
    #[must_use]
    pub fn new(wrapped_native: Address) -> Self {
        Self {
            assets: BTreeMap::new(),
            native: BTreeMap::new(),
            wrapped_native,
        }
    }

    /// Faucet: credits `holder` with `value` of `asset` out of thin air.
    /// Host-side setup only; the engine itself never mints.
    pub fn credit(&mut self, asset: Address, holder: Address, value: Amount) {
        let book = self.assets.entry(asset).or_default();
        let balance = book.entry(holder).or_insert(Amount::ZERO);
        *balance = Amount::new(balance.get().saturating_add(value.get()));
    }

    /// Faucet for the native book.
    pub fn credit_native(&mut self, holder: Address, value: Amount) {
        let balance = self.native.entry(holder).or_insert(Amount::ZERO);
        *balance = Amount::new(balance.get().saturating_add(value.get()));
    }

    fn debit(&mut self, asset: Address, holder: Address, value: Amount) -> Result<()> {
        let book = self.assets.entry(asset).or_default();
        let balance = book.entry(holder).or_insert(Amount::ZERO);
        *balance = balance
            .checked_sub(value)
            .ok_or(AmmError::InsufficientBalance)?;
        Ok(())
    }
}

impl FungibleLedger for InMemoryLedger {
    fn balance_of(&self, asset: Address, holder: Address) -> Amount {
        self.assets
            .get(&asset)
            .and_then(|book| book.get(&holder))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn transfer(
        &mut self,
        asset: Address,
        from: Address,
        to: Address,
        value: Amount,
    ) -> Result<()> {
        if value.is_zero() {
            return Ok(());
        }
        self.debit(asset, from, value)?;
        self.credit(asset, to, value);
        Ok(())
    }
}

impl NativeWrapper for InMemoryLedger {
    fn wrapped_asset(&self) -> Address {
        self.wrapped_native
    }

    fn native_balance_of(&self, holder: Address) -> Amount {
        self.native.get(&holder).copied().unwrap_or(Amount::ZERO)
    }

    fn wrap(&mut self, holder: Address, value: Amount) -> Result<()> {
        let balance = self.native.entry(holder).or_insert(Amount::ZERO);
        *balance = balance
            .checked_sub(value)
            .ok_or(AmmError::InsufficientBalance)?;
        let wrapped = self.wrapped_native;
        self.credit(wrapped, holder, value);
        Ok(())
    }

    fn unwrap(&mut self, holder: Address, value: Amount) -> Result<()> {
        let wrapped = self.wrapped_native;
        self.debit(wrapped, holder, value)?;
        self.credit_native(holder, value);
        Ok(())
    }
}
