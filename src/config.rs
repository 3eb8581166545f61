//! Validated configuration for the exchange host and the router.

use crate::domain::Address;
use crate::error::{AmmError, Result};

/// Configuration for an [`Exchange`](crate::exchange::Exchange) host.
///
/// # Validation
///
/// The registry identity must be non-null; it is committed into every
/// derived pool address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeConfig {
    registry: Address,
    genesis_time: u64,
}

impl ExchangeConfig {
    /// Creates a new `ExchangeConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::ZeroAddress`] if `registry` is the null
    /// identity.
    pub fn new(registry: Address, genesis_time: u64) -> Result<Self> {
        let config = Self {
            registry,
            genesis_time,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::ZeroAddress`] if `registry` is the null
    /// identity.
    pub fn validate(&self) -> Result<()> {
        if self.registry.is_zero() {
            return Err(AmmError::ZeroAddress);
        }
        Ok(())
    }

    /// Returns the registry identity.
    #[must_use]
    pub const fn registry(&self) -> Address {
        self.registry
    }

    /// Returns the host clock's starting value in seconds.
    #[must_use]
    pub const fn genesis_time(&self) -> u64 {
        self.genesis_time
    }
}

/// Configuration for a [`Router`](crate::router::Router).
///
/// The router is stateless; this is everything it holds — its own
/// identity (the spender named in permits), the registry it derives pool
/// addresses against, and the wrapped-native asset it uses at the native
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterConfig {
    address: Address,
    registry: Address,
    wrapped_native: Address,
}

impl RouterConfig {
    /// Creates a new `RouterConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::ZeroAddress`] if any identity is null.
    pub fn new(address: Address, registry: Address, wrapped_native: Address) -> Result<Self> {
        let config = Self {
            address,
            registry,
            wrapped_native,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates all configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::ZeroAddress`] if any identity is null.
    pub fn validate(&self) -> Result<()> {
        if self.address.is_zero() || self.registry.is_zero() || self.wrapped_native.is_zero() {
            return Err(AmmError::ZeroAddress);
        }
        Ok(())
    }

    /// Returns the router's own identity.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Returns the registry identity.
    #[must_use]
    pub const fn registry(&self) -> Address {
        self.registry
    }

    /// Returns the wrapped-native asset identity.
    #[must_use]
    pub const fn wrapped_native(&self) -> Address {
        self.wrapped_native
    }
}
