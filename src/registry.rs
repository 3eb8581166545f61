//! Pool registry: uniqueness enforcement and enumeration.
//!
//! The registry never computes pool identities itself — it records what
//! [`addressing`](crate::addressing) derives. Uniqueness is enforced by
//! rejection: a second creation attempt for the same unordered pair fails
//! with [`AmmError::PoolExists`](crate::error::AmmError) rather than
//! silently returning the existing pool.

use std::collections::BTreeMap;

use crate::domain::{Address, AssetPair};
use crate::error::{AmmError, Result};

/// Mapping from canonical pairs to pool identities plus the append-only
/// creation-ordered list.
#[derive(Debug, Clone)]
pub struct Registry {
    address: Address,
    pairs: BTreeMap<(Address, Address), Address>,
    all: Vec<Address>,
}

impl Registry {
    /// Creates an empty registry with its own identity.
    #[must_use]
    pub fn new(address: Address) -> Self {
        Self {
            address,
            pairs: BTreeMap::new(),
            all: Vec::new(),
        }
    }

    /// The registry's identity, committed into every derived pool
    /// address.
    #[must_use]
    pub const fn address(&self) -> Address {
        self.address
    }

    /// Looks up the pool for `(x, y)` in either argument order.
    #[must_use]
    pub fn get_pool(&self, x: Address, y: Address) -> Option<Address> {
        self.pairs.get(&(x, y)).copied()
    }

    /// Number of pools ever created.
    #[must_use]
    pub fn pool_count(&self) -> usize {
        self.all.len()
    }

    /// Pool identity at creation index `index`.
    #[must_use]
    pub fn pool_at(&self, index: usize) -> Option<Address> {
        self.all.get(index).copied()
    }

    /// Records a freshly created pool under both orderings and appends it
    /// to the list.
    ///
    /// # Errors
    ///
    /// Returns [`AmmError::PoolExists`] if the pair is already recorded.
    pub fn record(&mut self, pair: &AssetPair, pool: Address) -> Result<()> {
        let key = (pair.first(), pair.second());
        if self.pairs.contains_key(&key) {
            return Err(AmmError::PoolExists);
        }
        self.pairs.insert(key, pool);
        self.pairs.insert((pair.second(), pair.first()), pool);
        self.all.push(pool);
        Ok(())
    }
}
