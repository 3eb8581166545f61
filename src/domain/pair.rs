//! Canonically ordered pair of distinct assets.

use super::Address;
use crate::error::{AmmError, Result};

/// An unordered asset pair in canonical form: `first() < second()` under
/// the total order on [`Address`].
///
/// Canonical ordering is what guarantees one pool per unordered pair —
/// `(A, B)` and `(B, A)` collapse to the same `AssetPair`, the same
/// derived pool identity, and the same registry entry.
///
/// # Examples
///
/// ```
/// use triton_amm::domain::{Address, AssetPair};
///
/// let x = Address::from_bytes([2u8; 32]);
/// let y = Address::from_bytes([1u8; 32]);
/// let pair = AssetPair::new(x, y).expect("distinct assets");
/// assert_eq!(pair.first(), y);
/// assert_eq!(pair.second(), x);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetPair {
    asset_a: Address,
    asset_b: Address,
}

impl AssetPair {
    /// Creates a canonically ordered pair from two asset identities given
    /// in either order.
    ///
    /// # Errors
    ///
    /// - [`AmmError::IdenticalAssets`] if both identities are equal.
    /// - [`AmmError::ZeroAddress`] if either identity is null (the null
    ///   identity sorts first, so checking the canonical first covers
    ///   both arguments).
    pub fn new(x: Address, y: Address) -> Result<Self> {
        if x == y {
            return Err(AmmError::IdenticalAssets);
        }
        let (asset_a, asset_b) = if x < y { (x, y) } else { (y, x) };
        if asset_a.is_zero() {
            return Err(AmmError::ZeroAddress);
        }
        Ok(Self { asset_a, asset_b })
    }

    /// Returns the lower asset identity.
    #[must_use]
    pub const fn first(&self) -> Address {
        self.asset_a
    }

    /// Returns the higher asset identity.
    #[must_use]
    pub const fn second(&self) -> Address {
        self.asset_b
    }

    /// Returns `true` if `asset` is one of the pair.
    #[must_use]
    pub fn contains(&self, asset: Address) -> bool {
        self.asset_a == asset || self.asset_b == asset
    }

    /// Returns the counterpart of `asset` in this pair, or `None` if
    /// `asset` is not part of it.
    #[must_use]
    pub fn other(&self, asset: Address) -> Option<Address> {
        if asset == self.asset_a {
            Some(self.asset_b)
        } else if asset == self.asset_b {
            Some(self.asset_a)
        } else {
            None
        }
    }
}
