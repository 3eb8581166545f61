//! Deterministic pool addressing.
//!
//! A pool's identity is a pure function of the registry identity and the
//! canonical asset pair — no registry lookup, no sequence number, no
//! randomness. Anyone can compute the address of a pool before it exists,
//! and the router uses exactly this to chain multi-hop swaps without
//! round-tripping through the registry.
//!
//! The derivation commits to four things: a fixed marker byte, the
//! registry identity, the digest of the canonical pair, and the engine
//! code digest. The registry derives pool identities through this same
//! function at creation, so the two can never disagree.

use sha2::{Digest, Sha256};

use crate::constants::POOL_CODE_DIGEST;
use crate::domain::{Address, AssetPair};
use crate::error::Result;

/// Marker byte prefixed to the derivation preimage, keeping pool
/// addresses disjoint from any other identity scheme in the engine.
const DERIVATION_MARKER: u8 = 0xff;

/// Derives the identity of the pool for `(x, y)` under `registry`.
///
/// Argument order is irrelevant: the pair is canonicalized first, so
/// `pool_address(r, x, y) == pool_address(r, y, x)`.
///
/// # Errors
///
/// Propagates [`AssetPair::new`] validation: identical or null asset
/// identities are rejected.
///
/// # Examples
///
/// ```
/// use triton_amm::addressing::pool_address;
/// use triton_amm::domain::Address;
///
/// let registry = Address::from_bytes([9u8; 32]);
/// let x = Address::from_bytes([1u8; 32]);
/// let y = Address::from_bytes([2u8; 32]);
/// let forward = pool_address(registry, x, y).expect("valid pair");
/// let reverse = pool_address(registry, y, x).expect("valid pair");
/// assert_eq!(forward, reverse);
/// ```
pub fn pool_address(registry: Address, x: Address, y: Address) -> Result<Address> {
    let pair = AssetPair::new(x, y)?;
    Ok(pool_address_for_pair(registry, &pair))
}

/// Derivation over an already-canonical pair.
#[must_use]
pub fn pool_address_for_pair(registry: Address, pair: &AssetPair) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(pair.first().as_bytes());
    hasher.update(pair.second().as_bytes());
    let pair_digest: [u8; 32] = hasher.finalize().into();

    let mut hasher = Sha256::new();
    hasher.update([DERIVATION_MARKER]);
    hasher.update(registry.as_bytes());
    hasher.update(pair_digest);
    hasher.update(POOL_CODE_DIGEST);
    Address::from_bytes(hasher.finalize().into())
}
