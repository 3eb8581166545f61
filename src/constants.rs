//! Protocol constants.
//!
//! Fee parameters and structural bounds are fixed at the protocol level;
//! they are not configuration. Changing any of these changes the economic
//! identity of every pool.

use crate::domain::Address;

/// Swap fee numerator: the input fraction retained by the curve is
/// `FEE_NUMERATOR / FEE_DENOMINATOR` (997/1000 = 0.3% fee on input).
pub const FEE_NUMERATOR: u128 = 997;

/// Swap fee denominator.
pub const FEE_DENOMINATOR: u128 = 1_000;

/// Shares permanently locked at [`BURN_ADDRESS`] on the first deposit
/// into a pool. Defeats first-depositor share-price manipulation and the
/// division-by-zero it would otherwise enable.
pub const MINIMUM_LOCKED_SHARES: u128 = 1_000;

/// Upper bound on either reserve: `2^112 - 1`. Balances above this are
/// rejected with [`AmmError::ReserveOverflow`](crate::error::AmmError).
pub const RESERVE_LIMIT: u128 = (1 << 112) - 1;

/// Fixed-point scale for the price accumulators (`2^64`). A cumulative
/// price is `Σ (reserve_other * PRICE_SCALE / reserve_this) * elapsed`.
pub const PRICE_SCALE: u128 = 1 << 64;

/// Sink for permanently locked shares. The zero identity is rejected as
/// an asset, so nothing else ever holds this address.
pub const BURN_ADDRESS: Address = Address::from_bytes([0u8; 32]);

/// Digest standing in for the pool implementation's code hash in
/// deterministic pool addressing. Fixed for the lifetime of the engine;
/// bump only with an incompatible pool implementation.
pub const POOL_CODE_DIGEST: [u8; 32] = *b"triton/constant-product-pool/v1\0";

/// Domain tag mixed into permit digests.
pub const PERMIT_DOMAIN_TAG: &[u8] = b"triton/share-permit/v1";
