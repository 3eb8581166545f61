//! # Triton AMM
//!
//! A constant-product exchange engine: pools of two fungible assets,
//! liquidity shares, flash borrowing, time-weighted price accumulators,
//! deterministic pool addressing, and a multi-hop swap router.
//!
//! The crate divides into a pure core and a stateful host:
//!
//! - **Pure**: [`math`] (fee-adjusted swap pricing on 256-bit
//!   intermediates) and [`addressing`] (pool identities derived by hash,
//!   computable before the pool exists).
//! - **Stateful**: [`pool`] (reserves, share ledger, price accumulators,
//!   reentrancy guard), [`registry`] (one pool per unordered pair,
//!   enforced by rejection), and [`exchange`] (the host that holds pool
//!   guards across borrower callbacks and rolls failed calls back
//!   whole).
//! - **Orchestration**: [`router`] (deadline-guarded liquidity and
//!   multi-hop swap flows, native-asset wrapping at the boundary).
//!
//! External collaborators — the asset ledger, borrower callbacks, and
//! signature recovery — sit behind the capability traits in [`traits`];
//! [`ledger`] ships an in-memory host adapter so everything is drivable
//! in tests.
//!
//! # Quick start
//!
//! ```rust
//! use triton_amm::config::{ExchangeConfig, RouterConfig};
//! use triton_amm::domain::{Address, Amount};
//! use triton_amm::exchange::Exchange;
//! use triton_amm::ledger::InMemoryLedger;
//! use triton_amm::router::Router;
//!
//! let registry = Address::from_bytes([9u8; 32]);
//! let wrapped = Address::from_bytes([100u8; 32]);
//! let alice = Address::from_bytes([10u8; 32]);
//! let usd = Address::from_bytes([1u8; 32]);
//! let gold = Address::from_bytes([2u8; 32]);
//!
//! let mut ledger = InMemoryLedger::new(wrapped);
//! ledger.credit(usd, alice, Amount::new(1_000_000));
//! ledger.credit(gold, alice, Amount::new(1_000_000));
//!
//! let config = ExchangeConfig::new(registry, 0).expect("valid config");
//! let mut exchange = Exchange::new(config, ledger);
//! let router = Router::new(
//!     RouterConfig::new(Address::from_bytes([11u8; 32]), registry, wrapped)
//!         .expect("valid config"),
//! );
//!
//! // Open the pool and seed it in one call.
//! let (a, b, minted) = router
//!     .add_liquidity(
//!         &mut exchange,
//!         alice,
//!         usd,
//!         gold,
//!         Amount::new(100_000),
//!         Amount::new(100_000),
//!         Amount::ZERO,
//!         Amount::ZERO,
//!         alice,
//!         u64::MAX,
//!     )
//!     .expect("first deposit");
//! assert_eq!(a, Amount::new(100_000));
//! assert_eq!(b, Amount::new(100_000));
//! assert!(minted.get() > 0);
//!
//! // Swap against it with a slippage floor.
//! let amounts = router
//!     .swap_exact_in(
//!         &mut exchange,
//!         alice,
//!         Amount::new(1_000),
//!         Amount::new(900),
//!         &[usd, gold],
//!         alice,
//!         u64::MAX,
//!     )
//!     .expect("swap");
//! assert_eq!(amounts[1], Amount::new(987));
//! ```
//!
//! # Module guide
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`domain`] | Newtype value types: [`Address`](domain::Address), [`Amount`](domain::Amount), [`Shares`](domain::Shares), [`AssetPair`](domain::AssetPair), [`Timestamp`](domain::Timestamp) |
//! | [`math`] | Pure fee-adjusted swap pricing and 256-bit helpers |
//! | [`addressing`] | Deterministic pool identity derivation |
//! | [`pool`] | Per-pool state: reserves, accumulators, shares, guard |
//! | [`registry`] | Pair-to-pool mapping, unique by rejection |
//! | [`exchange`] | The host: entry points, callbacks, rollback |
//! | [`router`] | Deadline-guarded liquidity and multi-hop swap flows |
//! | [`ledger`] | In-memory asset ledger host adapter |
//! | [`traits`] | Capability seams for external collaborators |
//! | [`config`] | Validated configuration structs |
//! | [`error`]  | [`AmmError`](error::AmmError) unified error enum |

pub mod addressing;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod math;
pub mod pool;
pub mod prelude;
pub mod registry;
pub mod router;
pub mod traits;

#[cfg(test)]
mod proptest_properties;
