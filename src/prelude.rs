//! Convenience re-exports for common types and traits.
//!
//! A single import brings the working set into scope:
//!
//! ```rust
//! use triton_amm::prelude::*;
//! ```

pub use crate::config::{ExchangeConfig, RouterConfig};
pub use crate::domain::{Address, Amount, AssetPair, Shares, Timestamp};
pub use crate::error::{AmmError, Result};
pub use crate::exchange::Exchange;
pub use crate::ledger::InMemoryLedger;
pub use crate::registry::Registry;
pub use crate::router::Router;
pub use crate::traits::{
    FungibleLedger, NativeWrapper, Signature, SignatureVerifier, SwapCallback,
};
