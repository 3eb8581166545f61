//! Pure arithmetic for the engine: fee-adjusted swap pricing and
//! full-width 256-bit helpers.
//!
//! Nothing in this module touches state; the pool engine and the router
//! both call into it, which is what keeps their numbers consistent.

pub mod quote;
pub mod wide;

pub use quote::{amount_in, amount_out, amounts_in, amounts_out, quote};
pub use wide::{isqrt, low_u128, to_u128, wide_mul};
