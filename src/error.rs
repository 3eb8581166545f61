//! Unified error type for the exchange engine.
//!
//! Every fallible operation across the crate returns [`AmmError`], so
//! consumers match on a single enum regardless of which layer failed.
//! Variants group into a small taxonomy rather than a hierarchy:
//!
//! - **Validation** — malformed arguments (identical or zero identities,
//!   short paths, a recipient that shadows a pooled asset).
//! - **Precondition** — the call arrived in a state that forbids it
//!   (expired deadline, re-entry while the pool guard is held, an
//!   initializer other than the registry).
//! - **Economic** — the numbers don't work out (insufficient liquidity,
//!   input, output, repayment, or a constant-product violation).
//! - **Arithmetic** — overflow, underflow, division by zero, or a reserve
//!   exceeding the 112-bit bound.
//! - **Auth** — signature verification failures.
//! - **Lookup** — a pool that already exists or cannot be found.
//!
//! All failures are fail-fast and whole-call-reverting: the engine rolls
//! back every effect of the failing call before returning the error.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, AmmError>;

/// Unified error enum for pool, registry, router, and math operations.
///
/// Payload-carrying variants hold a `&'static str` naming the exact site
/// of the failure, which keeps the enum `Copy` and trivially comparable
/// in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmmError {
    // -- validation ---------------------------------------------------------
    /// The two assets of a prospective pair are the same identity.
    #[error("pair requires two distinct asset identities")]
    IdenticalAssets,

    /// The zero identity was supplied where a real one is required.
    #[error("zero identity is not a valid asset")]
    ZeroAddress,

    /// A swap path must name at least two assets.
    #[error("swap path must contain at least two assets")]
    InvalidPath,

    /// The swap recipient collides with one of the pooled assets.
    #[error("recipient must not be a pooled asset identity")]
    InvalidRecipient,

    // -- precondition -------------------------------------------------------
    /// The caller-supplied deadline is in the past.
    #[error("deadline has passed")]
    Expired,

    /// A mutating entry point was called while the pool guard was held.
    #[error("reentrant call rejected")]
    ReentrantCall,

    /// The operation is restricted to a specific caller.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    // -- economic -----------------------------------------------------------
    /// A quote was requested for a zero amount.
    #[error("amount must be non-zero")]
    InsufficientAmount,

    /// Reserves cannot satisfy the request.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,

    /// A deposit was too small to mint any shares.
    #[error("deposit too small to mint shares")]
    InsufficientLiquidityMinted,

    /// A withdrawal would pay out zero of one asset.
    #[error("withdrawal too small to redeem shares")]
    InsufficientLiquidityBurned,

    /// A swap inferred no input delivery.
    #[error("no input delivered to the pool")]
    InsufficientInputAmount,

    /// A swap requested zero output, or a slippage floor was not met.
    #[error("output below the requested minimum")]
    InsufficientOutputAmount,

    /// The required input exceeds the caller's ceiling.
    #[error("required input above the caller maximum")]
    ExcessiveInputAmount,

    /// Optimal contribution of asset A fell below the caller minimum.
    #[error("asset A contribution below minimum")]
    InsufficientAAmount,

    /// Optimal contribution of asset B fell below the caller minimum.
    #[error("asset B contribution below minimum")]
    InsufficientBAmount,

    /// A flash borrow was not fully repaid in asset A.
    #[error("flash borrow not repaid in asset A")]
    InsufficientRepaymentA,

    /// A flash borrow was not fully repaid in asset B.
    #[error("flash borrow not repaid in asset B")]
    InsufficientRepaymentB,

    /// The fee-adjusted constant-product check failed after a swap.
    #[error("constant-product invariant violated")]
    KInvariantViolation,

    /// A ledger transfer exceeded the sender's balance.
    #[error("insufficient asset balance")]
    InsufficientBalance,

    /// A share transfer or burn exceeded the holder's balance.
    #[error("insufficient share balance")]
    InsufficientShares,

    /// A delegated share transfer exceeded the granted allowance.
    #[error("insufficient share allowance")]
    InsufficientAllowance,

    // -- arithmetic ---------------------------------------------------------
    /// A new balance exceeded the 112-bit reserve bound.
    #[error("reserve exceeds the 112-bit bound")]
    ReserveOverflow,

    /// Arithmetic overflow at the named site.
    #[error("overflow: {0}")]
    Overflow(&'static str),

    /// Arithmetic underflow at the named site.
    #[error("underflow: {0}")]
    Underflow(&'static str),

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    // -- auth ---------------------------------------------------------------
    /// The recovered signer does not match the claimed holder.
    #[error("signature does not match the claimed holder")]
    InvalidSignature,

    // -- lookup -------------------------------------------------------------
    /// A pool for this pair has already been created.
    #[error("pool already exists for this pair")]
    PoolExists,

    /// No pool exists at the given identity.
    #[error("pool not found")]
    PoolNotFound,
}
