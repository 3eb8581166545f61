//! Capability traits at the engine's external seams.
//!
//! Three collaborators are deliberately outside this crate: the asset
//! ledger ([`FungibleLedger`], [`NativeWrapper`]), the borrower callback
//! ([`SwapCallback`]), and signature recovery ([`SignatureVerifier`]).
//! The engine consumes them only through these traits; the bundled
//! in-memory ledger is just one host adapter.

mod callback;
mod fungible;
mod verifier;

pub use callback::SwapCallback;
pub use fungible::{FungibleLedger, NativeWrapper};
pub use verifier::{Signature, SignatureVerifier};
