//! Opaque signature verification capability used by permits.

use crate::domain::Address;

/// A detached signature blob. The engine never inspects the bytes; only
/// the [`SignatureVerifier`] gives them meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; 64]);

impl Signature {
    /// Wraps raw signature bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

/// Recovers the signer identity of a digest, or nothing if the signature
/// is malformed.
///
/// The engine treats recovery as a black box: permit validity is decided
/// solely by comparing the recovered identity against the claimed holder.
pub trait SignatureVerifier {
    /// Identity that produced `signature` over `digest`, if any.
    fn recover(&self, digest: [u8; 32], signature: &Signature) -> Option<Address>;
}
