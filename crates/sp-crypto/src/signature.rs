//! Signature provider abstraction.
//!
//! Protocol code that signs outgoing messages depends on this trait rather
//! than on [`SecurityKey`](crate::SecurityKey) directly.

use crate::algorithm::Algorithm;
use crate::error::CryptoResult;

/// Trait for signature providers.
pub trait SignatureProvider: Send + Sync {
    /// Signs the given data.
    ///
    /// ## Errors
    ///
    /// Returns an error if no suitable key is loaded or signing fails.
    fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Verifies a signature.
    ///
    /// Returns `Ok(false)` for a signature that does not match.
    ///
    /// ## Errors
    ///
    /// Returns an error if no suitable key is loaded.
    fn verify(&self, data: &[u8], signature: &[u8]) -> CryptoResult<bool>;

    /// Returns the signature algorithm.
    fn algorithm(&self) -> Algorithm;
}
