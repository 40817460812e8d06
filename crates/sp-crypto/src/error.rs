//! Error types for key handling and signature operations.

use thiserror::Error;

/// Result type for cryptographic operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Cryptographic errors.
///
/// A signature that simply does not match is not an error; `verify` reports
/// it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// No key material has been loaded yet.
    #[error("no key loaded")]
    KeyNotLoaded,

    /// The loaded key cannot perform the requested operation.
    #[error("wrong key kind: operation requires a {expected} key, but a {actual} key is loaded")]
    WrongKeyKind {
        /// The kind of key the operation needs.
        expected: &'static str,
        /// The kind of key that is loaded.
        actual: &'static str,
    },

    /// Key material could not be parsed.
    #[error("invalid key format: {0}")]
    InvalidKey(String),

    /// The signing primitive failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// The message could not be encoded for the configured padding.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The algorithm is known but cannot be used for this operation.
    #[error("algorithm not supported for this operation: {0}")]
    UnsupportedAlgorithm(String),

    /// The algorithm URI or hash name is not in the registry.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// No symmetric key size is defined for the algorithm.
    #[error("unknown key size for type \"{0}\"")]
    UnknownKeySize(String),
}

impl CryptoError {
    /// Returns true for errors caused by the key being in the wrong load state.
    #[must_use]
    pub const fn is_key_state(&self) -> bool {
        matches!(self, Self::KeyNotLoaded | Self::WrongKeyKind { .. })
    }
}

impl From<rsa::Error> for CryptoError {
    fn from(err: rsa::Error) -> Self {
        Self::Signing(err.to_string())
    }
}
