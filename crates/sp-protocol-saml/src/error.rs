//! SAML error types.
//!
//! Provides error types for request construction, XML tree building and
//! transport encoding.

use sp_crypto::CryptoError;
use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// A required settings field is absent or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Invalid qualified name, namespace binding or tree operation.
    #[error("XML structure error: {0}")]
    XmlStructure(String),

    /// The XML writer failed.
    #[error("XML serialization error: {0}")]
    XmlSerialize(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// Deflate compression or decompression error.
    #[error("deflate error: {0}")]
    Deflate(String),

    /// A transport message could not be decoded.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Cryptographic operation error.
    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl SamlError {
    /// Returns true for configuration errors.
    ///
    /// These are never transient; retrying with the same settings fails again.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::Deflate(err.to_string())
    }
}

impl From<serde_json::Error> for SamlError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}
