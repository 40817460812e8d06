//! # sp-crypto
//!
//! Cryptographic primitives for the SAML service provider.
//!
//! - [`algorithm`] - the XML-Security algorithm URI registry and hash selection
//! - [`keys`] - PEM key loading plus RSA PKCS#1 v1.5 / PSS signing and verification
//! - [`random`] - request identifiers and symmetric session keys
//!
//! ## Legacy algorithms
//!
//! SHA-1 based signatures and Triple-DES session keys are still requested by
//! deployed identity providers. They are supported, but SHA-1 signing logs a
//! warning every time it is used.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithm;
pub mod error;
pub mod hash;
pub mod keys;
mod pss;
pub mod random;
pub mod signature;

pub use algorithm::{Algorithm, AlgorithmFamily, HashAlgorithm};
pub use error::{CryptoError, CryptoResult};
pub use hash::{digest, sha1, sha256, sha384, sha512};
pub use keys::{KeyKind, LoadedKey, PssOptions, SecurityKey};
pub use random::{fix_des_parity, generate_unique_id, random_bytes};
pub use signature::SignatureProvider;
