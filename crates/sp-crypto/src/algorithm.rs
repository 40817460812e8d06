//! XML-Security algorithm identifiers.
//!
//! The URIs below appear verbatim in signed and transmitted XML attributes
//! (`SigAlg`, `SignatureMethod/@Algorithm`, `EncryptionMethod/@Algorithm`), so
//! they must never be reformatted. Matching is exact: a URI with surrounding
//! whitespace is not recognised.

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};

/// Triple-DES in CBC mode.
pub const TRIPLEDES_CBC: &str = "http://www.w3.org/2001/04/xmlenc#tripledes-cbc";
/// AES-128 in CBC mode.
pub const AES128_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes128-cbc";
/// AES-192 in CBC mode.
pub const AES192_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes192-cbc";
/// AES-256 in CBC mode.
pub const AES256_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";
/// AES-128 in GCM mode.
pub const AES128_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes128-gcm";
/// AES-192 in GCM mode.
pub const AES192_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes192-gcm";
/// AES-256 in GCM mode.
pub const AES256_GCM: &str = "http://www.w3.org/2009/xmlenc11#aes256-gcm";
/// RSA PKCS#1 v1.5 key transport.
pub const RSA_1_5: &str = "http://www.w3.org/2001/04/xmlenc#rsa-1_5";
/// RSA-OAEP key transport with MGF1/SHA-1.
pub const RSA_OAEP_MGF1P: &str = "http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p";
/// RSA-OAEP key transport (XML Encryption 1.1).
pub const RSA_OAEP: &str = "http://www.w3.org/2009/xmlenc11#rsa-oaep";
/// DSA with SHA-1.
pub const DSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#dsa-sha1";
/// RSA PKCS#1 v1.5 with SHA-1.
pub const RSA_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#rsa-sha1";
/// RSA PKCS#1 v1.5 with SHA-256.
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
/// RSA PKCS#1 v1.5 with SHA-384.
pub const RSA_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384";
/// RSA PKCS#1 v1.5 with SHA-512.
pub const RSA_SHA512: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512";
/// RSA-PSS with SHA-256 and MGF1.
pub const RSA_SHA256_MGF1: &str = "http://www.w3.org/2007/05/xmldsig-more#sha256-rsa-MGF1";
/// HMAC with SHA-1.
pub const HMAC_SHA1: &str = "http://www.w3.org/2000/09/xmldsig#hmac-sha1";

/// Digest method URIs used alongside the signature algorithms.
pub mod digest_uris {
    /// SHA-1 digest.
    pub const SHA1: &str = "http://www.w3.org/2000/09/xmldsig#sha1";
    /// SHA-256 digest.
    pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
    /// SHA-384 digest.
    pub const SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#sha384";
    /// SHA-512 digest.
    pub const SHA512: &str = "http://www.w3.org/2001/04/xmlenc#sha512";
}

/// Broad category of an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    /// Symmetric block cipher used for content encryption.
    BlockCipher,
    /// Asymmetric key transport used to wrap a session key.
    KeyTransport,
    /// Signature or MAC algorithm.
    Signature,
}

/// Hash functions usable for signing, PSS mask generation and digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1 (legacy).
    Sha1,
    /// SHA-224.
    Sha224,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl HashAlgorithm {
    /// Returns the output length in bytes.
    #[must_use]
    pub const fn output_len(self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Returns the lowercase algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Parses a hash name such as `sha256`, `SHA-256` or `sha-256`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownAlgorithm`] for anything else.
    pub fn from_name(name: &str) -> CryptoResult<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(CryptoError::UnknownAlgorithm(name.to_string())),
        }
    }

    /// Returns the digest method URI, when XML-DSig defines one.
    #[must_use]
    pub const fn digest_uri(self) -> Option<&'static str> {
        match self {
            Self::Sha1 => Some(digest_uris::SHA1),
            Self::Sha256 => Some(digest_uris::SHA256),
            Self::Sha384 => Some(digest_uris::SHA384),
            Self::Sha512 => Some(digest_uris::SHA512),
            Self::Sha224 => None,
        }
    }
}

/// Registered XML-Security algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Triple-DES CBC.
    TripleDesCbc,
    /// AES-128 CBC.
    Aes128Cbc,
    /// AES-192 CBC.
    Aes192Cbc,
    /// AES-256 CBC.
    Aes256Cbc,
    /// AES-128 GCM.
    Aes128Gcm,
    /// AES-192 GCM.
    Aes192Gcm,
    /// AES-256 GCM.
    Aes256Gcm,
    /// RSA PKCS#1 v1.5 key transport.
    Rsa15,
    /// RSA-OAEP with MGF1/SHA-1.
    RsaOaepMgf1p,
    /// RSA-OAEP.
    RsaOaep,
    /// DSA-SHA1.
    DsaSha1,
    /// RSA-SHA1.
    RsaSha1,
    /// RSA-SHA256.
    RsaSha256,
    /// RSA-SHA384.
    RsaSha384,
    /// RSA-SHA512.
    RsaSha512,
    /// RSA-PSS SHA-256 with MGF1.
    RsaSha256Mgf1,
    /// HMAC-SHA1.
    HmacSha1,
}

struct Entry {
    algorithm: Algorithm,
    uri: &'static str,
    family: AlgorithmFamily,
    key_size: Option<usize>,
    hash: Option<HashAlgorithm>,
}

impl Entry {
    const fn cipher(algorithm: Algorithm, uri: &'static str, key_size: usize) -> Self {
        Self {
            algorithm,
            uri,
            family: AlgorithmFamily::BlockCipher,
            key_size: Some(key_size),
            hash: None,
        }
    }

    const fn transport(algorithm: Algorithm, uri: &'static str, hash: Option<HashAlgorithm>) -> Self {
        Self {
            algorithm,
            uri,
            family: AlgorithmFamily::KeyTransport,
            key_size: None,
            hash,
        }
    }

    const fn signature(algorithm: Algorithm, uri: &'static str, hash: HashAlgorithm) -> Self {
        Self {
            algorithm,
            uri,
            family: AlgorithmFamily::Signature,
            key_size: None,
            hash: Some(hash),
        }
    }
}

static REGISTRY: [Entry; 17] = [
    Entry::cipher(Algorithm::TripleDesCbc, TRIPLEDES_CBC, 24),
    Entry::cipher(Algorithm::Aes128Cbc, AES128_CBC, 16),
    Entry::cipher(Algorithm::Aes192Cbc, AES192_CBC, 24),
    Entry::cipher(Algorithm::Aes256Cbc, AES256_CBC, 32),
    Entry::cipher(Algorithm::Aes128Gcm, AES128_GCM, 16),
    Entry::cipher(Algorithm::Aes192Gcm, AES192_GCM, 24),
    Entry::cipher(Algorithm::Aes256Gcm, AES256_GCM, 32),
    Entry::transport(Algorithm::Rsa15, RSA_1_5, None),
    Entry::transport(Algorithm::RsaOaepMgf1p, RSA_OAEP_MGF1P, Some(HashAlgorithm::Sha1)),
    Entry::transport(Algorithm::RsaOaep, RSA_OAEP, None),
    Entry::signature(Algorithm::DsaSha1, DSA_SHA1, HashAlgorithm::Sha1),
    Entry::signature(Algorithm::RsaSha1, RSA_SHA1, HashAlgorithm::Sha1),
    Entry::signature(Algorithm::RsaSha256, RSA_SHA256, HashAlgorithm::Sha256),
    Entry::signature(Algorithm::RsaSha384, RSA_SHA384, HashAlgorithm::Sha384),
    Entry::signature(Algorithm::RsaSha512, RSA_SHA512, HashAlgorithm::Sha512),
    Entry::signature(Algorithm::RsaSha256Mgf1, RSA_SHA256_MGF1, HashAlgorithm::Sha256),
    Entry::signature(Algorithm::HmacSha1, HMAC_SHA1, HashAlgorithm::Sha1),
];

impl Algorithm {
    /// Every registered algorithm, in registry order.
    pub const ALL: [Self; 17] = [
        Self::TripleDesCbc,
        Self::Aes128Cbc,
        Self::Aes192Cbc,
        Self::Aes256Cbc,
        Self::Aes128Gcm,
        Self::Aes192Gcm,
        Self::Aes256Gcm,
        Self::Rsa15,
        Self::RsaOaepMgf1p,
        Self::RsaOaep,
        Self::DsaSha1,
        Self::RsaSha1,
        Self::RsaSha256,
        Self::RsaSha384,
        Self::RsaSha512,
        Self::RsaSha256Mgf1,
        Self::HmacSha1,
    ];

    // The registry is declared in the same order as the enum.
    fn entry(self) -> &'static Entry {
        &REGISTRY[self as usize]
    }

    /// Returns the algorithm URI.
    #[must_use]
    pub fn uri(self) -> &'static str {
        self.entry().uri
    }

    /// Returns the algorithm family.
    #[must_use]
    pub fn family(self) -> AlgorithmFamily {
        self.entry().family
    }

    /// Returns the symmetric key size in bytes, for block ciphers.
    #[must_use]
    pub fn key_size(self) -> Option<usize> {
        self.entry().key_size
    }

    /// Returns the hash bound to this algorithm, if any.
    #[must_use]
    pub fn hash(self) -> Option<HashAlgorithm> {
        self.entry().hash
    }

    /// Looks an algorithm up by its exact URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        REGISTRY
            .iter()
            .find(|entry| entry.uri == uri)
            .map(|entry| entry.algorithm)
    }

    /// Like [`Algorithm::from_uri`], but fails with an error naming the URI.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownAlgorithm`] if the URI is not registered.
    pub fn parse(uri: &str) -> CryptoResult<Self> {
        Self::from_uri(uri).ok_or_else(|| CryptoError::UnknownAlgorithm(uri.to_string()))
    }

    /// Returns true for the RSA signature algorithms this crate can sign with.
    #[must_use]
    pub const fn is_rsa_signature(self) -> bool {
        matches!(
            self,
            Self::RsaSha1 | Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 | Self::RsaSha256Mgf1
        )
    }

    /// Returns true if the algorithm implies RSA-PSS padding.
    #[must_use]
    pub const fn is_pss(self) -> bool {
        matches!(self, Self::RsaSha256Mgf1)
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.uri())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
