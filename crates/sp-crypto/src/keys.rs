//! Key loading and RSA signing.
//!
//! A [`SecurityKey`] is configured with an algorithm URI, then loaded once
//! with PEM material. What the PEM contains decides which operations are
//! legal afterwards:
//!
//! - a private key (PKCS#8 or PKCS#1) can only [`sign`](SecurityKey::sign)
//! - a public key (SPKI or PKCS#1) or an X.509 certificate can only
//!   [`verify`](SecurityKey::verify)
//!
//! Loading takes `&mut self`; signing and verifying take `&self`, so a loaded
//! key can be shared across threads for concurrent use.
//!
//! ## Padding
//!
//! PKCS#1 v1.5 is used unless PSS is enabled, either explicitly through
//! [`SecurityKey::with_pss`] or implicitly by the `sha256-rsa-MGF1`
//! algorithm. PSS digest hash, MGF1 hash and salt length are independent.

use rand::Rng;
use rand_core::OsRng;
use rsa::hazmat::{rsa_decrypt_and_check, rsa_encrypt};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::algorithm::{Algorithm, HashAlgorithm};
use crate::error::{CryptoError, CryptoResult};
use crate::hash::digest;
use crate::pss;
use crate::random::{fix_des_parity, random_bytes};
use crate::signature::SignatureProvider;

/// PSS parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PssOptions {
    /// Hash applied to the message.
    pub hash: HashAlgorithm,
    /// Hash used by the MGF1 mask generation function.
    pub mgf_hash: HashAlgorithm,
    /// Salt length in bytes.
    pub salt_length: usize,
}

impl PssOptions {
    /// Creates PSS options with the MGF1 hash equal to `hash` and a salt as
    /// long as the digest.
    #[must_use]
    pub const fn new(hash: HashAlgorithm) -> Self {
        Self {
            hash,
            mgf_hash: hash,
            salt_length: hash.output_len(),
        }
    }

    /// Sets the MGF1 hash.
    #[must_use]
    pub const fn with_mgf_hash(mut self, mgf_hash: HashAlgorithm) -> Self {
        self.mgf_hash = mgf_hash;
        self
    }

    /// Sets the salt length.
    #[must_use]
    pub const fn with_salt_length(mut self, salt_length: usize) -> Self {
        self.salt_length = salt_length;
        self
    }
}

impl Default for PssOptions {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Sha256,
            mgf_hash: HashAlgorithm::Sha256,
            salt_length: 32,
        }
    }
}

/// Which half of a key pair was loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// A private key, usable for signing.
    Private,
    /// A public key or certificate, usable for verification.
    Public,
}

impl KeyKind {
    /// Returns a lowercase label for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

/// Loaded key material.
#[derive(Debug, Clone)]
pub enum LoadedKey {
    /// RSA private key.
    Private(RsaPrivateKey),
    /// RSA public key, possibly taken from a certificate.
    Public(RsaPublicKey),
}

impl LoadedKey {
    /// Parses PEM material, detecting the key type from the block label.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if no supported PEM block is found
    /// or the block does not hold an RSA key.
    pub fn from_pem(pem: &[u8]) -> CryptoResult<Self> {
        let text = std::str::from_utf8(pem)
            .map_err(|_| CryptoError::InvalidKey("PEM data is not valid UTF-8".to_string()))?;
        let label = pem_label(text)
            .ok_or_else(|| CryptoError::InvalidKey("no PEM block found".to_string()))?;

        match label {
            "PRIVATE KEY" => RsaPrivateKey::from_pkcs8_pem(text)
                .map(Self::Private)
                .map_err(|e| CryptoError::InvalidKey(format!("invalid PKCS#8 private key: {e}"))),
            "RSA PRIVATE KEY" => RsaPrivateKey::from_pkcs1_pem(text)
                .map(Self::Private)
                .map_err(|e| CryptoError::InvalidKey(format!("invalid PKCS#1 private key: {e}"))),
            "PUBLIC KEY" => RsaPublicKey::from_public_key_pem(text)
                .map(Self::Public)
                .map_err(|e| CryptoError::InvalidKey(format!("invalid public key: {e}"))),
            "RSA PUBLIC KEY" => RsaPublicKey::from_pkcs1_pem(text)
                .map(Self::Public)
                .map_err(|e| CryptoError::InvalidKey(format!("invalid PKCS#1 public key: {e}"))),
            "CERTIFICATE" => public_key_from_certificate(pem).map(Self::Public),
            "ENCRYPTED PRIVATE KEY" => Err(CryptoError::InvalidKey(
                "encrypted private keys are not supported".to_string(),
            )),
            other => Err(CryptoError::InvalidKey(format!(
                "unsupported PEM block: {other}"
            ))),
        }
    }

    /// Returns which half of the key pair this is.
    #[must_use]
    pub const fn kind(&self) -> KeyKind {
        match self {
            Self::Private(_) => KeyKind::Private,
            Self::Public(_) => KeyKind::Public,
        }
    }

    /// Returns the modulus size in bits.
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        match self {
            Self::Private(key) => key.n().bits(),
            Self::Public(key) => key.n().bits(),
        }
    }
}

/// Returns the label of the first `-----BEGIN ...-----` line.
fn pem_label(pem: &str) -> Option<&str> {
    const BEGIN: &str = "-----BEGIN ";
    let start = pem.find(BEGIN)? + BEGIN.len();
    let end = pem[start..].find("-----")?;
    Some(pem[start..start + end].trim())
}

/// Extracts the RSA public key from a PEM certificate.
fn public_key_from_certificate(pem: &[u8]) -> CryptoResult<RsaPublicKey> {
    let (_, block) = x509_parser::pem::parse_x509_pem(pem)
        .map_err(|e| CryptoError::InvalidKey(format!("invalid certificate PEM: {e}")))?;
    let certificate = block
        .parse_x509()
        .map_err(|e| CryptoError::InvalidKey(format!("invalid X.509 certificate: {e}")))?;

    RsaPublicKey::from_public_key_der(certificate.public_key().raw)
        .map_err(|e| CryptoError::InvalidKey(format!("certificate does not hold an RSA key: {e}")))
}

/// An algorithm-bound key that signs, verifies and generates session keys.
#[derive(Debug, Clone)]
pub struct SecurityKey {
    algorithm: Algorithm,
    hash: HashAlgorithm,
    pss: Option<PssOptions>,
    key: Option<LoadedKey>,
}

impl SecurityKey {
    /// Creates an unloaded key for the given algorithm.
    ///
    /// The signing hash follows the algorithm (RSA-SHA256 signs with
    /// SHA-256); algorithms without a hash fall back to SHA-1. The
    /// `sha256-rsa-MGF1` algorithm enables PSS with SHA-256.
    #[must_use]
    pub fn new(algorithm: Algorithm) -> Self {
        let hash = algorithm.hash().unwrap_or(HashAlgorithm::Sha1);
        let pss = algorithm.is_pss().then(|| PssOptions::new(hash));
        Self {
            algorithm,
            hash,
            pss,
            key: None,
        }
    }

    /// Creates a key from an algorithm URI.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownAlgorithm`] for unregistered URIs.
    pub fn for_uri(uri: &str) -> CryptoResult<Self> {
        Algorithm::parse(uri).map(Self::new)
    }

    /// Creates a key and loads PEM material in one step.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the PEM cannot be parsed.
    pub fn from_pem(algorithm: Algorithm, pem: &[u8]) -> CryptoResult<Self> {
        let mut key = Self::new(algorithm);
        key.load_key(pem)?;
        Ok(key)
    }

    /// Sets the PKCS#1 v1.5 signing hash.
    #[must_use]
    pub const fn with_hash(mut self, hash: HashAlgorithm) -> Self {
        self.hash = hash;
        self
    }

    /// Enables PSS padding with the given parameters.
    #[must_use]
    pub const fn with_pss(mut self, options: PssOptions) -> Self {
        self.pss = Some(options);
        self
    }

    /// Returns the configured algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Returns the PKCS#1 v1.5 signing hash.
    #[must_use]
    pub const fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    /// Returns the PSS parameters, if PSS is enabled.
    #[must_use]
    pub const fn pss(&self) -> Option<PssOptions> {
        self.pss
    }

    /// Returns the kind of the loaded key, if any.
    #[must_use]
    pub fn kind(&self) -> Option<KeyKind> {
        self.key.as_ref().map(LoadedKey::kind)
    }

    /// Returns the loaded key material, if any.
    #[must_use]
    pub const fn loaded(&self) -> Option<&LoadedKey> {
        self.key.as_ref()
    }

    /// Loads PEM key material, replacing whatever was loaded before.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] if the PEM cannot be parsed. The
    /// previously loaded key is kept in that case.
    pub fn load_key(&mut self, pem: &[u8]) -> CryptoResult<KeyKind> {
        let key = LoadedKey::from_pem(pem)?;
        let kind = key.kind();
        tracing::debug!(
            kind = kind.as_str(),
            bits = key.modulus_bits(),
            algorithm = self.algorithm.uri(),
            "key loaded"
        );
        self.key = Some(key);
        Ok(kind)
    }

    fn ensure_rsa_signature(&self) -> CryptoResult<()> {
        if self.algorithm.is_rsa_signature() {
            Ok(())
        } else {
            Err(CryptoError::UnsupportedAlgorithm(self.algorithm.uri().to_string()))
        }
    }

    fn private_key(&self) -> CryptoResult<&RsaPrivateKey> {
        match &self.key {
            None => Err(CryptoError::KeyNotLoaded),
            Some(LoadedKey::Private(key)) => Ok(key),
            Some(LoadedKey::Public(_)) => Err(CryptoError::WrongKeyKind {
                expected: KeyKind::Private.as_str(),
                actual: KeyKind::Public.as_str(),
            }),
        }
    }

    fn public_key(&self) -> CryptoResult<&RsaPublicKey> {
        match &self.key {
            None => Err(CryptoError::KeyNotLoaded),
            Some(LoadedKey::Public(key)) => Ok(key),
            Some(LoadedKey::Private(_)) => Err(CryptoError::WrongKeyKind {
                expected: KeyKind::Public.as_str(),
                actual: KeyKind::Private.as_str(),
            }),
        }
    }

    /// Signs raw bytes and returns the binary signature.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::KeyNotLoaded`] / [`CryptoError::WrongKeyKind`] unless
    ///   a private key is loaded
    /// - [`CryptoError::UnsupportedAlgorithm`] for non-RSA algorithms
    /// - [`CryptoError::Encoding`] / [`CryptoError::Signing`] if the RSA
    ///   operation fails
    pub fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let key = self.private_key()?;
        self.ensure_rsa_signature()?;

        match self.pss {
            Some(options) => sign_pss(key, data, options),
            None => {
                if self.hash == HashAlgorithm::Sha1 {
                    tracing::warn!(algorithm = self.algorithm.uri(), "signing with legacy SHA-1");
                }
                let hashed = digest(self.hash, data);
                Ok(key.sign_with_rng(&mut OsRng, pkcs1v15_scheme(self.hash), &hashed)?)
            }
        }
    }

    /// Verifies a binary signature over raw bytes.
    ///
    /// Returns `Ok(false)` when the signature does not match, including
    /// signatures that are structurally invalid.
    ///
    /// # Errors
    ///
    /// - [`CryptoError::KeyNotLoaded`] / [`CryptoError::WrongKeyKind`] unless
    ///   a public key or certificate is loaded
    /// - [`CryptoError::UnsupportedAlgorithm`] for non-RSA algorithms
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        let key = self.public_key()?;
        self.ensure_rsa_signature()?;

        let valid = match self.pss {
            Some(options) => verify_pss(key, data, signature, options),
            None => {
                let hashed = digest(self.hash, data);
                key.verify(pkcs1v15_scheme(self.hash), &hashed, signature)
                    .is_ok()
            }
        };
        Ok(valid)
    }

    /// Generates a random symmetric session key for a block cipher algorithm.
    ///
    /// Triple-DES keys get odd parity in every byte; all other algorithms
    /// return the random bytes unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::UnknownKeySize`] if the algorithm is not a
    /// block cipher.
    pub fn generate_session_key(&self) -> CryptoResult<Zeroizing<Vec<u8>>> {
        let size = self
            .algorithm
            .key_size()
            .ok_or_else(|| CryptoError::UnknownKeySize(self.algorithm.uri().to_string()))?;

        let mut key = Zeroizing::new(random_bytes(size));
        if self.algorithm == Algorithm::TripleDesCbc {
            fix_des_parity(&mut key);
        }

        tracing::debug!(algorithm = self.algorithm.uri(), len = size, "session key generated");
        Ok(key)
    }
}

impl SignatureProvider for SecurityKey {
    fn sign(&self, data: &[u8]) -> CryptoResult<Vec<u8>> {
        Self::sign(self, data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> CryptoResult<bool> {
        Self::verify(self, data, signature)
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

fn pkcs1v15_scheme(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<sha2::Sha224>(),
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
    }
}

/// Left-pads a big-endian integer to `len` bytes.
fn i2osp(value: &BigUint, len: usize) -> Option<Vec<u8>> {
    let bytes = value.to_bytes_be();
    if bytes.len() > len {
        return None;
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(&bytes);
    Some(out)
}

fn sign_pss(key: &RsaPrivateKey, data: &[u8], options: PssOptions) -> CryptoResult<Vec<u8>> {
    let em_bits = key.n().bits() - 1;
    let m_hash = digest(options.hash, data);
    let mut salt = vec![0u8; options.salt_length];
    rand::rng().fill(&mut salt[..]);

    let em = pss::encode(&m_hash, em_bits, &salt, options.hash, options.mgf_hash)?;
    let m = BigUint::from_bytes_be(&em);
    let s = rsa_decrypt_and_check(key, Some(&mut OsRng), &m)?;

    i2osp(&s, key.size())
        .ok_or_else(|| CryptoError::Signing("signature longer than modulus".to_string()))
}

fn verify_pss(key: &RsaPublicKey, data: &[u8], signature: &[u8], options: PssOptions) -> bool {
    if signature.len() != key.size() {
        return false;
    }
    let s = BigUint::from_bytes_be(signature);
    if &s >= key.n() {
        return false;
    }
    let Ok(m) = rsa_encrypt(key, &s) else {
        return false;
    };

    let em_bits = key.n().bits() - 1;
    let Some(em) = i2osp(&m, em_bits.div_ceil(8)) else {
        return false;
    };

    let m_hash = digest(options.hash, data);
    pss::verify(&m_hash, &em, em_bits, options.salt_length, options.hash, options.mgf_hash)
}
