//! Cryptographically secure random generation.
//!
//! Used for SAML message identifiers and symmetric session keys.

use rand::Rng;

/// Length of the random part of a message identifier, in bytes.
const UNIQUE_ID_BYTES: usize = 20;

/// Generates a cryptographically secure random byte array.
///
/// Uses the thread-local random number generator which is cryptographically
/// secure by default.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Generates a SAML message identifier.
///
/// The identifier is an underscore followed by 40 lowercase hex digits, so
/// it always starts with a letter-like character and is a valid `xs:ID`.
#[must_use]
pub fn generate_unique_id() -> String {
    format!("_{}", hex::encode(random_bytes(UNIQUE_ID_BYTES)))
}

/// Forces odd parity on every byte of a DES key.
///
/// The low bit of each byte is the parity bit; the upper seven bits are
/// left unchanged.
pub fn fix_des_parity(key: &mut [u8]) {
    for byte in key.iter_mut() {
        let upper = *byte & 0xFE;
        // odd parity: the total number of set bits must be odd
        *byte = if upper.count_ones() % 2 == 0 { upper | 0x01 } else { upper };
    }
}
