//! EMSA-PSS encoding (RFC 8017, section 9.1).
//!
//! The message digest and the MGF1 digest are chosen independently, which
//! the high-level `rsa::pss` API does not allow. The RSA primitive itself is
//! applied by the caller.

use crate::algorithm::HashAlgorithm;
use crate::error::{CryptoError, CryptoResult};
use crate::hash::digest;

/// MGF1 mask generation.
pub(crate) fn mgf1(hash: HashAlgorithm, seed: &[u8], len: usize) -> Vec<u8> {
    let mut mask = Vec::with_capacity(len + hash.output_len());
    let mut counter: u32 = 0;
    while mask.len() < len {
        let mut block = Vec::with_capacity(seed.len() + 4);
        block.extend_from_slice(seed);
        block.extend_from_slice(&counter.to_be_bytes());
        mask.extend_from_slice(&digest(hash, &block));
        counter += 1;
    }
    mask.truncate(len);
    mask
}

/// Digest of `0x00 * 8 || m_hash || salt`.
fn salted_digest(hash: HashAlgorithm, m_hash: &[u8], salt: &[u8]) -> Vec<u8> {
    let mut m_prime = Vec::with_capacity(8 + m_hash.len() + salt.len());
    m_prime.extend_from_slice(&[0u8; 8]);
    m_prime.extend_from_slice(m_hash);
    m_prime.extend_from_slice(salt);
    digest(hash, &m_prime)
}

/// Number of leading bits of the first octet that must be zero.
fn unused_bits(em_len: usize, em_bits: usize) -> u32 {
    // em_len is ceil(em_bits / 8), so this is always in 0..8
    (8 * em_len - em_bits) as u32
}

/// Produces the encoded message `EM` for a message digest.
pub(crate) fn encode(
    m_hash: &[u8],
    em_bits: usize,
    salt: &[u8],
    hash: HashAlgorithm,
    mgf_hash: HashAlgorithm,
) -> CryptoResult<Vec<u8>> {
    let h_len = hash.output_len();
    let s_len = salt.len();
    let em_len = em_bits.div_ceil(8);

    if m_hash.len() != h_len {
        return Err(CryptoError::Encoding(format!(
            "message digest is {} bytes, {} expects {h_len}",
            m_hash.len(),
            hash.name()
        )));
    }
    if em_len < h_len + s_len + 2 {
        return Err(CryptoError::Encoding(format!(
            "modulus too small for {} with a {s_len}-byte salt",
            hash.name()
        )));
    }

    let h = salted_digest(hash, m_hash, salt);

    let db_len = em_len - h_len - 1;
    let mut db = vec![0u8; db_len];
    db[db_len - s_len - 1] = 0x01;
    db[db_len - s_len..].copy_from_slice(salt);

    let mask = mgf1(mgf_hash, &h, db_len);
    for (byte, mask_byte) in db.iter_mut().zip(mask) {
        *byte ^= mask_byte;
    }
    db[0] &= 0xFFu8 >> unused_bits(em_len, em_bits);

    let mut em = db;
    em.extend_from_slice(&h);
    em.push(0xBC);
    Ok(em)
}

/// Checks an encoded message against a message digest.
///
/// Returns false for any inconsistency; the reason is not reported.
pub(crate) fn verify(
    m_hash: &[u8],
    em: &[u8],
    em_bits: usize,
    salt_len: usize,
    hash: HashAlgorithm,
    mgf_hash: HashAlgorithm,
) -> bool {
    let h_len = hash.output_len();
    let em_len = em_bits.div_ceil(8);

    if m_hash.len() != h_len || em.len() != em_len {
        return false;
    }
    if em_len < h_len + salt_len + 2 {
        return false;
    }
    if em[em_len - 1] != 0xBC {
        return false;
    }

    let db_len = em_len - h_len - 1;
    let (masked_db, rest) = em.split_at(db_len);
    let h = &rest[..h_len];

    let top_mask = 0xFFu8 >> unused_bits(em_len, em_bits);
    if masked_db[0] & !top_mask != 0 {
        return false;
    }

    let mask = mgf1(mgf_hash, h, db_len);
    let mut db: Vec<u8> = masked_db.iter().zip(mask).map(|(b, m)| b ^ m).collect();
    db[0] &= top_mask;

    let separator = db_len - salt_len - 1;
    if db[..separator].iter().any(|b| *b != 0) || db[separator] != 0x01 {
        return false;
    }

    let salt = &db[db_len - salt_len..];
    salted_digest(hash, m_hash, salt) == h
}
