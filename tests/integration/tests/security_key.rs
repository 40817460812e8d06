//! Key loading and signature tests.
//!
//! Known-answer signatures were produced with OpenSSL over `payload.txt`
//! using `sp_key.pem`.

use sp_crypto::{Algorithm, CryptoError, HashAlgorithm, KeyKind, PssOptions, SecurityKey};

use crate::common::{base64_fixture, fixture, init_tracing};

fn loaded(algorithm: Algorithm, pem: &str) -> anyhow::Result<SecurityKey> {
    Ok(SecurityKey::from_pem(algorithm, &fixture(pem)?)?)
}

/// Tests an OpenSSL PSS signature with an MGF1 hash differing from the digest.
#[test]
fn test_pss_known_answer() -> anyhow::Result<()> {
    init_tracing();
    let payload = fixture("payload.txt")?;
    let signature = base64_fixture("pss_sha256_mgf1sha1_salt20.b64")?;
    let options = PssOptions::new(HashAlgorithm::Sha256)
        .with_mgf_hash(HashAlgorithm::Sha1)
        .with_salt_length(20);

    for pem in ["sp_pub.pem", "sp_cert.pem"] {
        let key = loaded(Algorithm::RsaSha256Mgf1, pem)?.with_pss(options);
        assert!(key.verify(&payload, &signature)?, "{pem}");
    }

    // same signature, MGF1 over SHA-256 as the algorithm default
    let default = loaded(Algorithm::RsaSha256Mgf1, "sp_pub.pem")?;
    assert!(!default.verify(&payload, &signature)?);

    Ok(())
}

/// Tests PKCS#1 v1.5 with SHA-1 against OpenSSL, both ways.
#[test]
fn test_pkcs1_sha1_known_answer() -> anyhow::Result<()> {
    let payload = fixture("payload.txt")?;
    let expected = base64_fixture("pkcs1_sha1.b64")?;

    let public = loaded(Algorithm::RsaSha1, "sp_pub.pem")?;
    assert!(public.verify(&payload, &expected)?);

    // PKCS#1 v1.5 is deterministic
    let private = loaded(Algorithm::RsaSha1, "sp_key.pem")?;
    assert_eq!(private.sign(&payload)?, expected);

    Ok(())
}

/// Tests PKCS#8 and PKCS#1 private keys produce the same signatures.
#[test]
fn test_private_key_formats() -> anyhow::Result<()> {
    let payload = fixture("payload.txt")?;
    let pkcs8 = loaded(Algorithm::RsaSha256, "sp_key.pem")?;
    let pkcs1 = loaded(Algorithm::RsaSha256, "sp_key_pkcs1.pem")?;

    assert_eq!(pkcs8.kind(), Some(KeyKind::Private));
    assert_eq!(pkcs1.kind(), Some(KeyKind::Private));
    assert_eq!(pkcs8.sign(&payload)?, pkcs1.sign(&payload)?);

    Ok(())
}

/// Tests sign/verify over empty, single-byte and large payloads.
#[test]
fn test_payload_sizes() -> anyhow::Result<()> {
    let large: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
    let payloads: [&[u8]; 3] = [b"", b"x", &large];

    for algorithm in [Algorithm::RsaSha256, Algorithm::RsaSha512, Algorithm::RsaSha256Mgf1] {
        let private = loaded(algorithm, "sp_key.pem")?;
        let public = loaded(algorithm, "sp_cert.pem")?;
        for payload in payloads {
            let signature = private.sign(payload)?;
            assert_eq!(signature.len(), 256);
            assert!(public.verify(payload, &signature)?, "{algorithm} / {} bytes", payload.len());
        }
    }

    Ok(())
}

/// Tests that mismatched keys and altered data do not verify.
#[test]
fn test_verification_failures() -> anyhow::Result<()> {
    let private = loaded(Algorithm::RsaSha256, "sp_key.pem")?;
    let signature = private.sign(b"message")?;

    let other = loaded(Algorithm::RsaSha256, "other_pub.pem")?;
    assert!(!other.verify(b"message", &signature)?);

    let public = loaded(Algorithm::RsaSha256, "sp_pub.pem")?;
    assert!(!public.verify(b"messagE", &signature)?);

    let mut flipped = signature.clone();
    flipped[0] ^= 0x01;
    assert!(!public.verify(b"message", &flipped)?);
    assert!(!public.verify(b"message", &signature[..128])?);

    Ok(())
}

/// Tests that operations check which half of the key pair is loaded.
#[test]
fn test_key_kind_checks() -> anyhow::Result<()> {
    let unloaded = SecurityKey::new(Algorithm::RsaSha256);
    assert!(matches!(unloaded.sign(b"data"), Err(CryptoError::KeyNotLoaded)));
    assert!(matches!(unloaded.verify(b"data", b"sig"), Err(CryptoError::KeyNotLoaded)));

    let private = loaded(Algorithm::RsaSha256, "other_key.pem")?;
    let err = private.verify(b"data", b"sig").err();
    assert!(matches!(err, Some(CryptoError::WrongKeyKind { expected: "public", .. })));

    let public = loaded(Algorithm::RsaSha256, "other_pub.pem")?;
    let err = public.sign(b"data").err();
    assert!(matches!(err, Some(CryptoError::WrongKeyKind { expected: "private", .. })));

    let mut key = SecurityKey::new(Algorithm::RsaSha256);
    assert_eq!(key.load_key(&fixture("sp_cert.pem")?)?, KeyKind::Public);
    assert!(matches!(
        key.load_key(b"-----BEGIN GARBAGE-----\n-----END GARBAGE-----\n"),
        Err(CryptoError::InvalidKey(_))
    ));
    // a failed load keeps the previous key
    assert_eq!(key.kind(), Some(KeyKind::Public));

    Ok(())
}

/// Tests session key sizes and Triple-DES parity.
#[test]
fn test_session_keys() -> anyhow::Result<()> {
    let des = SecurityKey::new(Algorithm::TripleDesCbc).generate_session_key()?;
    assert_eq!(des.len(), 24);
    assert!(des.iter().all(|b| b.count_ones() % 2 == 1));

    let aes = SecurityKey::new(Algorithm::Aes256Gcm).generate_session_key()?;
    assert_eq!(aes.len(), 32);

    let err = SecurityKey::new(Algorithm::RsaSha256)
        .generate_session_key()
        .err()
        .ok_or_else(|| anyhow::anyhow!("signature algorithm produced a session key"))?;
    assert_eq!(
        err.to_string(),
        format!("unknown key size for type \"{}\"", Algorithm::RsaSha256.uri())
    );

    Ok(())
}
