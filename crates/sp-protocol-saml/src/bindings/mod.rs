//! SAML bindings implementation.
//!
//! This module implements the SAML 2.0 bindings used to hand an
//! `AuthnRequest` to the identity provider:
//!
//! - **HTTP-POST Binding** - The request is base64-encoded and sent in an HTML form
//! - **HTTP-Redirect Binding** - The request is deflated, base64-encoded, and URL-encoded;
//!   an optional signature covers the query string
//!
//! # Usage
//!
//! ```rust,ignore
//! use sp_protocol_saml::bindings::{HttpPostBinding, HttpRedirectBinding};
//!
//! let html = HttpPostBinding::encode_request(&request, "https://idp.example.org/sso", Some("state"));
//! let url = HttpRedirectBinding::encode_request(&request, "https://idp.example.org/sso", None, Some(&key))?;
//! ```

mod post;
mod redirect;

pub use post::*;
pub use redirect::*;

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::error::{SamlError, SamlResult};

/// Upper bound for inflated messages, guarding against deflate bombs.
const MAX_INFLATED_SIZE: u64 = 1024 * 1024;

/// Form and query parameter carrying the request.
pub const SAML_REQUEST_PARAM: &str = "SAMLRequest";

/// Decoded SAML binding message.
#[derive(Debug, Clone)]
pub struct DecodedMessage {
    /// The decoded XML message.
    pub xml: String,
    /// The RelayState if present.
    pub relay_state: Option<String>,
    /// The base64 signature (redirect binding only).
    pub signature: Option<String>,
    /// The signature algorithm URI (redirect binding only).
    pub sig_alg: Option<String>,
}

/// Compresses data using DEFLATE (raw, no zlib header).
pub(crate) fn deflate_compress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| SamlError::Deflate(format!("compression error: {e}")))?;
    encoder
        .finish()
        .map_err(|e| SamlError::Deflate(format!("compression finish error: {e}")))
}

/// Decompresses raw DEFLATE data of at most [`MAX_INFLATED_SIZE`] bytes.
pub(crate) fn deflate_decompress(data: &[u8]) -> SamlResult<Vec<u8>> {
    let mut decompressed = Vec::new();
    DeflateDecoder::new(data)
        .take(MAX_INFLATED_SIZE + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| SamlError::Deflate(format!("decompression error: {e}")))?;

    if decompressed.len() as u64 > MAX_INFLATED_SIZE {
        return Err(SamlError::Deflate(format!(
            "inflated message exceeds {MAX_INFLATED_SIZE} bytes"
        )));
    }
    Ok(decompressed)
}
