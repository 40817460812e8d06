//! HTTP-Redirect Binding implementation.
//!
//! Implements the SAML 2.0 HTTP-Redirect binding for sending an
//! `AuthnRequest` via URL query parameters with DEFLATE compression.
//!
//! When signed, the signature covers the octets
//! `SAMLRequest=<v>[&RelayState=<v>]&SigAlg=<v>` exactly as they appear in the
//! query string, with values URL-encoded.

use base64::Engine;
use sp_crypto::SignatureProvider;

use crate::error::{SamlError, SamlResult};
use crate::types::AuthnRequest;

use super::{deflate_decompress, DecodedMessage, SAML_REQUEST_PARAM};

const RELAY_STATE_PARAM: &str = "RelayState";
const SIG_ALG_PARAM: &str = "SigAlg";
const SIGNATURE_PARAM: &str = "Signature";

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Encodes a request for HTTP-Redirect binding.
    ///
    /// The request is always deflated, whatever the compression setting.
    /// With a signer, `SigAlg` and `Signature` are appended.
    ///
    /// # Errors
    ///
    /// Returns an error if compression or signing fails.
    pub fn encode_request(
        request: &AuthnRequest,
        destination: &str,
        relay_state: Option<&str>,
        signer: Option<&dyn SignatureProvider>,
    ) -> SamlResult<String> {
        let encoded = request.get_request(Some(true))?;

        let mut query = format!("{SAML_REQUEST_PARAM}={}", urlencoding::encode(&encoded));
        if let Some(rs) = relay_state {
            query.push_str(&format!("&{RELAY_STATE_PARAM}={}", urlencoding::encode(rs)));
        }

        if let Some(signer) = signer {
            let sig_alg = signer.algorithm().uri();
            query.push_str(&format!("&{SIG_ALG_PARAM}={}", urlencoding::encode(sig_alg)));

            let signature = signer.sign(query.as_bytes())?;
            let signature = base64::engine::general_purpose::STANDARD.encode(signature);
            query.push_str(&format!(
                "&{SIGNATURE_PARAM}={}",
                urlencoding::encode(&signature)
            ));
            tracing::debug!(request_id = %request.id(), sig_alg, "redirect request signed");
        }

        let separator = if destination.contains('?') { '&' } else { '?' };
        Ok(format!("{destination}{separator}{query}"))
    }

    /// Decodes a request from HTTP-Redirect query parameters.
    ///
    /// Values are expected URL-decoded, as a web framework hands them over.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is missing, not base64, does not
    /// inflate, or is not UTF-8.
    pub fn decode(
        saml_request: Option<&str>,
        relay_state: Option<&str>,
        signature: Option<&str>,
        sig_alg: Option<&str>,
    ) -> SamlResult<DecodedMessage> {
        let encoded = saml_request.ok_or_else(|| {
            SamlError::InvalidRequest(format!("no {SAML_REQUEST_PARAM} parameter"))
        })?;

        let compressed = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        let xml_bytes = deflate_decompress(&compressed)?;
        let xml = String::from_utf8(xml_bytes)
            .map_err(|e| SamlError::InvalidRequest(format!("invalid UTF-8 in message: {e}")))?;

        Ok(DecodedMessage {
            xml,
            relay_state: relay_state.map(String::from),
            signature: signature.map(String::from),
            sig_alg: sig_alg.map(String::from),
        })
    }

    /// Decodes a request from a full URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse, repeats a binding
    /// parameter, or the request does not decode.
    pub fn decode_url(url: &str) -> SamlResult<DecodedMessage> {
        let parsed = parse_url(url)?;
        let params = RedirectQuery::parse(parsed.query().unwrap_or_default())?;
        params.decode()
    }

    /// Extracts the signed portion of a redirect URL's query string.
    ///
    /// Parameters are taken in their raw, still URL-encoded form and joined
    /// in protocol order regardless of their order in the URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL does not parse, repeats a binding
    /// parameter, or lacks `SAMLRequest` or `SigAlg`.
    pub fn extract_signed_query(url: &str) -> SamlResult<String> {
        let parsed = parse_url(url)?;
        RedirectQuery::parse(parsed.query().unwrap_or_default())?.signed_octets()
    }

    /// Verifies the query signature of a redirect URL.
    ///
    /// Returns `Ok(false)` if the signature does not match or `SigAlg`
    /// names a different algorithm than the verifier's.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is unsigned or malformed, repeats a
    /// binding parameter, or the verifier has no key.
    pub fn verify_url_signature(url: &str, verifier: &dyn SignatureProvider) -> SamlResult<bool> {
        let parsed = parse_url(url)?;
        let params = RedirectQuery::parse(parsed.query().unwrap_or_default())?;
        let decoded = params.decode()?;

        let signature = decoded
            .signature
            .ok_or_else(|| SamlError::InvalidRequest(format!("no {SIGNATURE_PARAM} parameter")))?;
        let sig_alg = decoded.sig_alg.unwrap_or_default();

        if sig_alg != verifier.algorithm().uri() {
            tracing::warn!(
                sig_alg = %sig_alg,
                expected = verifier.algorithm().uri(),
                "redirect signature algorithm mismatch"
            );
            return Ok(false);
        }

        let signed = params.signed_octets()?;
        let signature = base64::engine::general_purpose::STANDARD.decode(signature)?;
        Ok(verifier.verify(signed.as_bytes(), &signature)?)
    }
}

fn parse_url(url: &str) -> SamlResult<url::Url> {
    url::Url::parse(url).map_err(|e| SamlError::InvalidRequest(format!("invalid URL: {e}")))
}

/// A binding parameter as it appears in the query and URL-decoded.
struct QueryParam<'q> {
    raw: &'q str,
    value: String,
}

/// The binding parameters of one redirect query.
///
/// Both the signed octets and the decoded message come from these pairs,
/// and each parameter appears at most once.
#[derive(Default)]
struct RedirectQuery<'q> {
    saml_request: Option<QueryParam<'q>>,
    relay_state: Option<QueryParam<'q>>,
    sig_alg: Option<QueryParam<'q>>,
    signature: Option<QueryParam<'q>>,
}

impl<'q> RedirectQuery<'q> {
    fn parse(query: &'q str) -> SamlResult<Self> {
        let mut params = Self::default();
        for raw in query.split('&').filter(|pair| !pair.is_empty()) {
            let Some((key, value)) = url::form_urlencoded::parse(raw.as_bytes()).next() else {
                continue;
            };
            let slot = match key.as_ref() {
                SAML_REQUEST_PARAM => &mut params.saml_request,
                RELAY_STATE_PARAM => &mut params.relay_state,
                SIG_ALG_PARAM => &mut params.sig_alg,
                SIGNATURE_PARAM => &mut params.signature,
                _ => continue,
            };
            if slot.is_some() {
                return Err(SamlError::InvalidRequest(format!("duplicate {key} parameter")));
            }
            *slot = Some(QueryParam {
                raw,
                value: value.into_owned(),
            });
        }
        Ok(params)
    }

    fn value<'a>(param: Option<&'a QueryParam<'_>>) -> Option<&'a str> {
        param.map(|p| p.value.as_str())
    }

    fn decode(&self) -> SamlResult<DecodedMessage> {
        HttpRedirectBinding::decode(
            Self::value(self.saml_request.as_ref()),
            Self::value(self.relay_state.as_ref()),
            Self::value(self.signature.as_ref()),
            Self::value(self.sig_alg.as_ref()),
        )
    }

    fn signed_octets(&self) -> SamlResult<String> {
        let request = self.saml_request.as_ref().ok_or_else(|| {
            SamlError::InvalidRequest(format!("no {SAML_REQUEST_PARAM} parameter"))
        })?;
        let sig_alg = self
            .sig_alg
            .as_ref()
            .ok_or_else(|| SamlError::InvalidRequest(format!("no {SIG_ALG_PARAM} parameter")))?;

        let mut signed = request.raw.to_string();
        if let Some(relay_state) = &self.relay_state {
            signed.push('&');
            signed.push_str(relay_state.raw);
        }
        signed.push('&');
        signed.push_str(sig_alg.raw);
        Ok(signed)
    }
}
