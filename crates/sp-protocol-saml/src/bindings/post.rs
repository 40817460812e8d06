//! HTTP-POST Binding implementation.
//!
//! Implements the SAML 2.0 HTTP-POST binding for sending an `AuthnRequest`
//! via an auto-submitting HTML form.

use crate::error::SamlResult;
use crate::types::AuthnRequest;

use super::SAML_REQUEST_PARAM;

/// HTTP-POST binding encoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Encodes a request for HTTP-POST binding.
    ///
    /// Returns an HTML form that will auto-submit to the destination. The
    /// request is base64-encoded without compression.
    ///
    /// # Errors
    ///
    /// Returns an error if transport encoding fails.
    pub fn encode_request(
        request: &AuthnRequest,
        destination: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let encoded = request.get_request(Some(false))?;

        let relay_state_input = relay_state
            .map(|rs| {
                format!(
                    r#"<input type="hidden" name="RelayState" value="{}"/>"#,
                    html_escape(rs)
                )
            })
            .unwrap_or_default();

        tracing::debug!(request_id = %request.id(), destination, "POST form rendered");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>SAML POST Binding</title>
</head>
<body onload="document.forms[0].submit()">
    <noscript>
        <p>JavaScript is disabled. Click the button below to continue.</p>
    </noscript>
    <form method="post" action="{}">
        <input type="hidden" name="{}" value="{}"/>
        {}
        <noscript>
            <input type="submit" value="Continue"/>
        </noscript>
    </form>
</body>
</html>"#,
            html_escape(destination),
            SAML_REQUEST_PARAM,
            encoded,
            relay_state_input
        ))
    }
}

/// Escapes HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
