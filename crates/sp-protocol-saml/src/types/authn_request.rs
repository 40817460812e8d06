//! SAML AuthnRequest types.
//!
//! Authentication request message sent by a service provider to an identity provider.

use base64::Engine;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::bindings::deflate_compress;
use crate::builder::{AuthnRequestBuilder, DocumentBuilder};
use crate::error::SamlResult;
use crate::settings::Settings;

/// Formats a timestamp in SAML's canonical UTC form, `YYYY-MM-DDTHH:MM:SSZ`.
#[must_use]
pub fn to_saml_time(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Returns the current time truncated to whole seconds.
pub(crate) fn saml_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

/// Per-request options for building an AuthnRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnRequestOptions {
    /// Whether the IdP must authenticate the user directly.
    pub force_authn: bool,
    /// Whether the IdP must not interact with the user.
    pub is_passive: bool,
    /// Whether to include a `NameIDPolicy` element.
    pub set_name_id_policy: bool,
    /// Subject the IdP should authenticate, if known.
    pub name_id_value: Option<String>,
}

impl Default for AuthnRequestOptions {
    fn default() -> Self {
        Self {
            force_authn: false,
            is_passive: false,
            set_name_id_policy: true,
            name_id_value: None,
        }
    }
}

impl AuthnRequestOptions {
    /// Sets force authentication.
    #[must_use]
    pub const fn force_authn(mut self, force: bool) -> Self {
        self.force_authn = force;
        self
    }

    /// Sets passive authentication.
    #[must_use]
    pub const fn is_passive(mut self, passive: bool) -> Self {
        self.is_passive = passive;
        self
    }

    /// Sets whether a NameID policy is requested.
    #[must_use]
    pub const fn set_name_id_policy(mut self, set: bool) -> Self {
        self.set_name_id_policy = set;
        self
    }

    /// Sets the requested subject.
    #[must_use]
    pub fn with_name_id(mut self, value: impl Into<String>) -> Self {
        self.name_id_value = Some(value.into());
        self
    }
}

/// A built SAML Authentication Request.
///
/// Immutable once built: the identifier, issue instant and serialized XML
/// never change. Persisting the identifier for response correlation is up to
/// the caller.
#[derive(Debug, Clone)]
pub struct AuthnRequest {
    id: String,
    issue_instant: DateTime<Utc>,
    xml: String,
    compress_requests: bool,
}

impl AuthnRequest {
    /// Builds a request from settings.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`](crate::SamlError::Configuration)
    /// if a required setting is missing, or an XML error if the vendor
    /// extension configuration cannot be rendered.
    pub fn new(settings: &Settings, options: AuthnRequestOptions) -> SamlResult<Self> {
        AuthnRequestBuilder::new(settings, options)?.build()
    }

    pub(crate) fn from_parts(
        id: String,
        issue_instant: DateTime<Utc>,
        xml: String,
        compress_requests: bool,
    ) -> Self {
        Self {
            id,
            issue_instant,
            xml,
            compress_requests,
        }
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the issue instant.
    #[must_use]
    pub const fn issue_instant(&self) -> DateTime<Utc> {
        self.issue_instant
    }

    /// Returns the serialized XML.
    #[must_use]
    pub fn xml(&self) -> &str {
        &self.xml
    }

    /// Returns the base64 transport encoding of the request.
    ///
    /// With `deflate` set the XML is raw-DEFLATE compressed first, as the
    /// HTTP-Redirect binding requires. `None` defers to the settings'
    /// `compress.requests` flag.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Deflate`](crate::SamlError::Deflate) if
    /// compression fails.
    pub fn get_request(&self, deflate: Option<bool>) -> SamlResult<String> {
        let engine = base64::engine::general_purpose::STANDARD;
        if deflate.unwrap_or(self.compress_requests) {
            Ok(engine.encode(deflate_compress(self.xml.as_bytes())?))
        } else {
            Ok(engine.encode(self.xml.as_bytes()))
        }
    }
}

/// Authentication context comparison methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthnContextComparison {
    /// Exact match required.
    #[default]
    Exact,
    /// Match must be at least as strong.
    Minimum,
    /// Match must be at most as strong.
    Maximum,
    /// Match must be stronger.
    Better,
}

impl AuthnContextComparison {
    /// Returns the string value for this comparison.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Better => "better",
        }
    }
}
