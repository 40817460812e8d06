//! Service provider settings.
//!
//! The settings tree has five sections: `sp`, `idp`, `compress`, `security`
//! and `debug`. Keys are camelCase except where
//! the established configuration format uses other spellings (`NameIDFormat`,
//! `x509cert`, `encryption_algorithm`, the PascalCase display information).
//!
//! Settings are read-only input. Parsing fills in defaults but does not
//! validate; the accessors used by the request builder report a missing
//! required field as [`SamlError::Configuration`].

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use sp_crypto::algorithm::{self, digest_uris};
use sp_crypto::Algorithm;

use crate::error::{SamlError, SamlResult};
use crate::types::{AuthnContextClass, AuthnContextComparison, NameIdFormat, SamlBinding};

/// A loosely typed configuration value.
///
/// Vendor extension settings mix scalars, booleans and nested attribute maps;
/// this is the closed set of shapes they may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// A string or number, kept as text.
    Scalar(String),
    /// A boolean.
    Flag(bool),
    /// An ordered map of further values.
    Nested(IndexMap<String, ConfigValue>),
}

impl ConfigValue {
    /// Returns the XML text for a scalar or boolean value.
    ///
    /// Booleans render as `"true"` / `"false"`. Nested maps have no text form.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Flag(true) => Some("true"),
            Self::Flag(false) => Some("false"),
            Self::Nested(_) => None,
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<IndexMap<String, ConfigValue>> for ConfigValue {
    fn from(value: IndexMap<String, ConfigValue>) -> Self {
        Self::Nested(value)
    }
}

struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string, number, boolean or map")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ConfigValue::Flag(v))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(ConfigValue::Scalar(v))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, value)) = map.next_entry::<String, ConfigValue>()? {
            entries.insert(key, value);
        }
        Ok(ConfigValue::Nested(entries))
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ConfigValueVisitor)
    }
}

/// Accepts a string or a number and keeps it as text.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match ConfigValue::deserialize(deserializer)? {
        ConfigValue::Scalar(value) => Ok(value),
        _ => Err(de::Error::custom("expected a string or number")),
    }
}

/// Accepts a list of class references, or a boolean: `true` requests
/// password-protected transport and `false` requests nothing.
fn authn_context_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Flag(bool),
        List(Vec<String>),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Flag(true) => vec![AuthnContextClass::PasswordProtectedTransport.uri().to_string()],
        Raw::Flag(false) => Vec::new(),
        Raw::List(list) => list,
    })
}

fn default_acs_binding() -> String {
    SamlBinding::HttpPost.uri().to_string()
}

fn default_idp_binding() -> String {
    SamlBinding::HttpRedirect.uri().to_string()
}

fn default_name_id_format() -> String {
    NameIdFormat::Unspecified.uri().to_string()
}

fn default_signature_algorithm() -> String {
    algorithm::RSA_SHA256.to_string()
}

fn default_digest_algorithm() -> String {
    digest_uris::SHA256.to_string()
}

fn default_encryption_algorithm() -> String {
    algorithm::AES128_CBC.to_string()
}

const fn default_true() -> bool {
    true
}

/// Complete settings tree.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Service provider section.
    #[serde(default)]
    pub sp: ServiceProviderSettings,
    /// Identity provider section.
    #[serde(default)]
    pub idp: IdentityProviderSettings,
    /// Compression flags.
    #[serde(default)]
    pub compress: CompressSettings,
    /// Security section.
    #[serde(default)]
    pub security: SecuritySettings,
    /// Debug mode; enables status detail in vendor extensions.
    #[serde(default)]
    pub debug: bool,
}

/// Service provider section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderSettings {
    /// SP entity ID, written as the request issuer.
    #[serde(default)]
    pub entity_id: String,
    /// Where the IdP should deliver the response.
    #[serde(default)]
    pub assertion_consumer_service: Option<AssertionConsumerService>,
    /// SP logout endpoint.
    #[serde(default)]
    pub single_logout_service: Option<Endpoint>,
    /// Vendor extension configuration.
    #[serde(default)]
    pub attribute_consuming_service: Option<AttributeConsumingService>,
    /// Requested NameID format.
    #[serde(rename = "NameIDFormat", default = "default_name_id_format")]
    pub name_id_format: String,
    /// SP certificate (PEM).
    #[serde(default)]
    pub x509cert: String,
    /// SP private key (PEM).
    #[serde(default)]
    pub private_key: String,
}

impl Default for ServiceProviderSettings {
    fn default() -> Self {
        Self {
            entity_id: String::new(),
            assertion_consumer_service: None,
            single_logout_service: None,
            attribute_consuming_service: None,
            name_id_format: default_name_id_format(),
            x509cert: String::new(),
            private_key: String::new(),
        }
    }
}

/// Assertion consumer service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AssertionConsumerService {
    /// Endpoint URL.
    #[serde(default)]
    pub url: String,
    /// Response binding URI.
    #[serde(default = "default_acs_binding")]
    pub binding: String,
}

/// A generic IdP or logout endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Endpoint URL.
    #[serde(default)]
    pub url: String,
    /// Binding URI.
    #[serde(default = "default_idp_binding")]
    pub binding: String,
    /// Separate response URL, if any.
    #[serde(default)]
    pub response_url: Option<String>,
}

/// Vendor attribute consuming service description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeConsumingService {
    /// Service name.
    #[serde(default)]
    pub service_name: String,
    /// Service description.
    #[serde(default)]
    pub service_description: String,
    /// Vendor extension version, written as `AuthenticationRequest/@Version`.
    #[serde(default, deserialize_with = "string_or_number")]
    pub version: String,
    /// Service URL.
    #[serde(default)]
    pub url: String,
    /// Service language.
    #[serde(default)]
    pub lang: String,
    /// Authentication method name to method configuration.
    #[serde(default)]
    pub authn_methods: IndexMap<String, IndexMap<String, ConfigValue>>,
    /// Attributes requested from the IdP.
    #[serde(default)]
    pub requested_attributes: Vec<RequestedAttribute>,
    /// Display metadata for the IdP's user interface.
    #[serde(default)]
    pub display_information: DisplayInformation,
}

/// A requested attribute.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedAttribute {
    /// Attribute name, usually an OID URN.
    pub name: String,
    /// Whether the attribute is required.
    #[serde(default)]
    pub is_required: AttributeRequirement,
    /// Attribute name format.
    #[serde(default)]
    pub name_format: Option<String>,
    /// Human-readable attribute name.
    #[serde(default)]
    pub friendly_name: Option<String>,
}

impl RequestedAttribute {
    /// Creates a requested attribute.
    #[must_use]
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            is_required: AttributeRequirement::Flag(required),
            name_format: None,
            friendly_name: None,
        }
    }
}

/// The `isRequired` setting: a boolean, or a string passed through as is.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttributeRequirement {
    /// Boolean requirement.
    Flag(bool),
    /// Verbatim text.
    Text(String),
}

impl Default for AttributeRequirement {
    fn default() -> Self {
        Self::Flag(false)
    }
}

impl AttributeRequirement {
    /// Returns the attribute value written to `RequiredAttribute`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Flag(true) => "true",
            Self::Flag(false) => "false",
            Self::Text(text) => text,
        }
    }
}

/// Vendor display information, copied verbatim into the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayInformation {
    /// Purpose of the authentication.
    #[serde(default)]
    pub purpose: String,
    /// Organization name shown to the user.
    #[serde(default)]
    pub organization_display_name: String,
    /// Display language.
    #[serde(default)]
    pub lang: String,
    /// Link back to the service.
    #[serde(rename = "BackURL", default)]
    pub back_url: String,
    /// Online service identifier.
    #[serde(default)]
    pub online_service_id: String,
}

/// Identity provider section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProviderSettings {
    /// IdP entity ID.
    #[serde(default)]
    pub entity_id: String,
    /// IdP single sign-on endpoint; its URL is the request destination.
    #[serde(default)]
    pub single_sign_on_service: Option<Endpoint>,
    /// IdP logout endpoint.
    #[serde(default)]
    pub single_logout_service: Option<Endpoint>,
    /// IdP certificate (PEM).
    #[serde(default)]
    pub x509cert: String,
}

/// Compression flags.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CompressSettings {
    /// Deflate outgoing requests before base64 encoding.
    #[serde(default = "default_true")]
    pub requests: bool,
    /// Expect deflated responses.
    #[serde(default = "default_true")]
    pub responses: bool,
}

impl Default for CompressSettings {
    fn default() -> Self {
        Self {
            requests: true,
            responses: true,
        }
    }
}

/// Security section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    /// Ask the IdP for an encrypted NameID.
    #[serde(default)]
    pub want_name_id_encrypted: bool,
    /// Sign outgoing AuthnRequests.
    #[serde(default)]
    pub authn_requests_signed: bool,
    /// Requested authentication context class references.
    #[serde(default, deserialize_with = "authn_context_list")]
    pub requested_authn_context: Vec<String>,
    /// Comparison for the requested authentication context.
    #[serde(default)]
    pub requested_authn_context_comparison: AuthnContextComparison,
    /// Signature algorithm URI.
    #[serde(default = "default_signature_algorithm")]
    pub signature_algorithm: String,
    /// Digest algorithm URI.
    #[serde(default = "default_digest_algorithm")]
    pub digest_algorithm: String,
    /// Content encryption algorithm URI.
    #[serde(rename = "encryption_algorithm", default = "default_encryption_algorithm")]
    pub encryption_algorithm: String,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            want_name_id_encrypted: false,
            authn_requests_signed: false,
            requested_authn_context: Vec::new(),
            requested_authn_context_comparison: AuthnContextComparison::default(),
            signature_algorithm: default_signature_algorithm(),
            digest_algorithm: default_digest_algorithm(),
            encryption_algorithm: default_encryption_algorithm(),
        }
    }
}

fn required<'a>(value: &'a str, field: &str) -> SamlResult<&'a str> {
    if value.is_empty() {
        Err(SamlError::Configuration(format!("{field} is required")))
    } else {
        Ok(value)
    }
}

impl Settings {
    /// Parses settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if the JSON is malformed or a
    /// value has the wrong shape.
    pub fn from_json_str(json: &str) -> SamlResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses settings from an already decoded JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if a value has the wrong shape.
    pub fn from_json_value(value: serde_json::Value) -> SamlResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Returns the SP entity ID.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if it is empty.
    pub fn sp_entity_id(&self) -> SamlResult<&str> {
        required(&self.sp.entity_id, "sp.entityId")
    }

    /// Returns the assertion consumer service with a non-empty URL.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if the section or its URL is
    /// missing.
    pub fn assertion_consumer_service(&self) -> SamlResult<&AssertionConsumerService> {
        let acs = self.sp.assertion_consumer_service.as_ref().ok_or_else(|| {
            SamlError::Configuration("sp.assertionConsumerService is required".to_string())
        })?;
        required(&acs.url, "sp.assertionConsumerService.url")?;
        Ok(acs)
    }

    /// Returns the IdP single sign-on URL.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if it is missing or empty.
    pub fn idp_sso_url(&self) -> SamlResult<&str> {
        let url = self
            .idp
            .single_sign_on_service
            .as_ref()
            .map_or("", |service| service.url.as_str());
        required(url, "idp.singleSignOnService.url")
    }

    /// Returns the SP NameID format.
    #[must_use]
    pub fn sp_name_id_format(&self) -> &str {
        &self.sp.name_id_format
    }

    /// Returns the vendor attribute consuming service, if configured.
    #[must_use]
    pub const fn attribute_consuming_service(&self) -> Option<&AttributeConsumingService> {
        self.sp.attribute_consuming_service.as_ref()
    }

    /// Returns whether outgoing requests are deflated by default.
    #[must_use]
    pub const fn should_compress_requests(&self) -> bool {
        self.compress.requests
    }

    /// Returns whether debug mode is active.
    #[must_use]
    pub const fn is_debug_active(&self) -> bool {
        self.debug
    }

    /// Resolves the configured signature algorithm.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if the URI is not registered or
    /// is not a signature algorithm.
    pub fn request_signing_algorithm(&self) -> SamlResult<Algorithm> {
        let uri = &self.security.signature_algorithm;
        let algorithm = Algorithm::from_uri(uri).ok_or_else(|| {
            SamlError::Configuration(format!("unknown security.signatureAlgorithm: {uri}"))
        })?;
        if !algorithm.is_rsa_signature() {
            return Err(SamlError::Configuration(format!(
                "security.signatureAlgorithm is not an RSA signature algorithm: {uri}"
            )));
        }
        Ok(algorithm)
    }
}
