//! AuthnRequest document assembly.

use chrono::{DateTime, Utc};
use sp_crypto::generate_unique_id;

use super::{DocumentBuilder, VendorExtensionEncoder};
use crate::error::SamlResult;
use crate::settings::Settings;
use crate::types::{
    saml_now, to_saml_time, AuthnRequest, AuthnRequestOptions, NameId, NameIdPolicy, CM_BEARER,
    SAMLP_NS, SAMLP_PREFIX, SAML_NS, SAML_PREFIX, SAML_VERSION,
};
use crate::xml::{ElementId, XmlDocument};

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Builds the XML for a SAML 2.0 `AuthnRequest`.
///
/// Children are appended in a fixed order: `Issuer`, `Subject`,
/// `NameIDPolicy`, `Extensions`, `RequestedAuthnContext`. This differs from
/// the protocol schema, which places `Extensions` directly after `Issuer`.
#[derive(Debug)]
pub struct AuthnRequestBuilder {
    id: String,
    issue_instant: DateTime<Utc>,
    compress_requests: bool,
    document: XmlDocument,
}

impl AuthnRequestBuilder {
    /// Assembles the request document.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`](crate::SamlError::Configuration)
    /// if the SP entity ID, assertion consumer service URL or IdP SSO URL is
    /// missing, or if the vendor extension configuration is malformed.
    pub fn new(settings: &Settings, options: AuthnRequestOptions) -> SamlResult<Self> {
        let entity_id = settings.sp_entity_id()?;
        let acs = settings.assertion_consumer_service()?;
        let destination = settings.idp_sso_url()?;

        let mut builder = Self {
            id: generate_unique_id(),
            issue_instant: saml_now(),
            compress_requests: settings.should_compress_requests(),
            document: XmlDocument::new(),
        };

        let doc = &mut builder.document;
        let root = doc.create_element_ns(Some(SAMLP_NS), &samlp("AuthnRequest"), None)?;
        doc.set_root(root)?;
        doc.set_attribute(root, "AssertionConsumerServiceURL", &acs.url)?;
        doc.set_attribute(root, "ProtocolBinding", &acs.binding)?;
        doc.set_attribute(root, "Destination", destination)?;
        doc.set_attribute(root, "IssueInstant", &to_saml_time(builder.issue_instant))?;
        doc.set_attribute(root, "ForceAuthn", bool_str(options.force_authn))?;
        doc.set_attribute(root, "IsPassive", bool_str(options.is_passive))?;
        doc.set_attribute(root, "Version", SAML_VERSION)?;
        doc.set_attribute(root, "ID", &builder.id)?;

        let issuer = doc.create_element_ns(Some(SAML_NS), &saml("Issuer"), Some(entity_id))?;
        doc.append_child(root, issuer)?;

        if let Some(value) = &options.name_id_value {
            append_subject(doc, root, &NameId::for_settings(settings, value.as_str()))?;
        }

        if options.set_name_id_policy {
            let policy = NameIdPolicy::for_settings(settings);
            let element = doc.create_element_ns(Some(SAMLP_NS), &samlp("NameIDPolicy"), None)?;
            doc.set_attribute(element, "Format", &policy.format)?;
            doc.set_attribute(element, "AllowCreate", bool_str(policy.allow_create))?;
            doc.append_child(root, element)?;
        }

        if let Some(service) = settings.attribute_consuming_service() {
            let extensions = doc.create_element_ns(Some(SAMLP_NS), &samlp("Extensions"), None)?;
            doc.append_child(root, extensions)?;
            VendorExtensionEncoder::new(service, settings.is_debug_active())
                .encode(doc, extensions)?;
        }

        append_requested_authn_context(doc, root, settings)?;

        tracing::debug!(
            request_id = %builder.id,
            destination,
            subject = options.name_id_value.is_some(),
            "AuthnRequest built"
        );
        Ok(builder)
    }

    /// Returns the request ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl DocumentBuilder for AuthnRequestBuilder {
    type Output = AuthnRequest;

    fn document(&self) -> &XmlDocument {
        &self.document
    }

    fn build(self) -> SamlResult<AuthnRequest> {
        let xml = self.document.serialize()?;
        Ok(AuthnRequest::from_parts(
            self.id,
            self.issue_instant,
            xml,
            self.compress_requests,
        ))
    }
}

fn samlp(local: &str) -> String {
    format!("{SAMLP_PREFIX}:{local}")
}

fn saml(local: &str) -> String {
    format!("{SAML_PREFIX}:{local}")
}

fn append_subject(doc: &mut XmlDocument, root: ElementId, name_id: &NameId) -> SamlResult<()> {
    let subject = doc.create_element_ns(Some(SAML_NS), &saml("Subject"), None)?;
    doc.append_child(root, subject)?;

    let element = doc.create_element_ns(Some(SAML_NS), &saml("NameID"), Some(&name_id.value))?;
    doc.append_child(subject, element)?;
    doc.set_attribute(element, "Format", &name_id.format)?;

    let confirmation = doc.create_element_ns(Some(SAML_NS), &saml("SubjectConfirmation"), None)?;
    doc.append_child(subject, confirmation)?;
    doc.set_attribute(confirmation, "Method", CM_BEARER)?;
    Ok(())
}

/// Appends every configured context class reference, in order. Nothing is
/// appended when none are configured.
fn append_requested_authn_context(
    doc: &mut XmlDocument,
    root: ElementId,
    settings: &Settings,
) -> SamlResult<()> {
    let contexts = &settings.security.requested_authn_context;
    if contexts.is_empty() {
        return Ok(());
    }
    if contexts.len() > 1 {
        tracing::warn!(
            count = contexts.len(),
            "several authentication contexts configured; all are requested"
        );
    }

    let requested = doc.create_element_ns(Some(SAMLP_NS), &samlp("RequestedAuthnContext"), None)?;
    doc.append_child(root, requested)?;
    doc.set_attribute(
        requested,
        "Comparison",
        settings.security.requested_authn_context_comparison.as_str(),
    )?;

    for context in contexts {
        let class_ref =
            doc.create_element_ns(Some(SAML_NS), &saml("AuthnContextClassRef"), Some(context))?;
        doc.append_child(requested, class_ref)?;
    }
    Ok(())
}
