//! AuthnRequest construction tests.
//!
//! Requests are built from the settings fixture and read back with a
//! namespace-aware parser, so assertions are on namespaces, not prefixes.

use std::io::Read;

use base64::Engine;
use flate2::read::DeflateDecoder;
use sp_protocol_saml::{
    to_saml_time, AuthnRequest, AuthnRequestOptions, NameIdFormat, SamlBinding, SamlError,
    AKDB_NS, CLASSIC_UI_NS, CM_BEARER, SAMLP_NS, SAML_NS,
};

use crate::common::{init_tracing, parse, settings};

/// Tests the root element and its attributes.
#[test]
fn test_root_element() -> anyhow::Result<()> {
    init_tracing();
    let settings = settings()?;
    let request = AuthnRequest::new(&settings, AuthnRequestOptions::default().force_authn(true))?;
    let root = parse(request.xml())?;

    assert_eq!(root.namespace.as_deref(), Some(SAMLP_NS));
    assert_eq!(root.name, "AuthnRequest");
    assert_eq!(
        root.attr_names(),
        [
            "AssertionConsumerServiceURL",
            "ProtocolBinding",
            "Destination",
            "IssueInstant",
            "ForceAuthn",
            "IsPassive",
            "Version",
            "ID"
        ]
    );
    assert_eq!(root.attr("AssertionConsumerServiceURL"), Some("https://sp.example.org/acs"));
    assert_eq!(root.attr("ProtocolBinding"), Some(SamlBinding::HttpPost.uri()));
    assert_eq!(root.attr("Destination"), Some("https://idp.example.org/sso"));
    assert_eq!(
        root.attr("IssueInstant"),
        Some(to_saml_time(request.issue_instant()).as_str())
    );
    assert_eq!(root.attr("ForceAuthn"), Some("true"));
    assert_eq!(root.attr("IsPassive"), Some("false"));
    assert_eq!(root.attr("Version"), Some("2.0"));
    assert_eq!(root.attr("ID"), Some(request.id()));

    Ok(())
}

/// Tests the request ID format and uniqueness.
#[test]
fn test_request_ids() -> anyhow::Result<()> {
    let settings = settings()?;
    let first = AuthnRequest::new(&settings, AuthnRequestOptions::default())?;
    let second = AuthnRequest::new(&settings, AuthnRequestOptions::default())?;

    assert_eq!(first.id().len(), 41);
    assert!(first.id().starts_with('_'));
    assert!(first.id()[1..].chars().all(|c| c.is_ascii_hexdigit()));
    assert_ne!(first.id(), second.id());

    Ok(())
}

/// Tests the serialized form: declaration, indentation and trailing newline.
#[test]
fn test_serialized_form() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&settings()?, AuthnRequestOptions::default())?;
    let xml = request.xml();

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<saml2p:AuthnRequest "));
    assert!(xml.ends_with("</saml2p:AuthnRequest>\n"));
    assert!(xml.contains("\n  <saml2a:Issuer xmlns:saml2a=\"urn:oasis:names:tc:SAML:2.0:assertion\">https://sp.example.org/metadata</saml2a:Issuer>\n"));
    assert!(xml.contains("Anmeldung &amp; Registrierung"));

    Ok(())
}

/// Tests the child element order and the issuer.
#[test]
fn test_child_order() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&settings()?, AuthnRequestOptions::default())?;
    let root = parse(request.xml())?;

    assert_eq!(
        root.child_names(),
        ["Issuer", "NameIDPolicy", "Extensions", "RequestedAuthnContext"]
    );
    assert_eq!(
        root.child(SAML_NS, "Issuer")?.text.as_deref(),
        Some("https://sp.example.org/metadata")
    );

    let policy = root.child(SAMLP_NS, "NameIDPolicy")?;
    assert_eq!(policy.attr("Format"), Some(NameIdFormat::Transient.uri()));
    assert_eq!(policy.attr("AllowCreate"), Some("true"));

    Ok(())
}

/// Tests the subject written for a known user.
#[test]
fn test_subject() -> anyhow::Result<()> {
    let options = AuthnRequestOptions::default().with_name_id("alice@example.org");
    let request = AuthnRequest::new(&settings()?, options)?;
    let root = parse(request.xml())?;

    assert_eq!(
        root.child_names(),
        ["Issuer", "Subject", "NameIDPolicy", "Extensions", "RequestedAuthnContext"]
    );
    let subject = root.child(SAML_NS, "Subject")?;
    let name_id = subject.child(SAML_NS, "NameID")?;
    assert_eq!(name_id.text.as_deref(), Some("alice@example.org"));
    assert_eq!(name_id.attr("Format"), Some(NameIdFormat::Transient.uri()));

    let confirmation = subject.child(SAML_NS, "SubjectConfirmation")?;
    assert_eq!(confirmation.attr("Method"), Some(CM_BEARER));
    assert!(confirmation.text.is_none());

    Ok(())
}

/// Tests that the policy can be left out and that encryption overrides its format.
#[test]
fn test_name_id_policy_options() -> anyhow::Result<()> {
    let mut settings = settings()?;
    let options = AuthnRequestOptions::default().set_name_id_policy(false);
    let root = parse(AuthnRequest::new(&settings, options)?.xml())?;
    assert!(root.child(SAMLP_NS, "NameIDPolicy").is_err());

    settings.security.want_name_id_encrypted = true;
    let root = parse(AuthnRequest::new(&settings, AuthnRequestOptions::default())?.xml())?;
    assert_eq!(
        root.child(SAMLP_NS, "NameIDPolicy")?.attr("Format"),
        Some(NameIdFormat::Encrypted.uri())
    );

    Ok(())
}

/// Tests the vendor authentication methods.
#[test]
fn test_vendor_authn_methods() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&settings()?, AuthnRequestOptions::default())?;
    let root = parse(request.xml())?;

    let auth = root
        .child(SAMLP_NS, "Extensions")?
        .child(AKDB_NS, "AuthenticationRequest")?;
    assert_eq!(auth.attr_names(), ["Version"]);
    assert_eq!(auth.attr("Version"), Some("2"));
    assert_eq!(
        auth.child_names(),
        ["AuthnMethods", "RequestedAttributes", "DisplayInformation"]
    );

    let methods = auth.child(AKDB_NS, "AuthnMethods")?;
    assert_eq!(methods.child_names(), ["eID", "Benutzername", "FINK"]);

    let eid = methods.child(AKDB_NS, "eID")?;
    assert_eq!(eid.child(AKDB_NS, "Enabled")?.text.as_deref(), Some("true"));
    let certificate = eid.child(AKDB_NS, "Berechtigungszertifikat")?;
    assert_eq!(certificate.attr_names(), ["Bundesland", "Strict"]);
    assert_eq!(certificate.attr("Bundesland"), Some("BY"));
    assert_eq!(certificate.attr("Strict"), Some("false"));

    let username = methods.child(AKDB_NS, "Benutzername")?;
    assert_eq!(username.child(AKDB_NS, "Enabled")?.text.as_deref(), Some("false"));
    let fink = methods.child(AKDB_NS, "FINK")?;
    assert_eq!(fink.child(AKDB_NS, "Level")?.text.as_deref(), Some("3"));

    Ok(())
}

/// Tests requested attributes and display information.
#[test]
fn test_vendor_attributes_and_display() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&settings()?, AuthnRequestOptions::default())?;
    let root = parse(request.xml())?;
    let auth = root
        .child(SAMLP_NS, "Extensions")?
        .child(AKDB_NS, "AuthenticationRequest")?;

    let attributes = auth.child(AKDB_NS, "RequestedAttributes")?;
    let pairs: Vec<(Option<&str>, Option<&str>)> = attributes
        .children
        .iter()
        .map(|a| (a.attr("Name"), a.attr("RequiredAttribute")))
        .collect();
    assert_eq!(
        pairs,
        [
            (Some("urn:oid:2.5.4.42"), Some("true")),
            (Some("urn:oid:2.5.4.4"), Some("true")),
            (Some("urn:oid:0.9.2342.19200300.100.1.3"), Some("false")),
        ]
    );

    let version = auth
        .child(AKDB_NS, "DisplayInformation")?
        .child(CLASSIC_UI_NS, "Version")?;
    assert_eq!(
        version.child_names(),
        ["Purpose", "OrganizationDisplayName", "Lang", "BackURL", "OnlineServiceId"]
    );
    let text = |name: &str| -> anyhow::Result<Option<String>> {
        Ok(version.child(CLASSIC_UI_NS, name)?.text.clone())
    };
    assert_eq!(text("Purpose")?.as_deref(), Some("Anmeldung & Registrierung"));
    assert_eq!(text("OrganizationDisplayName")?.as_deref(), Some("Stadt Beispiel"));
    assert_eq!(text("BackURL")?.as_deref(), Some("https://sp.example.org/"));
    assert_eq!(text("OnlineServiceId")?.as_deref(), Some("svc-42"));

    Ok(())
}

/// Tests that debug mode asks for status detail.
#[test]
fn test_debug_status_detail() -> anyhow::Result<()> {
    let mut settings = settings()?;
    settings.debug = true;
    let root = parse(AuthnRequest::new(&settings, AuthnRequestOptions::default())?.xml())?;

    let auth = root
        .child(SAMLP_NS, "Extensions")?
        .child(AKDB_NS, "AuthenticationRequest")?;
    assert_eq!(auth.attr_names(), ["EnableStatusDetail", "Version"]);
    assert_eq!(auth.attr("EnableStatusDetail"), Some("true"));

    Ok(())
}

/// Tests that extensions are left out without an attribute consuming service.
#[test]
fn test_no_extensions_without_service() -> anyhow::Result<()> {
    let mut settings = settings()?;
    settings.sp.attribute_consuming_service = None;
    settings.security.requested_authn_context.clear();

    let root = parse(AuthnRequest::new(&settings, AuthnRequestOptions::default())?.xml())?;
    assert_eq!(root.child_names(), ["Issuer", "NameIDPolicy"]);

    Ok(())
}

/// Tests the requested authentication context.
#[test]
fn test_requested_authn_context() -> anyhow::Result<()> {
    let request = AuthnRequest::new(&settings()?, AuthnRequestOptions::default())?;
    let root = parse(request.xml())?;

    let requested = root.child(SAMLP_NS, "RequestedAuthnContext")?;
    assert_eq!(requested.attr("Comparison"), Some("minimum"));
    let refs: Vec<Option<&str>> = requested
        .children
        .iter()
        .map(|c| {
            assert_eq!(c.namespace.as_deref(), Some(SAML_NS));
            c.text.as_deref()
        })
        .collect();
    assert_eq!(
        refs,
        [
            Some("urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport"),
            Some("urn:oasis:names:tc:SAML:2.0:ac:classes:X509"),
        ]
    );

    Ok(())
}

/// Tests the boolean shorthand for the requested authentication context.
#[test]
fn test_requested_authn_context_flag() -> anyhow::Result<()> {
    let mut json: serde_json::Value = serde_json::from_slice(&crate::common::fixture("settings.json")?)?;
    json["security"]["requestedAuthnContext"] = serde_json::Value::Bool(true);
    let settings = sp_protocol_saml::Settings::from_json_value(json.clone())?;
    let root = parse(AuthnRequest::new(&settings, AuthnRequestOptions::default())?.xml())?;
    let requested = root.child(SAMLP_NS, "RequestedAuthnContext")?;
    assert_eq!(requested.children.len(), 1);
    assert_eq!(
        requested.children[0].text.as_deref(),
        Some("urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport")
    );

    json["security"]["requestedAuthnContext"] = serde_json::Value::Bool(false);
    let settings = sp_protocol_saml::Settings::from_json_value(json)?;
    let root = parse(AuthnRequest::new(&settings, AuthnRequestOptions::default())?.xml())?;
    assert!(root.child(SAMLP_NS, "RequestedAuthnContext").is_err());

    Ok(())
}

/// Tests the base64 transport encoding with and without deflate.
#[test]
fn test_get_request() -> anyhow::Result<()> {
    let engine = base64::engine::general_purpose::STANDARD;
    let mut settings = settings()?;
    let request = AuthnRequest::new(&settings, AuthnRequestOptions::default())?;

    // compress.requests is set in the fixture
    let compressed = engine.decode(request.get_request(None)?)?;
    let mut inflated = String::new();
    DeflateDecoder::new(compressed.as_slice()).read_to_string(&mut inflated)?;
    assert_eq!(inflated, request.xml());

    let plain = engine.decode(request.get_request(Some(false))?)?;
    assert_eq!(plain, request.xml().as_bytes());

    settings.compress.requests = false;
    let request = AuthnRequest::new(&settings, AuthnRequestOptions::default())?;
    let plain = engine.decode(request.get_request(None)?)?;
    assert_eq!(plain, request.xml().as_bytes());

    Ok(())
}

/// Tests that missing required settings fail before any XML is produced.
#[test]
fn test_missing_settings() -> anyhow::Result<()> {
    let mut settings = settings()?;
    settings.idp.single_sign_on_service = None;

    let err = AuthnRequest::new(&settings, AuthnRequestOptions::default())
        .err()
        .ok_or_else(|| anyhow::anyhow!("request built without an IdP SSO URL"))?;
    assert!(matches!(err, SamlError::Configuration(_)), "{err}");
    assert!(err.is_configuration());

    Ok(())
}

/// Tests that characters XML cannot carry fail the build instead of the IdP.
#[test]
fn test_disallowed_characters() -> anyhow::Result<()> {
    let mut settings = settings()?;
    if let Some(service) = settings.sp.attribute_consuming_service.as_mut() {
        service.display_information.purpose = "a\u{1}b".to_string();
    }
    let err = AuthnRequest::new(&settings, AuthnRequestOptions::default())
        .err()
        .ok_or_else(|| anyhow::anyhow!("request built with a control character"))?;
    assert!(matches!(err, SamlError::XmlStructure(_)), "{err}");

    let settings = crate::common::settings()?;
    let options = AuthnRequestOptions::default().with_name_id("user\u{FFFF}");
    assert!(matches!(
        AuthnRequest::new(&settings, options),
        Err(SamlError::XmlStructure(_))
    ));

    Ok(())
}
