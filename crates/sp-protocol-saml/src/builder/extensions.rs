//! Vendor extension encoding.
//!
//! Renders the attribute consuming service configuration as an
//! `akdb:AuthenticationRequest` subtree:
//!
//! ```text
//! akdb:AuthenticationRequest [EnableStatusDetail] Version
//! ├── akdb:AuthnMethods
//! │   └── akdb:<method>
//! │       ├── akdb:<name>text</…>          scalar or boolean entries
//! │       └── akdb:<name> key="value" …/>  nested map entries
//! ├── akdb:RequestedAttributes
//! │   └── akdb:RequestedAttribute Name RequiredAttribute
//! └── akdb:DisplayInformation
//!     └── classic-ui:Version
//!         └── Purpose, OrganizationDisplayName, Lang, BackURL, OnlineServiceId
//! ```

use indexmap::IndexMap;

use crate::error::{SamlError, SamlResult};
use crate::settings::{AttributeConsumingService, ConfigValue};
use crate::types::{AKDB_NS, AKDB_PREFIX, CLASSIC_UI_NS, CLASSIC_UI_PREFIX};
use crate::xml::{ElementId, XmlDocument};

/// Encodes vendor extensions into an existing `Extensions` element.
#[derive(Debug, Clone, Copy)]
pub struct VendorExtensionEncoder<'a> {
    service: &'a AttributeConsumingService,
    debug: bool,
}

impl<'a> VendorExtensionEncoder<'a> {
    /// Creates an encoder. `debug` adds `EnableStatusDetail="true"`.
    #[must_use]
    pub const fn new(service: &'a AttributeConsumingService, debug: bool) -> Self {
        Self { service, debug }
    }

    /// Appends the `AuthenticationRequest` subtree to `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SamlError::Configuration`] if a method entry nests deeper than
    /// one attribute map, or [`SamlError::XmlStructure`] if a configured name
    /// is not a valid XML name.
    pub fn encode(&self, doc: &mut XmlDocument, parent: ElementId) -> SamlResult<ElementId> {
        let request = akdb(doc, "AuthenticationRequest", None)?;
        doc.append_child(parent, request)?;
        if self.debug {
            doc.set_attribute(request, "EnableStatusDetail", "true")?;
        }
        doc.set_attribute(request, "Version", &self.service.version)?;

        self.encode_authn_methods(doc, request)?;
        self.encode_requested_attributes(doc, request)?;
        self.encode_display_information(doc, request)?;
        Ok(request)
    }

    fn encode_authn_methods(&self, doc: &mut XmlDocument, request: ElementId) -> SamlResult<()> {
        let methods = akdb(doc, "AuthnMethods", None)?;
        doc.append_child(request, methods)?;

        for (method_name, details) in &self.service.authn_methods {
            let method = akdb(doc, method_name, None)?;
            for (name, value) in details {
                let element = match value {
                    ConfigValue::Nested(attributes) => {
                        let element = akdb(doc, name, None)?;
                        set_flat_attributes(doc, element, method_name, name, attributes)?;
                        element
                    }
                    scalar => akdb(doc, name, scalar.as_text())?,
                };
                doc.append_child(method, element)?;
            }
            doc.append_child(methods, method)?;
        }
        Ok(())
    }

    fn encode_requested_attributes(&self, doc: &mut XmlDocument, request: ElementId) -> SamlResult<()> {
        let attributes = akdb(doc, "RequestedAttributes", None)?;
        doc.append_child(request, attributes)?;

        for attribute in &self.service.requested_attributes {
            let element = akdb(doc, "RequestedAttribute", None)?;
            doc.set_attribute(element, "Name", &attribute.name)?;
            doc.set_attribute(element, "RequiredAttribute", attribute.is_required.as_str())?;
            doc.append_child(attributes, element)?;
        }
        Ok(())
    }

    fn encode_display_information(&self, doc: &mut XmlDocument, request: ElementId) -> SamlResult<()> {
        let display = akdb(doc, "DisplayInformation", None)?;
        doc.append_child(request, display)?;

        let version = classic_ui(doc, "Version", None)?;
        doc.append_child(display, version)?;

        let info = &self.service.display_information;
        for (name, value) in [
            ("Purpose", &info.purpose),
            ("OrganizationDisplayName", &info.organization_display_name),
            ("Lang", &info.lang),
            ("BackURL", &info.back_url),
            ("OnlineServiceId", &info.online_service_id),
        ] {
            let element = classic_ui(doc, name, Some(value))?;
            doc.append_child(version, element)?;
        }
        Ok(())
    }
}

fn set_flat_attributes(
    doc: &mut XmlDocument,
    element: ElementId,
    method: &str,
    entry: &str,
    attributes: &IndexMap<String, ConfigValue>,
) -> SamlResult<()> {
    for (key, value) in attributes {
        let text = value.as_text().ok_or_else(|| {
            SamlError::Configuration(format!(
                "authnMethods.{method}.{entry}.{key}: nested maps are not allowed here"
            ))
        })?;
        doc.set_attribute(element, key, text)?;
    }
    Ok(())
}

fn akdb(doc: &mut XmlDocument, local: &str, text: Option<&str>) -> SamlResult<ElementId> {
    doc.create_element_ns(Some(AKDB_NS), &format!("{AKDB_PREFIX}:{local}"), text)
}

fn classic_ui(doc: &mut XmlDocument, local: &str, text: Option<&str>) -> SamlResult<ElementId> {
    doc.create_element_ns(
        Some(CLASSIC_UI_NS),
        &format!("{CLASSIC_UI_PREFIX}:{local}"),
        text,
    )
}
