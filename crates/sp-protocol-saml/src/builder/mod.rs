//! Document builders.
//!
//! A builder owns one [`XmlDocument`], assembles it from settings when it is
//! created, and turns the finished document into a protocol value with
//! [`DocumentBuilder::build`].

mod authn_request;
mod extensions;

pub use authn_request::AuthnRequestBuilder;
pub use extensions::VendorExtensionEncoder;

use crate::error::SamlResult;
use crate::xml::XmlDocument;

/// A builder that owns and assembles an XML document.
pub trait DocumentBuilder {
    /// The value produced from the finished document.
    type Output;

    /// Returns the assembled document.
    fn document(&self) -> &XmlDocument;

    /// Serializes the document and produces the output value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn build(self) -> SamlResult<Self::Output>;
}
