//! SAML 2.0 service provider request construction.
//!
//! This crate builds the messages a service provider sends to an identity
//! provider:
//!
//! - **AuthnRequest construction** - Assemble requests from SP/IdP settings
//! - **Vendor extensions** - Render `akdb` authentication method, attribute and
//!   display information extensions
//! - **XML documents** - A small namespace-aware tree with deterministic output
//! - **POST and Redirect bindings** - Transport encoding, with query signing
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`settings`] - Typed SP/IdP configuration loaded from JSON
//! - [`types`] - Constants, the built [`AuthnRequest`] and NameID helpers
//! - [`builder`] - Document builders and the vendor extension encoder
//! - [`xml`] - The XML document owner
//! - [`bindings`] - POST and Redirect binding implementations
//! - [`error`] - Error types for SAML operations
//!
//! # Example
//!
//! ```rust,ignore
//! use sp_protocol_saml::{AuthnRequest, AuthnRequestOptions, Settings};
//! use sp_protocol_saml::bindings::HttpRedirectBinding;
//!
//! let settings = Settings::from_json_str(&json)?;
//! let request = AuthnRequest::new(&settings, AuthnRequestOptions::default())?;
//! let url = HttpRedirectBinding::encode_request(&request, settings.idp_sso_url()?, None, None)?;
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Bindings](https://docs.oasis-open.org/security/saml/v2.0/saml-bindings-2.0-os.pdf)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod builder;
pub mod error;
pub mod settings;
pub mod types;
pub mod xml;

pub use error::{SamlError, SamlResult};
pub use settings::Settings;
pub use types::*;
