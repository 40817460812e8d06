//! SAML 2.0 types and data structures.
//!
//! Constants, the AuthnRequest value object and NameID helpers.

mod authn_request;
mod constants;
mod name_id;

pub use authn_request::*;
pub use constants::*;
pub use name_id::*;
