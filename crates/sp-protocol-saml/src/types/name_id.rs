//! SAML Name ID types.

use super::NameIdFormat;
use crate::settings::Settings;

/// Name ID of the subject the IdP is asked to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameId {
    /// The identifier value.
    pub value: String,
    /// The format URI.
    pub format: String,
}

impl NameId {
    /// Creates a name ID with the SP's configured format.
    #[must_use]
    pub fn for_settings(settings: &Settings, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: settings.sp_name_id_format().to_string(),
        }
    }
}

/// Name ID policy for authentication requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIdPolicy {
    /// The requested name ID format.
    pub format: String,
    /// Whether the IdP may create a new identifier.
    pub allow_create: bool,
}

impl NameIdPolicy {
    /// Derives the policy from settings.
    ///
    /// The SP's NameID format is used unless the security section asks for an
    /// encrypted NameID, which always wins.
    #[must_use]
    pub fn for_settings(settings: &Settings) -> Self {
        let format = if settings.security.want_name_id_encrypted {
            NameIdFormat::Encrypted.uri()
        } else {
            settings.sp_name_id_format()
        };
        Self {
            format: format.to_string(),
            allow_create: true,
        }
    }

    /// Returns the parsed name ID format.
    #[must_use]
    pub fn parsed_format(&self) -> Option<NameIdFormat> {
        NameIdFormat::from_uri(&self.format)
    }
}
