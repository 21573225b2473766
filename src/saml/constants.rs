//! SAML 2.0 identifiers used in the SP configuration document.

use serde::{Deserialize, Serialize};

/// Fixed path of the xmlsec binary used by the SAML toolkit for signing.
pub const XMLSEC_BINARY: &str = "/usr/bin/xmlsec1";

/// File name that trails the stored attribute-map reference.
pub const ATTRIBUTE_MAP_FILENAME: &str = "saml_uri.py";

/// HTTP binding carrying a SAML message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Binding {
    #[serde(rename = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST")]
    HttpPost,
    #[serde(rename = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect")]
    HttpRedirect,
}

impl Binding {
    pub fn as_urn(&self) -> &'static str {
        match self {
            Binding::HttpPost => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST",
            Binding::HttpRedirect => "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect",
        }
    }
}

impl std::fmt::Display for Binding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_urn())
    }
}

/// Name identifier formats defined by SAML 1.1 and 2.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameIdFormat {
    #[default]
    Unspecified,
    EmailAddress,
    X509SubjectName,
    WindowsDomainQualifiedName,
    Kerberos,
    Entity,
    Persistent,
    Transient,
    Encrypted,
}

impl NameIdFormat {
    pub const ALL: [NameIdFormat; 9] = [
        NameIdFormat::Unspecified,
        NameIdFormat::EmailAddress,
        NameIdFormat::X509SubjectName,
        NameIdFormat::WindowsDomainQualifiedName,
        NameIdFormat::Kerberos,
        NameIdFormat::Entity,
        NameIdFormat::Persistent,
        NameIdFormat::Transient,
        NameIdFormat::Encrypted,
    ];

    pub fn as_urn(&self) -> &'static str {
        match self {
            NameIdFormat::Unspecified => "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified",
            NameIdFormat::EmailAddress => "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress",
            NameIdFormat::X509SubjectName => {
                "urn:oasis:names:tc:SAML:1.1:nameid-format:X509SubjectName"
            }
            NameIdFormat::WindowsDomainQualifiedName => {
                "urn:oasis:names:tc:SAML:1.1:nameid-format:WindowsDomainQualifiedName"
            }
            NameIdFormat::Kerberos => "urn:oasis:names:tc:SAML:2.0:nameid-format:kerberos",
            NameIdFormat::Entity => "urn:oasis:names:tc:SAML:2.0:nameid-format:entity",
            NameIdFormat::Persistent => "urn:oasis:names:tc:SAML:2.0:nameid-format:persistent",
            NameIdFormat::Transient => "urn:oasis:names:tc:SAML:2.0:nameid-format:transient",
            NameIdFormat::Encrypted => "urn:oasis:names:tc:SAML:2.0:nameid-format:encrypted",
        }
    }

    /// The toolkit's constant name, e.g. `NAMEID_FORMAT_EMAILADDRESS`.
    pub fn constant_name(&self) -> &'static str {
        match self {
            NameIdFormat::Unspecified => "NAMEID_FORMAT_UNSPECIFIED",
            NameIdFormat::EmailAddress => "NAMEID_FORMAT_EMAILADDRESS",
            NameIdFormat::X509SubjectName => "NAMEID_FORMAT_X509SUBJECTNAME",
            NameIdFormat::WindowsDomainQualifiedName => "NAMEID_FORMAT_WINDOWSDOMAINQUALIFIEDNAME",
            NameIdFormat::Kerberos => "NAMEID_FORMAT_KERBEROS",
            NameIdFormat::Entity => "NAMEID_FORMAT_ENTITY",
            NameIdFormat::Persistent => "NAMEID_FORMAT_PERSISTENT",
            NameIdFormat::Transient => "NAMEID_FORMAT_TRANSIENT",
            NameIdFormat::Encrypted => "NAMEID_FORMAT_ENCRYPTED",
        }
    }

    /// Look up a format by constant name, short name (`emailAddress`) or full URN.
    ///
    /// Never fails: unknown or missing values resolve to `Unspecified`.
    pub fn lookup(value: Option<&str>) -> Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return NameIdFormat::Unspecified;
        };

        Self::ALL
            .into_iter()
            .find(|format| {
                format.constant_name() == value
                    || format.as_urn() == value
                    || format
                        .as_urn()
                        .rsplit(':')
                        .next()
                        .is_some_and(|short| short == value)
            })
            .unwrap_or_else(|| {
                tracing::debug!(
                    name_id_format = %value,
                    "Unrecognized NameID format, falling back to unspecified"
                );
                NameIdFormat::Unspecified
            })
    }
}

impl std::fmt::Display for NameIdFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_urn())
    }
}
