//! The configuration document handed to the SAML toolkit.
//!
//! Key names and nesting are fixed by the toolkit; field renames below must
//! not change.

use serde::{Deserialize, Serialize};

use super::Binding;

/// Root of the SP configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpConfigDocument {
    /// Full path to the xmlsec binary.
    pub xmlsec_binary: String,
    /// Our entity id, usually the URL of the metadata view.
    #[serde(rename = "entityid")]
    pub entity_id: String,
    /// Directory holding the attribute maps.
    pub attribute_map_dir: String,
    /// Services we provide (a single SP).
    pub service: ServiceBlock,
    /// Where IdP metadata is stored.
    pub metadata: MetadataBlock,
    pub debug: u8,
    /// Signing key (private part).
    pub key_file: String,
    /// Signing certificate (public part).
    pub cert_file: String,
    pub encryption_keypairs: Vec<KeyPair>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBlock {
    pub sp: SpBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpBlock {
    pub name_id_format: String,
    pub allow_unsolicited: bool,
    pub endpoints: Endpoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub assertion_consumer_service: Vec<Endpoint>,
    pub single_logout_service: Vec<Endpoint>,
}

/// A `(url, binding)` pair, serialized as a two-element array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint(pub String, pub Binding);

impl Endpoint {
    pub fn url(&self) -> &str {
        &self.0
    }

    pub fn binding(&self) -> Binding {
        self.1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataBlock {
    pub local: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub key_file: String,
    pub cert_file: String,
}
