//! The loaded SP configuration object.

#[cfg(feature = "saml")]
use openssl::{pkey::PKey, x509::X509};
#[cfg(feature = "saml")]
use samael::{metadata::EntityDescriptor, service_provider::ServiceProviderBuilder};

use super::{Endpoint, SpConfigDocument};
use crate::loader::ImproperlyConfigured;

/// An SP configuration that passed [`SpConfig::load`].
///
/// Constructed fresh by every loader invocation; the underlying document is
/// never mutated after loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpConfig {
    document: SpConfigDocument,
}

impl SpConfig {
    /// Load a configuration document.
    ///
    /// Stricter than pysaml2: an empty entity id, no assertion consumer
    /// service, a relative endpoint URL or an empty `metadata.local` is
    /// rejected.
    pub fn load(document: SpConfigDocument) -> Result<Self, ImproperlyConfigured> {
        if document.entity_id.trim().is_empty() {
            return Err(ImproperlyConfigured::InvalidDocument(
                "entityid cannot be empty".into(),
            ));
        }

        let endpoints = &document.service.sp.endpoints;
        if endpoints.assertion_consumer_service.is_empty() {
            return Err(ImproperlyConfigured::InvalidDocument(
                "at least one assertion_consumer_service endpoint is required".into(),
            ));
        }

        for (service, endpoint) in endpoints
            .assertion_consumer_service
            .iter()
            .map(|e| ("assertion_consumer_service", e))
            .chain(
                endpoints
                    .single_logout_service
                    .iter()
                    .map(|e| ("single_logout_service", e)),
            )
        {
            url::Url::parse(endpoint.url()).map_err(|e| {
                ImproperlyConfigured::InvalidDocument(format!(
                    "{service} endpoint '{}' is not a valid URL: {e}",
                    endpoint.url()
                ))
            })?;
        }

        if document.metadata.local.is_empty() {
            return Err(ImproperlyConfigured::InvalidDocument(
                "metadata.local must list at least one file".into(),
            ));
        }

        tracing::debug!(
            entity_id = %document.entity_id,
            acs_endpoints = endpoints.assertion_consumer_service.len(),
            slo_endpoints = endpoints.single_logout_service.len(),
            "Loaded SP configuration"
        );

        Ok(Self { document })
    }

    pub fn entity_id(&self) -> &str {
        &self.document.entity_id
    }

    pub fn name_id_format(&self) -> &str {
        &self.document.service.sp.name_id_format
    }

    pub fn allow_unsolicited(&self) -> bool {
        self.document.service.sp.allow_unsolicited
    }

    pub fn acs_endpoints(&self) -> &[Endpoint] {
        &self.document.service.sp.endpoints.assertion_consumer_service
    }

    pub fn slo_endpoints(&self) -> &[Endpoint] {
        &self.document.service.sp.endpoints.single_logout_service
    }

    pub fn metadata_files(&self) -> &[String] {
        &self.document.metadata.local
    }

    pub fn attribute_map_dir(&self) -> &str {
        &self.document.attribute_map_dir
    }

    pub fn key_file(&self) -> &str {
        &self.document.key_file
    }

    pub fn cert_file(&self) -> &str {
        &self.document.cert_file
    }

    pub fn xmlsec_binary(&self) -> &str {
        &self.document.xmlsec_binary
    }

    /// The document this configuration was loaded from.
    pub fn document(&self) -> &SpConfigDocument {
        &self.document
    }

    pub fn into_document(self) -> SpConfigDocument {
        self.document
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.document)
    }

    /// Build a samael `ServiceProvider` from the referenced files.
    ///
    /// Reads the first local metadata file as IdP metadata and the PEM key
    /// and certificate from `key_file` / `cert_file`.
    #[cfg(feature = "saml")]
    pub fn service_provider(
        &self,
    ) -> Result<samael::service_provider::ServiceProvider, ImproperlyConfigured> {
        let metadata_path = self.metadata_files().first().ok_or_else(|| {
            ImproperlyConfigured::InvalidDocument("metadata.local is empty".into())
        })?;
        let metadata_xml = read_file("metadata", metadata_path)?;
        let idp_metadata: EntityDescriptor = samael::metadata::de::from_str(&metadata_xml)
            .map_err(|e| {
                ImproperlyConfigured::InvalidDocument(format!(
                    "failed to parse IdP metadata {metadata_path}: {e}"
                ))
            })?;

        let key = PKey::private_key_from_pem(read_file("key_file", self.key_file())?.as_bytes())
            .map_err(|e| {
                ImproperlyConfigured::InvalidDocument(format!(
                    "failed to parse SP private key {}: {e}",
                    self.key_file()
                ))
            })?;
        let certificate = X509::from_pem(read_file("cert_file", self.cert_file())?.as_bytes())
            .map_err(|e| {
                ImproperlyConfigured::InvalidDocument(format!(
                    "failed to parse SP certificate {}: {e}",
                    self.cert_file()
                ))
            })?;

        let mut builder = ServiceProviderBuilder::default();
        builder
            .entity_id(self.entity_id().to_string())
            .acs_url(self.acs_endpoints()[0].url().to_string())
            .idp_metadata(idp_metadata)
            .authn_name_id_format(self.name_id_format().to_string())
            .allow_idp_initiated(self.allow_unsolicited())
            .key(Some(key))
            .certificate(Some(certificate));
        if let Some(slo) = self.slo_endpoints().first() {
            builder.slo_url(slo.url().to_string());
        }

        builder.build().map_err(|e| {
            ImproperlyConfigured::InvalidDocument(format!("failed to build ServiceProvider: {e}"))
        })
    }
}

#[cfg(feature = "saml")]
fn read_file(what: &str, path: &str) -> Result<String, ImproperlyConfigured> {
    std::fs::read_to_string(path).map_err(|e| {
        ImproperlyConfigured::InvalidDocument(format!("failed to read {what} {path}: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::saml::{
        Binding, Endpoints, KeyPair, MetadataBlock, ServiceBlock, SpBlock, XMLSEC_BINARY,
    };

    fn document() -> SpConfigDocument {
        SpConfigDocument {
            xmlsec_binary: XMLSEC_BINARY.into(),
            entity_id: "https://sp.example/metadata".into(),
            attribute_map_dir: "/home/svc/media/attribute-maps".into(),
            service: ServiceBlock {
                sp: SpBlock {
                    name_id_format: "urn:oasis:names:tc:SAML:1.1:nameid-format:unspecified"
                        .into(),
                    allow_unsolicited: true,
                    endpoints: Endpoints {
                        assertion_consumer_service: vec![Endpoint(
                            "https://sp.example/acs".into(),
                            Binding::HttpPost,
                        )],
                        single_logout_service: vec![
                            Endpoint(
                                "https://sp.example/slo/redirect".into(),
                                Binding::HttpRedirect,
                            ),
                            Endpoint("https://sp.example/slo/post".into(), Binding::HttpPost),
                        ],
                    },
                },
            },
            metadata: MetadataBlock {
                local: vec!["/home/svc/media/meta.xml".into()],
            },
            debug: 1,
            key_file: "/home/svc/media/sp.key".into(),
            cert_file: "/home/svc/media/sp.pem".into(),
            encryption_keypairs: vec![KeyPair {
                key_file: "/home/svc/media/sp.key".into(),
                cert_file: "/home/svc/media/sp.pem".into(),
            }],
        }
    }

    #[test]
    fn test_load_valid_document() {
        let config = SpConfig::load(document()).unwrap();

        assert_eq!(config.entity_id(), "https://sp.example/metadata");
        assert!(config.allow_unsolicited());
        assert_eq!(config.acs_endpoints().len(), 1);
        assert_eq!(config.slo_endpoints()[0].binding(), Binding::HttpRedirect);
        assert_eq!(config.metadata_files(), ["/home/svc/media/meta.xml"]);
        assert_eq!(config.document(), &document());
    }

    #[test]
    fn test_load_rejects_empty_entity_id() {
        let mut doc = document();
        doc.entity_id = "  ".into();

        assert!(matches!(
            SpConfig::load(doc),
            Err(ImproperlyConfigured::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_load_rejects_relative_endpoint_url() {
        let mut doc = document();
        doc.service.sp.endpoints.single_logout_service[1].0 = "/slo/post".into();

        let err = SpConfig::load(doc).unwrap_err();
        assert!(err.to_string().contains("single_logout_service"), "{err}");
    }

    #[test]
    fn test_load_rejects_missing_acs() {
        let mut doc = document();
        doc.service.sp.endpoints.assertion_consumer_service.clear();

        assert!(SpConfig::load(doc).is_err());
    }

    #[test]
    fn test_to_json_pretty_round_trips() {
        let config = SpConfig::load(document()).unwrap();
        let json = config.to_json_pretty().unwrap();
        let parsed: SpConfigDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, document());
    }
}
