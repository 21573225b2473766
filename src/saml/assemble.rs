//! Mapping of stored SP settings onto the toolkit's configuration document.

use std::path::{Path, PathBuf};

use super::{
    ATTRIBUTE_MAP_FILENAME, Binding, Endpoint, Endpoints, KeyPair, MetadataBlock, NameIdFormat,
    ServiceBlock, SpBlock, SpConfigDocument, XMLSEC_BINARY,
};
use crate::{
    config::{AppConfig, ConfigError},
    loader::ImproperlyConfigured,
    models::SpSettings,
};

/// Inputs of [`assemble`] that do not come from the stored record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssemblyContext {
    /// Directory that relative file references are joined onto.
    pub base_dir: PathBuf,
    /// Path of the xmlsec binary.
    pub xmlsec_binary: String,
    /// File name stripped from the attribute-map reference.
    pub attribute_map_filename: String,
}

impl AssemblyContext {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            xmlsec_binary: XMLSEC_BINARY.to_string(),
            attribute_map_filename: ATTRIBUTE_MAP_FILENAME.to_string(),
        }
    }

    /// Resolve the context from application configuration.
    ///
    /// This is the only place the home directory environment variable is read.
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            base_dir: config.media.base_dir()?,
            xmlsec_binary: config.saml.xmlsec_binary.clone(),
            attribute_map_filename: config.saml.attribute_map_filename.clone(),
        })
    }

    fn join(&self, field: &'static str, relative: &str) -> Result<String, ImproperlyConfigured> {
        path_string(field, &self.base_dir.join(relative))
    }
}

/// Build the SP configuration document from current-revision settings.
///
/// Pure function of its inputs. Relative file references are joined onto
/// `ctx.base_dir`; absolute ones are kept as they are.
pub fn assemble(
    settings: &SpSettings,
    ctx: &AssemblyContext,
) -> Result<SpConfigDocument, ImproperlyConfigured> {
    let key_file = ctx.join("sp_key_file", &settings.sp_key_file)?;
    let cert_file = ctx.join("sp_certificate_file", &settings.sp_certificate_file)?;

    let attribute_dir =
        attribute_map_dir(&settings.attributes_dir, &ctx.attribute_map_filename);
    let attribute_map_dir = if attribute_dir.is_empty() {
        path_string("attributes_dir", &ctx.base_dir)?
    } else {
        ctx.join("attributes_dir", attribute_dir)?
    };

    let name_id_format = NameIdFormat::lookup(settings.name_id_format.as_deref());

    Ok(SpConfigDocument {
        xmlsec_binary: ctx.xmlsec_binary.clone(),
        entity_id: settings.sp_entity_id.clone(),
        attribute_map_dir,
        service: ServiceBlock {
            sp: SpBlock {
                name_id_format: name_id_format.as_urn().to_string(),
                allow_unsolicited: true,
                endpoints: Endpoints {
                    // Binding and order are fixed by the toolkit's views
                    assertion_consumer_service: vec![Endpoint(
                        settings.acs_uri.clone(),
                        Binding::HttpPost,
                    )],
                    single_logout_service: vec![
                        Endpoint(
                            settings.single_logout_service_uri_redirect.clone(),
                            Binding::HttpRedirect,
                        ),
                        Endpoint(
                            settings.single_logout_service_uri_post.clone(),
                            Binding::HttpPost,
                        ),
                    ],
                },
            },
        },
        metadata: MetadataBlock {
            local: vec![ctx.join("metadata_file", &settings.metadata_file)?],
        },
        debug: 1,
        key_file: key_file.clone(),
        cert_file: cert_file.clone(),
        encryption_keypairs: vec![KeyPair {
            key_file,
            cert_file,
        }],
    })
}

/// Recover the attribute-map directory from a reference ending in `filename`.
///
/// The file name only counts as a suffix when it is a whole path component.
/// A reference without it is taken to be the directory already.
fn attribute_map_dir<'a>(reference: &'a str, filename: &str) -> &'a str {
    match reference.strip_suffix(filename) {
        Some(dir) if dir.is_empty() || dir.ends_with('/') => dir.trim_end_matches('/'),
        _ => reference.trim_end_matches('/'),
    }
}

fn path_string(field: &'static str, path: &Path) -> Result<String, ImproperlyConfigured> {
    path.to_str()
        .map(str::to_string)
        .ok_or_else(|| ImproperlyConfigured::FieldMapping {
            field,
            detail: format!("path {} is not valid UTF-8", path.display()),
        })
}
