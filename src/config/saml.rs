use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::saml::{ATTRIBUTE_MAP_FILENAME, XMLSEC_BINARY};

/// Dotted path of the built-in loader that reads the stored SP settings record.
pub const DEFAULT_CONFIG_LOADER: &str = "saml_sp_conf.conf.config_settings_loader";

/// SAML loader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SamlSettings {
    /// Dotted path of the config loader to use when no override is given.
    /// Defaults to the built-in settings loader.
    #[serde(default)]
    pub config_loader: Option<String>,

    /// Path of the xmlsec binary handed to the SAML toolkit.
    #[serde(default = "default_xmlsec_binary")]
    pub xmlsec_binary: String,

    /// File name trailing the stored attribute-map reference. It is stripped
    /// to recover the attribute-map directory.
    #[serde(default = "default_attribute_map_filename")]
    pub attribute_map_filename: String,
}

impl Default for SamlSettings {
    fn default() -> Self {
        Self {
            config_loader: None,
            xmlsec_binary: default_xmlsec_binary(),
            attribute_map_filename: default_attribute_map_filename(),
        }
    }
}

impl SamlSettings {
    /// The loader path to resolve when the caller supplies no override.
    pub fn loader_path(&self) -> &str {
        self.config_loader.as_deref().unwrap_or(DEFAULT_CONFIG_LOADER)
    }

    pub fn uses_default_loader(&self) -> bool {
        self.loader_path() == DEFAULT_CONFIG_LOADER
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.config_loader
            && path.trim().is_empty()
        {
            return Err(ConfigError::Validation(
                "saml.config_loader cannot be empty; omit it to use the default loader".into(),
            ));
        }
        if self.xmlsec_binary.is_empty() {
            return Err(ConfigError::Validation(
                "saml.xmlsec_binary cannot be empty".into(),
            ));
        }
        if self.attribute_map_filename.contains('/') {
            return Err(ConfigError::Validation(format!(
                "saml.attribute_map_filename must be a bare file name, got '{}'",
                self.attribute_map_filename
            )));
        }
        Ok(())
    }
}

fn default_xmlsec_binary() -> String {
    XMLSEC_BINARY.to_string()
}

fn default_attribute_map_filename() -> String {
    ATTRIBUTE_MAP_FILENAME.to_string()
}
