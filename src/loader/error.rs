use thiserror::Error;

use crate::{db::DbError, models::SettingsError};

/// The single error kind surfaced by configuration loading.
///
/// Every failure between reading the loader path and returning an
/// [`SpConfig`](crate::saml::SpConfig) ends up here; nothing is recovered.
#[derive(Debug, Error)]
pub enum ImproperlyConfigured {
    #[error("Is SAML_CONFIG_LOADER a correct string with a callable path? Got '{path}'")]
    MalformedLoaderPath { path: String },

    #[error("Error importing SAML config loader {path}: \"{detail}\"")]
    LoaderImport { path: String, detail: String },

    #[error("Module \"{module}\" does not define a \"{attr}\" config loader")]
    MissingLoaderAttribute { module: String, attr: String },

    #[error("SAML config loader must be a callable object. '{path}' is not")]
    LoaderNotCallable { path: String },

    #[error("No SAML SP settings record is stored")]
    RecordMissing,

    #[error("SP settings field '{field}' cannot be mapped: {detail}")]
    FieldMapping { field: &'static str, detail: String },

    #[error("Unsupported SP settings schema version {0}")]
    UnsupportedSchemaVersion(i64),

    #[error("SAML configuration rejected: {0}")]
    InvalidDocument(String),

    #[error("Failed to read SP settings: {0}")]
    Storage(#[from] DbError),
}

impl From<SettingsError> for ImproperlyConfigured {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::MissingField(field) => ImproperlyConfigured::FieldMapping {
                field,
                detail: "field is missing".to_string(),
            },
            SettingsError::InvalidField { field, detail } => {
                ImproperlyConfigured::FieldMapping { field, detail }
            }
            SettingsError::Malformed(e) => ImproperlyConfigured::FieldMapping {
                field: "settings",
                detail: e.to_string(),
            },
            SettingsError::UnsupportedSchemaVersion(v) => {
                ImproperlyConfigured::UnsupportedSchemaVersion(v)
            }
        }
    }
}
