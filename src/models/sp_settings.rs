//! Versioned shapes of the stored SP settings object.
//!
//! Revision 2 is the only shape the assembler understands. Revision 1 rows
//! are migrated in memory on read:
//!
//! | revision 1       | revision 2                                   |
//! |------------------|----------------------------------------------|
//! | `idp_entity`     | `sp_entity_id`                               |
//! | `attributes_dir` | `attributes_dir` + `/` + attribute-map file  |

use serde::{Deserialize, Serialize};

use super::SamlConfigRow;

/// Revision with `idp_entity` and a bare attribute-map directory.
pub const LEGACY_SCHEMA_VERSION: i64 = 1;

/// Revision with `sp_entity_id` and base-directory-relative file references.
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// Errors raised while mapping a stored settings object.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("SP settings record has no '{0}' field")]
    MissingField(&'static str),

    #[error("SP settings field '{field}' is invalid: {detail}")]
    InvalidField { field: &'static str, detail: String },

    #[error("SP settings record is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported SP settings schema version {0}")]
    UnsupportedSchemaVersion(i64),
}

/// SP settings, current revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpSettings {
    /// SP entity id, copied verbatim into the document
    pub sp_entity_id: String,
    /// Attribute-map reference ending in the attribute-map file name
    pub attributes_dir: String,
    /// NameID format, by constant name or URN
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id_format: Option<String>,
    /// Assertion Consumer Service URL
    pub acs_uri: String,
    /// Single Logout Service URL (HTTP-Redirect binding)
    pub single_logout_service_uri_redirect: String,
    /// Single Logout Service URL (HTTP-POST binding)
    pub single_logout_service_uri_post: String,
    /// IdP metadata file, relative to the base directory
    pub metadata_file: String,
    /// SP private key file, relative to the base directory
    pub sp_key_file: String,
    /// SP certificate file, relative to the base directory
    pub sp_certificate_file: String,
}

/// SP settings, revision 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacySpSettings {
    pub idp_entity: String,
    /// Attribute-map directory
    pub attributes_dir: String,
    pub name_id_format: Option<String>,
    pub acs_uri: String,
    pub single_logout_service_uri_redirect: String,
    pub single_logout_service_uri_post: String,
    pub metadata_file: String,
    pub sp_key_file: String,
    pub sp_certificate_file: String,
}

/// Wire shape shared by both revisions; every field optional so that a
/// missing key can be reported by name.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    sp_entity_id: Option<String>,
    idp_entity: Option<String>,
    attributes_dir: Option<String>,
    name_id_format: Option<String>,
    acs_uri: Option<String>,
    single_logout_service_uri_redirect: Option<String>,
    single_logout_service_uri_post: Option<String>,
    metadata_file: Option<String>,
    sp_key_file: Option<String>,
    sp_certificate_file: Option<String>,
}

/// Present and not blank. Blank values are rejected even though pysaml2
/// would accept them.
fn required(field: &'static str, value: Option<String>) -> Result<String, SettingsError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        Some(_) => Err(SettingsError::InvalidField {
            field,
            detail: "value is empty".to_string(),
        }),
        None => Err(SettingsError::MissingField(field)),
    }
}

impl SpSettings {
    /// Map a stored row to current-revision settings, migrating older revisions.
    ///
    /// `attribute_map_filename` is appended to revision 1 attribute directories.
    pub fn from_row(
        row: &SamlConfigRow,
        attribute_map_filename: &str,
    ) -> Result<Self, SettingsError> {
        match row.schema_version {
            CURRENT_SCHEMA_VERSION => Self::from_value(&row.settings),
            LEGACY_SCHEMA_VERSION => {
                let legacy = LegacySpSettings::from_value(&row.settings)?;
                tracing::debug!(
                    record_id = %row.id,
                    "Migrating revision 1 SP settings record in memory"
                );
                Ok(legacy.into_current(attribute_map_filename))
            }
            other => Err(SettingsError::UnsupportedSchemaVersion(other)),
        }
    }

    /// Parse a current-revision settings object.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SettingsError> {
        let raw = RawSettings::deserialize(value)?;
        Ok(Self {
            sp_entity_id: required("sp_entity_id", raw.sp_entity_id)?,
            attributes_dir: required("attributes_dir", raw.attributes_dir)?,
            name_id_format: raw.name_id_format,
            acs_uri: required("acs_uri", raw.acs_uri)?,
            single_logout_service_uri_redirect: required(
                "single_logout_service_uri_redirect",
                raw.single_logout_service_uri_redirect,
            )?,
            single_logout_service_uri_post: required(
                "single_logout_service_uri_post",
                raw.single_logout_service_uri_post,
            )?,
            metadata_file: required("metadata_file", raw.metadata_file)?,
            sp_key_file: required("sp_key_file", raw.sp_key_file)?,
            sp_certificate_file: required("sp_certificate_file", raw.sp_certificate_file)?,
        })
    }
}

impl LegacySpSettings {
    /// Parse a revision 1 settings object.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, SettingsError> {
        let raw = RawSettings::deserialize(value)?;
        Ok(Self {
            idp_entity: required("idp_entity", raw.idp_entity)?,
            attributes_dir: required("attributes_dir", raw.attributes_dir)?,
            name_id_format: raw.name_id_format,
            acs_uri: required("acs_uri", raw.acs_uri)?,
            single_logout_service_uri_redirect: required(
                "single_logout_service_uri_redirect",
                raw.single_logout_service_uri_redirect,
            )?,
            single_logout_service_uri_post: required(
                "single_logout_service_uri_post",
                raw.single_logout_service_uri_post,
            )?,
            metadata_file: required("metadata_file", raw.metadata_file)?,
            sp_key_file: required("sp_key_file", raw.sp_key_file)?,
            sp_certificate_file: required("sp_certificate_file", raw.sp_certificate_file)?,
        })
    }

    /// Rewrite into the current revision.
    pub fn into_current(self, attribute_map_filename: &str) -> SpSettings {
        let dir = self.attributes_dir.trim_end_matches('/');
        SpSettings {
            sp_entity_id: self.idp_entity,
            attributes_dir: format!("{dir}/{attribute_map_filename}"),
            name_id_format: self.name_id_format,
            acs_uri: self.acs_uri,
            single_logout_service_uri_redirect: self.single_logout_service_uri_redirect,
            single_logout_service_uri_post: self.single_logout_service_uri_post,
            metadata_file: self.metadata_file,
            sp_key_file: self.sp_key_file,
            sp_certificate_file: self.sp_certificate_file,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn current_settings_json() -> serde_json::Value {
        json!({
            "sp_entity_id": "https://sp.example/metadata",
            "attributes_dir": "attribute-maps/saml_uri.py",
            "name_id_format": "NAMEID_FORMAT_EMAILADDRESS",
            "acs_uri": "https://sp.example/acs",
            "single_logout_service_uri_redirect": "https://sp.example/slo/redirect",
            "single_logout_service_uri_post": "https://sp.example/slo/post",
            "metadata_file": "meta.xml",
            "sp_key_file": "sp.key",
            "sp_certificate_file": "sp.pem"
        })
    }

    fn row(schema_version: i64, settings: serde_json::Value) -> SamlConfigRow {
        SamlConfigRow {
            id: Uuid::new_v4(),
            schema_version,
            settings,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_parse_current_revision() {
        let settings =
            SpSettings::from_row(&row(2, current_settings_json()), "saml_uri.py").unwrap();

        assert_eq!(settings.sp_entity_id, "https://sp.example/metadata");
        assert_eq!(settings.attributes_dir, "attribute-maps/saml_uri.py");
        assert_eq!(
            settings.name_id_format.as_deref(),
            Some("NAMEID_FORMAT_EMAILADDRESS")
        );
        assert_eq!(settings.sp_certificate_file, "sp.pem");
    }

    #[test]
    fn test_missing_field_named() {
        let mut value = current_settings_json();
        value.as_object_mut().unwrap().remove("sp_key_file");

        let err = SpSettings::from_value(&value).unwrap_err();
        assert!(matches!(err, SettingsError::MissingField("sp_key_file")));
    }

    #[test]
    fn test_revision_1_field_on_current_row_is_missing_field() {
        let mut value = current_settings_json();
        let map = value.as_object_mut().unwrap();
        let entity = map.remove("sp_entity_id").unwrap();
        map.insert("idp_entity".into(), entity);

        let err = SpSettings::from_row(&row(2, value), "saml_uri.py").unwrap_err();
        assert!(matches!(err, SettingsError::MissingField("sp_entity_id")));
    }

    #[test]
    fn test_empty_field_rejected() {
        let mut value = current_settings_json();
        value["metadata_file"] = json!("");

        let err = SpSettings::from_value(&value).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::InvalidField {
                field: "metadata_file",
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_type_is_malformed() {
        let mut value = current_settings_json();
        value["acs_uri"] = json!(42);

        let err = SpSettings::from_value(&value).unwrap_err();
        assert!(matches!(err, SettingsError::Malformed(_)));
    }

    #[test]
    fn test_name_id_format_optional() {
        let mut value = current_settings_json();
        value.as_object_mut().unwrap().remove("name_id_format");

        let settings = SpSettings::from_value(&value).unwrap();
        assert!(settings.name_id_format.is_none());
    }

    #[test]
    fn test_legacy_row_migrated() {
        let legacy = json!({
            "idp_entity": "https://sp.example/metadata",
            "attributes_dir": "attribute-maps/",
            "acs_uri": "https://sp.example/acs",
            "single_logout_service_uri_redirect": "https://sp.example/slo/redirect",
            "single_logout_service_uri_post": "https://sp.example/slo/post",
            "metadata_file": "meta.xml",
            "sp_key_file": "sp.key",
            "sp_certificate_file": "sp.pem"
        });

        let settings = SpSettings::from_row(&row(1, legacy), "saml_uri.py").unwrap();

        assert_eq!(settings.sp_entity_id, "https://sp.example/metadata");
        assert_eq!(settings.attributes_dir, "attribute-maps/saml_uri.py");
        assert!(settings.name_id_format.is_none());
    }

    #[test]
    fn test_unsupported_schema_version() {
        let err = SpSettings::from_row(&row(7, current_settings_json()), "saml_uri.py")
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedSchemaVersion(7)));
    }
}
