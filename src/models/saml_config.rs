use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CURRENT_SCHEMA_VERSION, SpSettings};

/// A persisted SP settings record.
///
/// The settings themselves are stored as a JSON object whose shape depends on
/// `schema_version`; see [`SpSettings::from_row`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamlConfigRow {
    /// Unique identifier for this record
    pub id: Uuid,
    /// Revision of the `settings` object
    pub schema_version: i64,
    /// Raw settings object
    pub settings: serde_json::Value,
    /// When this record was created
    pub created_at: DateTime<Utc>,
    /// When this record was last updated
    pub updated_at: DateTime<Utc>,
}

/// Request to store a new SP settings record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSamlConfig {
    /// Revision of the `settings` object (defaults to the current revision)
    #[serde(default = "default_schema_version")]
    pub schema_version: i64,
    /// Raw settings object
    pub settings: serde_json::Value,
}

/// Request to replace the settings of a stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSamlConfig {
    /// Revision of the new `settings` object
    pub schema_version: i64,
    /// Raw settings object
    pub settings: serde_json::Value,
}

impl UpdateSamlConfig {
    /// Build an update carrying current-revision settings.
    pub fn from_settings(settings: &SpSettings) -> Result<Self, serde_json::Error> {
        Ok(Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            settings: serde_json::to_value(settings)?,
        })
    }
}

fn default_schema_version() -> i64 {
    CURRENT_SCHEMA_VERSION
}
