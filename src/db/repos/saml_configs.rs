//! Repository for stored SAML SP settings records.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{CreateSamlConfig, SamlConfigRow, UpdateSamlConfig},
};

/// Repository for stored SP settings records.
///
/// Deployments normally hold a single record. When several exist, the
/// earliest created one is authoritative (see [`first`](Self::first)).
#[async_trait]
pub trait SamlConfigRepo: Send + Sync {
    /// Store a new settings record.
    async fn create(&self, input: CreateSamlConfig) -> DbResult<SamlConfigRow>;

    /// The earliest record by creation time, ties broken by id.
    ///
    /// Returns `None` when no record is stored.
    async fn first(&self) -> DbResult<Option<SamlConfigRow>>;

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<SamlConfigRow>>;

    /// All records, oldest first.
    async fn list(&self) -> DbResult<Vec<SamlConfigRow>>;

    /// Replace the settings and revision of a record.
    ///
    /// # Errors
    /// Returns `DbError::NotFound` if no record has this id.
    async fn update(&self, id: Uuid, input: UpdateSamlConfig) -> DbResult<SamlConfigRow>;

    /// Delete a record.
    ///
    /// # Errors
    /// Returns `DbError::NotFound` if no record has this id.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
