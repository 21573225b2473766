//! In-process SP settings repository.
//!
//! Used when settings are supplied without a database (tests, embedding
//! applications that seed the record themselves).

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    error::{DbError, DbResult},
    repos::SamlConfigRepo,
};
use crate::models::{CreateSamlConfig, SamlConfigRow, UpdateSamlConfig};

#[derive(Debug, Default)]
pub struct MemorySamlConfigRepo {
    rows: RwLock<Vec<SamlConfigRow>>,
}

impl MemorySamlConfigRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

fn ensure_object(settings: &serde_json::Value) -> DbResult<()> {
    if !settings.is_object() {
        return Err(DbError::Validation(
            "SP settings must be a JSON object".into(),
        ));
    }
    Ok(())
}

#[async_trait]
impl SamlConfigRepo for MemorySamlConfigRepo {
    async fn create(&self, input: CreateSamlConfig) -> DbResult<SamlConfigRow> {
        ensure_object(&input.settings)?;

        let now = chrono::Utc::now();
        let row = SamlConfigRow {
            id: Uuid::new_v4(),
            schema_version: input.schema_version,
            settings: input.settings,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.push(row.clone());
        Ok(row)
    }

    async fn first(&self) -> DbResult<Option<SamlConfigRow>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .min_by_key(|r| (r.created_at, r.id))
            .cloned())
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<SamlConfigRow>> {
        Ok(self.rows.read().await.iter().find(|r| r.id == id).cloned())
    }

    async fn list(&self) -> DbResult<Vec<SamlConfigRow>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn update(&self, id: Uuid, input: UpdateSamlConfig) -> DbResult<SamlConfigRow> {
        ensure_object(&input.settings)?;

        let mut rows = self.rows.write().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DbError::NotFound)?;
        row.schema_version = input.schema_version;
        row.settings = input.settings;
        row.updated_at = chrono::Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut rows = self.rows.write().await;
        let index = rows
            .iter()
            .position(|r| r.id == id)
            .ok_or(DbError::NotFound)?;
        rows.remove(index);
        Ok(())
    }
}
