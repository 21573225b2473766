//! SQLite implementation of the SP settings repository.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::common::{parse_json, parse_uuid};
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::SamlConfigRepo,
    },
    models::{CreateSamlConfig, SamlConfigRow, UpdateSamlConfig},
};

pub struct SqliteSamlConfigRepo {
    pool: SqlitePool,
}

impl SqliteSamlConfigRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Parse a SamlConfigRow from a database row.
    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> DbResult<SamlConfigRow> {
        Ok(SamlConfigRow {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            schema_version: row.get("schema_version"),
            settings: parse_json(&row.get::<String, _>("settings"))?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl SamlConfigRepo for SqliteSamlConfigRepo {
    async fn create(&self, input: CreateSamlConfig) -> DbResult<SamlConfigRow> {
        if !input.settings.is_object() {
            return Err(DbError::Validation(
                "SP settings must be a JSON object".into(),
            ));
        }

        let id = Uuid::new_v4();
        let now = chrono::Utc::now();
        let settings = serde_json::to_string(&input.settings)?;

        sqlx::query(
            r#"
            INSERT INTO saml_configs (id, schema_version, settings, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(input.schema_version)
        .bind(&settings)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(SamlConfigRow {
            id,
            schema_version: input.schema_version,
            settings: input.settings,
            created_at: now,
            updated_at: now,
        })
    }

    async fn first(&self) -> DbResult<Option<SamlConfigRow>> {
        let row = sqlx::query(
            r#"
            SELECT id, schema_version, settings, created_at, updated_at
            FROM saml_configs
            ORDER BY created_at ASC, id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_row(&r)).transpose()
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<SamlConfigRow>> {
        let row = sqlx::query(
            r#"
            SELECT id, schema_version, settings, created_at, updated_at
            FROM saml_configs
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| Self::parse_row(&r)).transpose()
    }

    async fn list(&self) -> DbResult<Vec<SamlConfigRow>> {
        let rows = sqlx::query(
            r#"
            SELECT id, schema_version, settings, created_at, updated_at
            FROM saml_configs
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::parse_row).collect()
    }

    async fn update(&self, id: Uuid, input: UpdateSamlConfig) -> DbResult<SamlConfigRow> {
        if !input.settings.is_object() {
            return Err(DbError::Validation(
                "SP settings must be a JSON object".into(),
            ));
        }

        let settings = serde_json::to_string(&input.settings)?;
        let result = sqlx::query(
            r#"
            UPDATE saml_configs
            SET schema_version = ?, settings = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(input.schema_version)
        .bind(&settings)
        .bind(chrono::Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM saml_configs WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        db::upgrade_legacy_records,
        models::{CURRENT_SCHEMA_VERSION, LEGACY_SCHEMA_VERSION, SpSettings},
        saml::{AssemblyContext, assemble},
    };

    async fn create_test_pool() -> SqlitePool {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory SQLite pool");

        sqlx::migrate!("./migrations_sqlx/sqlite")
            .run(&pool)
            .await
            .expect("Failed to run SQLite migrations");

        pool
    }

    fn settings(entity_id: &str) -> serde_json::Value {
        json!({
            "sp_entity_id": entity_id,
            "attributes_dir": "attribute-maps/saml_uri.py",
            "acs_uri": "https://sp.example/acs",
            "single_logout_service_uri_redirect": "https://sp.example/slo/redirect",
            "single_logout_service_uri_post": "https://sp.example/slo/post",
            "metadata_file": "meta.xml",
            "sp_key_file": "sp.key",
            "sp_certificate_file": "sp.pem"
        })
    }

    fn create_input(entity_id: &str) -> CreateSamlConfig {
        CreateSamlConfig {
            schema_version: CURRENT_SCHEMA_VERSION,
            settings: settings(entity_id),
        }
    }

    #[tokio::test]
    async fn test_first_on_empty_table() {
        let repo = SqliteSamlConfigRepo::new(create_test_pool().await);

        assert!(repo.first().await.expect("Failed to query").is_none());
    }

    #[tokio::test]
    async fn test_create_and_get_by_id() {
        let repo = SqliteSamlConfigRepo::new(create_test_pool().await);

        let created = repo
            .create(create_input("https://sp.example/metadata"))
            .await
            .expect("Failed to create record");
        let fetched = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to fetch record")
            .expect("Record should exist");

        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(fetched.settings, settings("https://sp.example/metadata"));
    }

    #[tokio::test]
    async fn test_first_returns_earliest_record() {
        let repo = SqliteSamlConfigRepo::new(create_test_pool().await);

        let first = repo
            .create(create_input("https://first.example/metadata"))
            .await
            .expect("Failed to create record");
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.create(create_input("https://second.example/metadata"))
            .await
            .expect("Failed to create record");

        let row = repo.first().await.expect("Failed to query").unwrap();
        assert_eq!(row.id, first.id);

        let all = repo.list().await.expect("Failed to list");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, first.id);
    }

    #[tokio::test]
    async fn test_create_rejects_non_object_settings() {
        let repo = SqliteSamlConfigRepo::new(create_test_pool().await);

        let result = repo
            .create(CreateSamlConfig {
                schema_version: CURRENT_SCHEMA_VERSION,
                settings: json!(["not", "an", "object"]),
            })
            .await;
        assert!(matches!(result, Err(DbError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = SqliteSamlConfigRepo::new(create_test_pool().await);
        let created = repo
            .create(create_input("https://sp.example/metadata"))
            .await
            .expect("Failed to create record");

        repo.delete(created.id).await.expect("Failed to delete");
        assert!(repo.first().await.unwrap().is_none());
        assert!(matches!(
            repo.delete(created.id).await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_update_replaces_settings() {
        let repo = SqliteSamlConfigRepo::new(create_test_pool().await);
        let created = repo
            .create(create_input("https://sp.example/metadata"))
            .await
            .expect("Failed to create record");

        let updated = repo
            .update(
                created.id,
                UpdateSamlConfig {
                    schema_version: CURRENT_SCHEMA_VERSION,
                    settings: settings("https://new.example/metadata"),
                },
            )
            .await
            .expect("Failed to update record");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.settings, settings("https://new.example/metadata"));
        assert!(matches!(
            repo.update(
                Uuid::new_v4(),
                UpdateSamlConfig {
                    schema_version: CURRENT_SCHEMA_VERSION,
                    settings: settings("https://sp.example/metadata"),
                },
            )
            .await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_revision_1_rows_upgraded_outside_schema_migrations() {
        let repo = SqliteSamlConfigRepo::new(create_test_pool().await);
        let legacy = json!({
            "idp_entity": "https://sp.example/metadata",
            "attributes_dir": "maps",
            "acs_uri": "https://sp.example/acs",
            "single_logout_service_uri_redirect": "https://sp.example/slo/redirect",
            "single_logout_service_uri_post": "https://sp.example/slo/post",
            "metadata_file": "meta.xml",
            "sp_key_file": "sp.key",
            "sp_certificate_file": "sp.pem"
        });
        let created = repo
            .create(CreateSamlConfig {
                schema_version: LEGACY_SCHEMA_VERSION,
                settings: legacy.clone(),
            })
            .await
            .expect("Failed to create record");

        // Re-running the schema migrations must not touch stored settings
        sqlx::migrate!("./migrations_sqlx/sqlite")
            .run(&repo.pool)
            .await
            .expect("Failed to run SQLite migrations");

        let row = repo
            .get_by_id(created.id)
            .await
            .unwrap()
            .expect("Record should exist");
        assert_eq!(row.schema_version, LEGACY_SCHEMA_VERSION);
        assert_eq!(row.settings, legacy);

        let mut ctx = AssemblyContext::new("/base");
        ctx.attribute_map_filename = "basic.py".into();
        let settings = SpSettings::from_row(&row, &ctx.attribute_map_filename).unwrap();
        let document = assemble(&settings, &ctx).unwrap();
        assert_eq!(document.attribute_map_dir, "/base/maps");

        let report = upgrade_legacy_records(&repo, &ctx.attribute_map_filename)
            .await
            .unwrap();
        assert_eq!(report.upgraded, 1);

        let row = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(row.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(row.settings["attributes_dir"], "maps/basic.py");
        let upgraded = SpSettings::from_row(&row, &ctx.attribute_map_filename).unwrap();
        assert_eq!(assemble(&upgraded, &ctx).unwrap(), document);
    }
}
