use std::sync::Arc;

use async_trait::async_trait;

use super::{ConfigLoader, ImproperlyConfigured, RequestContext};
use crate::{
    db::SamlConfigRepo,
    models::SpSettings,
    saml::{AssemblyContext, SpConfig, assemble},
};

/// The built-in loader: reads the first stored SP settings record.
///
/// Registered as `saml_sp_conf.conf.config_settings_loader`. Request data is
/// ignored.
pub struct ConfigSettingsLoader {
    repo: Arc<dyn SamlConfigRepo>,
    ctx: AssemblyContext,
}

impl ConfigSettingsLoader {
    pub fn new(repo: Arc<dyn SamlConfigRepo>, ctx: AssemblyContext) -> Self {
        Self { repo, ctx }
    }
}

#[async_trait]
impl ConfigLoader for ConfigSettingsLoader {
    async fn load(
        &self,
        _request: Option<&RequestContext>,
    ) -> Result<SpConfig, ImproperlyConfigured> {
        let row = self
            .repo
            .first()
            .await?
            .ok_or(ImproperlyConfigured::RecordMissing)?;

        let settings = SpSettings::from_row(&row, &self.ctx.attribute_map_filename)?;
        let document = assemble(&settings, &self.ctx)?;

        tracing::debug!(
            record_id = %row.id,
            schema_version = row.schema_version,
            "Assembled SP configuration from stored settings"
        );

        SpConfig::load(document)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        db::MemorySamlConfigRepo,
        models::{CURRENT_SCHEMA_VERSION, CreateSamlConfig, LEGACY_SCHEMA_VERSION},
    };

    fn current_settings() -> serde_json::Value {
        json!({
            "sp_entity_id": "https://sp.example/metadata",
            "attributes_dir": "attribute-maps/saml_uri.py",
            "acs_uri": "https://sp.example/acs",
            "single_logout_service_uri_redirect": "https://sp.example/slo/redirect",
            "single_logout_service_uri_post": "https://sp.example/slo/post",
            "metadata_file": "meta.xml",
            "sp_key_file": "sp.key",
            "sp_certificate_file": "sp.pem"
        })
    }

    fn loader(repo: Arc<MemorySamlConfigRepo>) -> ConfigSettingsLoader {
        ConfigSettingsLoader::new(repo, AssemblyContext::new("/home/svc/media"))
    }

    #[tokio::test]
    async fn test_empty_store_is_record_missing() {
        let loader = loader(Arc::new(MemorySamlConfigRepo::new()));

        let err = loader.load(None).await.unwrap_err();
        assert!(matches!(err, ImproperlyConfigured::RecordMissing));
    }

    #[tokio::test]
    async fn test_loads_first_record() {
        let repo = Arc::new(MemorySamlConfigRepo::new());
        repo.create(CreateSamlConfig {
            schema_version: CURRENT_SCHEMA_VERSION,
            settings: current_settings(),
        })
        .await
        .unwrap();
        let mut second = current_settings();
        second["sp_entity_id"] = json!("https://other.example/metadata");
        repo.create(CreateSamlConfig {
            schema_version: CURRENT_SCHEMA_VERSION,
            settings: second,
        })
        .await
        .unwrap();

        let config = loader(repo).load(None).await.unwrap();
        assert_eq!(config.entity_id(), "https://sp.example/metadata");
        assert_eq!(config.key_file(), "/home/svc/media/sp.key");
    }

    #[tokio::test]
    async fn test_missing_field_is_field_mapping() {
        let repo = Arc::new(MemorySamlConfigRepo::new());
        let mut settings = current_settings();
        settings.as_object_mut().unwrap().remove("acs_uri");
        repo.create(CreateSamlConfig {
            schema_version: CURRENT_SCHEMA_VERSION,
            settings,
        })
        .await
        .unwrap();

        let err = loader(repo).load(None).await.unwrap_err();
        assert!(matches!(
            err,
            ImproperlyConfigured::FieldMapping {
                field: "acs_uri",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_legacy_record_matches_migrated_record() {
        let legacy_repo = Arc::new(MemorySamlConfigRepo::new());
        let mut legacy = current_settings();
        let map = legacy.as_object_mut().unwrap();
        let entity = map.remove("sp_entity_id").unwrap();
        map.insert("idp_entity".into(), entity);
        map.insert("attributes_dir".into(), json!("attribute-maps"));
        legacy_repo
            .create(CreateSamlConfig {
                schema_version: LEGACY_SCHEMA_VERSION,
                settings: legacy,
            })
            .await
            .unwrap();

        let current_repo = Arc::new(MemorySamlConfigRepo::new());
        current_repo
            .create(CreateSamlConfig {
                schema_version: CURRENT_SCHEMA_VERSION,
                settings: current_settings(),
            })
            .await
            .unwrap();

        let from_legacy = loader(legacy_repo).load(None).await.unwrap();
        let from_current = loader(current_repo).load(None).await.unwrap();
        assert_eq!(from_legacy, from_current);
    }

    #[tokio::test]
    async fn test_request_context_ignored() {
        let repo = Arc::new(MemorySamlConfigRepo::new());
        repo.create(CreateSamlConfig {
            schema_version: CURRENT_SCHEMA_VERSION,
            settings: current_settings(),
        })
        .await
        .unwrap();
        let loader = loader(repo);

        let request = RequestContext {
            host: Some("tenant.example".into()),
            path: Some("/saml2/login/".into()),
            is_secure: Some(true),
        };
        let with_request = loader.load(Some(&request)).await.unwrap();
        let without = loader.load(None).await.unwrap();
        assert_eq!(with_request, without);
    }
}
