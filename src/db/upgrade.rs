//! Rewrites stored revision 1 settings records to the current revision.
//!
//! Lives outside the SQL migrations because the rewrite depends on the
//! configured attribute-map file name.

use super::{error::DbResult, repos::SamlConfigRepo};
use crate::models::{LEGACY_SCHEMA_VERSION, LegacySpSettings, UpdateSamlConfig};

/// Outcome of [`upgrade_legacy_records`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpgradeReport {
    pub upgraded: usize,
    /// Revision 1 records left as they were because they could not be parsed.
    pub skipped: usize,
}

/// Rewrite every revision 1 record, appending `attribute_map_filename` to its
/// attribute directory.
///
/// Records that fail to parse are left untouched; loading them still reports
/// the offending field.
pub async fn upgrade_legacy_records(
    repo: &dyn SamlConfigRepo,
    attribute_map_filename: &str,
) -> DbResult<UpgradeReport> {
    let mut report = UpgradeReport::default();

    for row in repo.list().await? {
        if row.schema_version != LEGACY_SCHEMA_VERSION {
            continue;
        }

        let legacy = match LegacySpSettings::from_value(&row.settings) {
            Ok(legacy) => legacy,
            Err(e) => {
                tracing::warn!(record_id = %row.id, error = %e, "Skipping revision 1 SP settings record");
                report.skipped += 1;
                continue;
            }
        };

        let current = legacy.into_current(attribute_map_filename);
        repo.update(row.id, UpdateSamlConfig::from_settings(&current)?)
            .await?;
        tracing::info!(record_id = %row.id, "Upgraded SP settings record to the current revision");
        report.upgraded += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        db::MemorySamlConfigRepo,
        models::{CURRENT_SCHEMA_VERSION, CreateSamlConfig, SpSettings},
        saml::{AssemblyContext, assemble},
    };

    fn legacy_settings() -> serde_json::Value {
        json!({
            "idp_entity": "https://sp.example/metadata",
            "attributes_dir": "maps",
            "acs_uri": "https://sp.example/acs",
            "single_logout_service_uri_redirect": "https://sp.example/slo/redirect",
            "single_logout_service_uri_post": "https://sp.example/slo/post",
            "metadata_file": "meta.xml",
            "sp_key_file": "sp.key",
            "sp_certificate_file": "sp.pem"
        })
    }

    fn basic_ctx() -> AssemblyContext {
        let mut ctx = AssemblyContext::new("/base");
        ctx.attribute_map_filename = "basic.py".into();
        ctx
    }

    #[tokio::test]
    async fn test_upgrade_uses_configured_filename() {
        let repo = MemorySamlConfigRepo::new();
        let row = repo
            .create(CreateSamlConfig {
                schema_version: LEGACY_SCHEMA_VERSION,
                settings: legacy_settings(),
            })
            .await
            .unwrap();
        let ctx = basic_ctx();

        let before = SpSettings::from_row(&row, &ctx.attribute_map_filename).unwrap();
        assert_eq!(
            assemble(&before, &ctx).unwrap().attribute_map_dir,
            "/base/maps"
        );

        let report = upgrade_legacy_records(&repo, &ctx.attribute_map_filename)
            .await
            .unwrap();
        assert_eq!(
            report,
            UpgradeReport {
                upgraded: 1,
                skipped: 0
            }
        );

        let row = repo.first().await.unwrap().unwrap();
        assert_eq!(row.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(row.settings["sp_entity_id"], "https://sp.example/metadata");
        assert_eq!(row.settings["attributes_dir"], "maps/basic.py");

        let after = SpSettings::from_row(&row, &ctx.attribute_map_filename).unwrap();
        assert_eq!(assemble(&after, &ctx).unwrap(), assemble(&before, &ctx).unwrap());
    }

    #[tokio::test]
    async fn test_upgrade_skips_unparseable_and_current_records() {
        let repo = MemorySamlConfigRepo::new();
        let mut broken = legacy_settings();
        broken.as_object_mut().unwrap().remove("idp_entity");
        let broken = repo
            .create(CreateSamlConfig {
                schema_version: LEGACY_SCHEMA_VERSION,
                settings: broken,
            })
            .await
            .unwrap();
        let current = repo
            .create(CreateSamlConfig {
                schema_version: CURRENT_SCHEMA_VERSION,
                settings: json!({ "sp_entity_id": "https://current.example/metadata" }),
            })
            .await
            .unwrap();

        let report = upgrade_legacy_records(&repo, "saml_uri.py").await.unwrap();
        assert_eq!(
            report,
            UpgradeReport {
                upgraded: 0,
                skipped: 1
            }
        );

        let broken_after = repo.get_by_id(broken.id).await.unwrap().unwrap();
        assert_eq!(broken_after.schema_version, LEGACY_SCHEMA_VERSION);
        let current_after = repo.get_by_id(current.id).await.unwrap().unwrap();
        assert_eq!(current_after.settings, current.settings);
    }
}
