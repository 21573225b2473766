use std::sync::Arc;

use super::{ImproperlyConfigured, LoaderRegistry, RequestContext};
use crate::{config::SamlSettings, saml::SpConfig};

/// Load the SP configuration.
///
/// The loader path is `loader_override` when given, otherwise the configured
/// `saml.config_loader`, otherwise the built-in default. The loader is
/// resolved and invoked exactly once; failures are returned unchanged.
pub async fn get_config(
    registry: &LoaderRegistry,
    settings: &SamlSettings,
    loader_override: Option<&str>,
    request: Option<&RequestContext>,
) -> Result<SpConfig, ImproperlyConfigured> {
    let path = loader_override.unwrap_or_else(|| settings.loader_path());
    let loader = registry.resolve(path)?;
    loader.load(request).await
}

/// Registry and settings bundled for callers that hold them as state.
#[derive(Debug, Clone)]
pub struct SamlConfigAccessor {
    registry: Arc<LoaderRegistry>,
    settings: SamlSettings,
}

impl SamlConfigAccessor {
    pub fn new(registry: Arc<LoaderRegistry>, settings: SamlSettings) -> Self {
        Self { registry, settings }
    }

    /// Path used when no override is given.
    pub fn loader_path(&self) -> &str {
        self.settings.loader_path()
    }

    pub async fn get_config(
        &self,
        loader_override: Option<&str>,
        request: Option<&RequestContext>,
    ) -> Result<SpConfig, ImproperlyConfigured> {
        get_config(&self.registry, &self.settings, loader_override, request).await
    }
}
