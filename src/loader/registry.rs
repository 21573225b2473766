use std::{collections::BTreeMap, sync::Arc};

use super::{ConfigSettingsLoader, ImproperlyConfigured, SharedConfigLoader};
use crate::{
    config::DEFAULT_CONFIG_LOADER,
    db::SamlConfigRepo,
    saml::{ATTRIBUTE_MAP_FILENAME, AssemblyContext, XMLSEC_BINARY},
};

/// Module under which the built-in loader and constants are registered.
pub const BUILTIN_MODULE: &str = "saml_sp_conf.conf";

/// A named member of a registered module.
#[derive(Clone)]
pub enum RegistryMember {
    /// Something that can be invoked to produce a configuration.
    Loader(SharedConfigLoader),
    /// A plain value. Resolving a path to one of these is an error.
    Value(serde_json::Value),
}

impl std::fmt::Debug for RegistryMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryMember::Loader(_) => f.write_str("Loader(..)"),
            RegistryMember::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// Dotted-path lookup table for config loaders.
///
/// Populated at startup. Share it behind an `Arc` once registration is done.
#[derive(Debug, Default, Clone)]
pub struct LoaderRegistry {
    modules: BTreeMap<String, BTreeMap<String, RegistryMember>>,
}

impl LoaderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in module's constants but no loader.
    ///
    /// Used when no database is configured, so only custom loaders can run.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .insert(
                BUILTIN_MODULE,
                "DEFAULT_CONFIG_LOADER",
                RegistryMember::Value(DEFAULT_CONFIG_LOADER.into()),
            )
            .insert(
                BUILTIN_MODULE,
                "XMLSEC_BINARY",
                RegistryMember::Value(XMLSEC_BINARY.into()),
            )
            .insert(
                BUILTIN_MODULE,
                "ATTRIBUTE_MAP_FILENAME",
                RegistryMember::Value(ATTRIBUTE_MAP_FILENAME.into()),
            );
        registry
    }

    /// The built-in module with the settings-backed default loader registered.
    pub fn with_defaults(repo: Arc<dyn SamlConfigRepo>, ctx: AssemblyContext) -> Self {
        let mut registry = Self::builtin();
        registry.insert(
            BUILTIN_MODULE,
            "config_settings_loader",
            RegistryMember::Loader(Arc::new(ConfigSettingsLoader::new(repo, ctx))),
        );
        registry
    }

    /// Register a loader under a dotted path, replacing any previous member.
    pub fn register_loader(
        &mut self,
        path: &str,
        loader: SharedConfigLoader,
    ) -> Result<&mut Self, ImproperlyConfigured> {
        let (module, attr) = split_path(path)?;
        Ok(self.insert(module, attr, RegistryMember::Loader(loader)))
    }

    /// Register a non-callable value under a dotted path.
    pub fn register_value(
        &mut self,
        path: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<&mut Self, ImproperlyConfigured> {
        let (module, attr) = split_path(path)?;
        Ok(self.insert(module, attr, RegistryMember::Value(value.into())))
    }

    fn insert(&mut self, module: &str, attr: &str, member: RegistryMember) -> &mut Self {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(attr.to_string(), member);
        self
    }

    /// Resolve a dotted path to the loader registered under it.
    ///
    /// Returns the registered `Arc` itself; the loader is not invoked.
    pub fn resolve(&self, path: &str) -> Result<SharedConfigLoader, ImproperlyConfigured> {
        let result = self.lookup(path);
        match &result {
            Ok(_) => tracing::debug!(loader = %path, "Resolved SAML config loader"),
            Err(e) => tracing::warn!(loader = %path, error = %e, "Failed to resolve SAML config loader"),
        }
        result
    }

    fn lookup(&self, path: &str) -> Result<SharedConfigLoader, ImproperlyConfigured> {
        let (module, attr) = split_path(path)?;

        let members =
            self.modules
                .get(module)
                .ok_or_else(|| ImproperlyConfigured::LoaderImport {
                    path: path.to_string(),
                    detail: format!("No module named '{module}'"),
                })?;

        match members.get(attr) {
            Some(RegistryMember::Loader(loader)) => Ok(Arc::clone(loader)),
            Some(RegistryMember::Value(_)) => Err(ImproperlyConfigured::LoaderNotCallable {
                path: path.to_string(),
            }),
            None => Err(ImproperlyConfigured::MissingLoaderAttribute {
                module: module.to_string(),
                attr: attr.to_string(),
            }),
        }
    }

    /// Dotted paths of all registered loaders, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.modules
            .iter()
            .flat_map(|(module, members)| {
                members.iter().filter_map(move |(attr, member)| match member {
                    RegistryMember::Loader(_) => Some(format!("{module}.{attr}")),
                    RegistryMember::Value(_) => None,
                })
            })
            .collect()
    }
}

/// Split at the last `.` into `(module, attribute)`.
fn split_path(path: &str) -> Result<(&str, &str), ImproperlyConfigured> {
    match path.rsplit_once('.') {
        Some((module, attr)) if !module.is_empty() => Ok((module, attr)),
        _ => Err(ImproperlyConfigured::MalformedLoaderPath {
            path: path.to_string(),
        }),
    }
}
