//! Loader resolution and the configuration entry point.
//!
//! A config loader is addressed by a dotted path (`module.attribute`). The
//! [`LoaderRegistry`] maps those paths to registered [`ConfigLoader`]s, and
//! [`get_config`] picks the path (explicit override, configured setting, or
//! the built-in default) and runs the loader once.

mod accessor;
mod error;
mod registry;
mod settings_loader;

use std::sync::Arc;

pub use accessor::*;
use async_trait::async_trait;
pub use error::ImproperlyConfigured;
pub use registry::*;
use serde::{Deserialize, Serialize};
pub use settings_loader::*;

use crate::saml::SpConfig;

/// Request data passed through to loaders.
///
/// Every field is optional; loaders that don't vary per request ignore it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Host the request was addressed to.
    pub host: Option<String>,
    pub path: Option<String>,
    pub is_secure: Option<bool>,
}

/// Produces an SP configuration.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    /// Build a fresh configuration. Called once per [`get_config`].
    async fn load(&self, request: Option<&RequestContext>)
    -> Result<SpConfig, ImproperlyConfigured>;
}

pub type SharedConfigLoader = Arc<dyn ConfigLoader>;
