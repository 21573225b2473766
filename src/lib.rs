//! Loads SAML Service Provider configuration from a persisted settings record.
//!
//! The entry point is [`loader::get_config`]: it resolves a config loader by
//! dotted path through a [`loader::LoaderRegistry`] and runs it. The built-in
//! loader reads the stored SP settings record, maps it onto the SAML toolkit's
//! configuration document and loads it into a [`saml::SpConfig`].

pub mod config;
pub mod db;
pub mod loader;
pub mod models;
#[cfg(feature = "cli")]
pub mod observability;
pub mod saml;

pub use config::{AppConfig, DEFAULT_CONFIG_LOADER};
pub use loader::{
    ConfigLoader, ImproperlyConfigured, LoaderRegistry, RequestContext, SamlConfigAccessor,
    get_config,
};
pub use saml::SpConfig;
