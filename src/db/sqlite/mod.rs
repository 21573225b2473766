mod common;
mod saml_configs;

pub use saml_configs::SqliteSamlConfigRepo;
