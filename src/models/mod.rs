mod saml_config;
mod sp_settings;

pub use saml_config::*;
pub use sp_settings::*;
