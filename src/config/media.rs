use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Environment variable consulted when `media.home_dir` is not set.
pub const HOME_ENV_VAR: &str = "HOME";

/// Media storage settings.
///
/// Stored file references (metadata, key, certificate, attribute maps) are
/// relative to `home_dir / media_root`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfig {
    /// Home directory. Falls back to `$HOME` when unset.
    #[serde(default)]
    pub home_dir: Option<PathBuf>,

    /// Media root, joined onto the home directory. An absolute media root
    /// replaces the home directory entirely.
    #[serde(default)]
    pub media_root: PathBuf,
}

impl MediaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(home) = &self.home_dir
            && home.as_os_str().is_empty()
        {
            return Err(ConfigError::Validation(
                "media.home_dir cannot be empty; omit it to use $HOME".into(),
            ));
        }
        Ok(())
    }

    /// Resolve the base directory that stored file references are joined onto.
    pub fn base_dir(&self) -> Result<PathBuf, ConfigError> {
        let home = match &self.home_dir {
            Some(home) => home.clone(),
            None => std::env::var_os(HOME_ENV_VAR)
                .map(PathBuf::from)
                .ok_or_else(|| ConfigError::EnvVarNotFound(HOME_ENV_VAR.to_string()))?,
        };
        Ok(home.join(&self.media_root))
    }
}
