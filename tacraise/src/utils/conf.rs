use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    magic::{DEFAULT_HOST_DEVICE, ENV_CONFIG_PATH},
    utils::error::{RaiseError, RaiseResult},
};

/// Options of the raise pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaiseConfig {
    /// Hardware kind allowed to call into other kinds.
    pub host_device: String,

    /// Verify the module after rewriting it.
    pub verify_after: bool,
}

impl Default for RaiseConfig {
    fn default() -> Self {
        Self {
            host_device: DEFAULT_HOST_DEVICE.to_string(),
            verify_after: true,
        }
    }
}

impl RaiseConfig {
    /// Get the default path to the configuration file.
    pub fn default_path() -> PathBuf {
        // Check if the environment variable is set
        if let Ok(config_path) = std::env::var(ENV_CONFIG_PATH) {
            return config_path.into();
        }

        // Fallback to default paths based on OS
        let mut path = PathBuf::new();

        #[cfg(target_os = "windows")]
        {
            if let Ok(appdata) = std::env::var("APPDATA") {
                path.push(appdata);
            }

            path.push("tacraise");
            path.push("config.toml");
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
                path.push(xdg_config_home);
            } else if let Ok(home) = std::env::var("HOME") {
                path.push(home);
                path.push(".config");
            }

            path.push("tacraise");
            path.push("config.toml");
        }

        path
    }

    /// Parse a configuration from TOML text. `file` only names the source in
    /// error messages.
    pub fn from_toml_str(source: &str, file: &str) -> RaiseResult<Self> {
        toml::from_str(source).map_err(|e| RaiseError::ConfigParseError {
            source: e,
            file: file.to_string(),
        })
    }

    /// Load a configuration from a TOML file.
    pub fn load_from_toml(path: &Path) -> RaiseResult<Self> {
        let toml_str = std::fs::read_to_string(path)?;
        Self::from_toml_str(&toml_str, &path.display().to_string())
    }

    /// Load the configuration at `path`, or the defaults when the file does
    /// not exist.
    pub fn load_or_default(path: &Path) -> RaiseResult<Self> {
        if path.exists() {
            Self::load_from_toml(path)
        } else {
            debug!(
                "no configuration at `{}`, using defaults",
                path.display()
            );
            Ok(Self::default())
        }
    }

    /// Save the configuration to a TOML file.
    pub fn save_to_toml(&self, path: &Path) -> RaiseResult<()> {
        let toml_str = toml::to_string(self).map_err(|e| RaiseError::ConfigSerializeError {
            source: e,
            file: path.display().to_string(),
        })?;

        // Attempt to create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml_str)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = RaiseConfig::from_toml_str("verify_after = false", "inline").unwrap();
        assert_eq!(config.host_device, "CPU");
        assert!(!config.verify_after);
    }

    #[test]
    fn malformed_file_is_reported() {
        let err = RaiseConfig::from_toml_str("host_device = 3", "inline").unwrap_err();
        assert!(err.is_config_parse_error());
    }

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("tacraise-conf-{}", std::process::id()));
        let path = dir.join("nested").join("config.toml");
        let config = RaiseConfig {
            host_device: "DSP".into(),
            verify_after: false,
        };
        config.save_to_toml(&path).unwrap();
        assert_eq!(RaiseConfig::load_or_default(&path).unwrap(), config);
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(
            RaiseConfig::load_or_default(&path).unwrap(),
            RaiseConfig::default()
        );
    }
}
