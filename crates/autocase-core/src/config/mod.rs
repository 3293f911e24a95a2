//! # Autocase Core Configuration
//!
//! [`AppConfig`] holds the settings an [`Application`](crate::kernel::Application)
//! is built from. It can be read from JSON, YAML (`yaml-config` feature) or
//! TOML (`toml-config` feature); the format follows the file extension.
//! Missing keys take their defaults.
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::model::ProjectId;
use crate::engine::model::DispatchKey;
use crate::kernel::constants::DEFAULT_PLUGINS_DIR;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported configuration file format: '{path}'")]
    UnsupportedFormat { path: PathBuf },

    #[error("Failed to {operation} configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to deserialize configuration from {format}: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Failed to serialize configuration to {format}: {message}")]
    Serialize { format: &'static str, message: String },

    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory scanned for plugin modules
    pub plugin_dir: PathBuf,
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub log_level: String,
    /// Log step return data and durations
    pub verbose: bool,
    pub dispatch_key: DispatchKey,
    /// Project data files are imported into
    pub project_id: ProjectId,
    /// Data set files imported at startup
    pub data_files: Vec<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            plugin_dir: PathBuf::from(DEFAULT_PLUGINS_DIR),
            log_level: "info".to_string(),
            verbose: false,
            dispatch_key: DispatchKey::default(),
            project_id: 0,
            data_files: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Read a configuration file, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.to_path_buf() })?;
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            operation: "read",
            source,
        })?;
        let config = Self::deserialize(&data, format)?;
        config.level_filter()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::UnsupportedFormat { path: path.to_path_buf() })?;
        let data = self.serialize(format)?;
        std::fs::write(path, data).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            operation: "write",
            source,
        })
    }

    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let fail = |message: String| ConfigError::Serialize { format: format.extension(), message };
        match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self).map_err(|e| fail(e.to_string())),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| fail(e.to_string())),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| fail(e.to_string())),
        }
    }

    pub fn deserialize(data: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let fail = |message: String| ConfigError::Parse { format: format.extension(), message };
        match format {
            ConfigFormat::Json => serde_json::from_str(data).map_err(|e| fail(e.to_string())),
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::from_str(data).map_err(|e| fail(e.to_string())),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(data).map_err(|e| fail(e.to_string())),
        }
    }

    /// `log_level` parsed into a filter
    pub fn level_filter(&self) -> Result<log::LevelFilter, ConfigError> {
        log::LevelFilter::from_str(&self.log_level).map_err(|e| ConfigError::InvalidValue {
            key: "log_level",
            message: format!("'{}': {}", self.log_level, e),
        })
    }
}

#[cfg(test)]
mod tests;
