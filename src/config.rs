//! Server configuration loaded from an optional TOML file.
//!
//! Every setting has a default, so the server starts without a config file.
//! Command-line flags on the launcher override file values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "exoclass.toml";
/// Extension of the metadata file that sits next to the model artifact.
pub const METADATA_EXTENSION: &str = "meta.json";

/// Errors that may occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse the TOML config.
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings for the HTTP server and the model files it serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Path to the serialized model artifact.
    pub model_path: PathBuf,
    /// Path to the metadata file. Derived from `model_path` when unset.
    pub metadata_path: Option<PathBuf>,
    /// Identifier reported by `GET /`.
    pub model_name: String,
    /// Title of the HTML form and request schema.
    pub title: String,
    /// `[log]` table.
    pub log: LogConfig,
}

/// Server log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory for per-launch log files. Resolved from `EXOCLASS_HOME` or
    /// the platform data directory when unset.
    pub dir: Option<PathBuf>,
    /// Number of launch logs kept, the current one included.
    pub keep_files: usize,
    /// Filter used when `RUST_LOG` is not set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: None,
            keep_files: 10,
            filter: "info".to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
            metadata_path: None,
            model_name: default_model_name(),
            title: default_title(),
            log: LogConfig::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> PathBuf {
    PathBuf::from("../model_export/exoplanet_model.json")
}

fn default_model_name() -> String {
    "exoplanet-classifier".to_string()
}

fn default_title() -> String {
    "Exoplanet Classifier".to_string()
}

impl ServerConfig {
    /// Load from an explicit path, else from `exoclass.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.is_file() {
                    Self::load_from(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Parse a TOML config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Metadata path, defaulting to `<model stem>.meta.json` next to the model.
    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_path
            .clone()
            .unwrap_or_else(|| metadata_path_for(&self.model_path))
    }

    /// Directory holding the model artifact.
    pub fn model_dir(&self) -> &Path {
        self.model_path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }
}

/// Sidecar metadata path for a model artifact path.
pub fn metadata_path_for(model_path: &Path) -> PathBuf {
    model_path.with_extension(METADATA_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_bind_all_interfaces_on_8000() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert_eq!(
            cfg.metadata_path(),
            PathBuf::from("../model_export/exoplanet_model.meta.json")
        );
        assert_eq!(cfg.model_dir(), Path::new("../model_export"));
    }

    #[test]
    fn metadata_path_replaces_artifact_extension() {
        assert_eq!(
            metadata_path_for(Path::new("export/model_2025-10-06.json")),
            PathBuf::from("export/model_2025-10-06.meta.json")
        );
        assert_eq!(
            metadata_path_for(Path::new("model")),
            PathBuf::from("model.meta.json")
        );
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exoclass.toml");
        std::fs::write(
            &path,
            "port = 9001\nmodel_path = \"models/m.json\"\nmetadata_path = \"models/labels.json\"\n",
        )
        .unwrap();
        let cfg = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.metadata_path(), PathBuf::from("models/labels.json"));
        assert_eq!(cfg.model_name, "exoplanet-classifier");
    }

    #[test]
    fn log_table_overrides_log_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exoclass.toml");
        std::fs::write(&path, "[log]\ndir = \"/var/log/exoclass\"\nkeep_files = 3\n").unwrap();
        let cfg = ServerConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.log.dir, Some(PathBuf::from("/var/log/exoclass")));
        assert_eq!(cfg.log.keep_files, 3);
        assert_eq!(cfg.log.filter, "info");
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "port = \"eight thousand\"").unwrap();
        let err = ServerConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml { .. }));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = ServerConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
