//! Sidecar metadata describing the model's input columns and class labels.
//!
//! The metadata file is produced by the training pipeline next to the model
//! artifact and has the shape
//! `{"features": ["a", "b_miss"], "label_map": {"0": "CONFIRMED", "1": "FALSE POSITIVE"}}`.

use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Suffix marking a feature as a 0/1 missingness flag.
pub const MISSINGNESS_SUFFIX: &str = "_miss";

/// Errors raised while loading the metadata file.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Failed to read the metadata file.
    #[error("Failed to read metadata {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid JSON or lacks `features`/`label_map`.
    #[error("Invalid metadata {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// A feature name appears more than once.
    #[error("Duplicate feature {name:?} in metadata {path}")]
    DuplicateFeature { path: PathBuf, name: String },
    /// A `label_map` key is not a non-negative integer.
    #[error("Invalid label_map key {key:?} in metadata {path}")]
    LabelKey { path: PathBuf, key: String },
}

/// Ordered feature names fed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSpec {
    names: Vec<String>,
}

impl FeatureSpec {
    /// Build a spec, rejecting duplicate names.
    pub fn new(names: Vec<String>) -> Result<Self, String> {
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(name.clone());
            }
        }
        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column position of a feature name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }
}

/// Whether a feature name denotes a missingness flag.
pub fn is_missingness_flag(name: &str) -> bool {
    name.ends_with(MISSINGNESS_SUFFIX)
}

/// Class index to display label. Serializes with string keys in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

impl LabelMap {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(&index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Entries in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels.iter().map(|(idx, label)| (*idx, label.as_str()))
    }

    /// Indices below `n_classes` that have no label.
    pub fn missing_indices(&self, n_classes: usize) -> Vec<usize> {
        (0..n_classes)
            .filter(|idx| !self.labels.contains_key(idx))
            .collect()
    }
}

impl FromIterator<(usize, String)> for LabelMap {
    fn from_iter<T: IntoIterator<Item = (usize, String)>>(iter: T) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

/// Loaded metadata file.
#[derive(Debug, Clone)]
pub struct ModelMetadata {
    pub features: FeatureSpec,
    pub labels: LabelMap,
}

#[derive(Deserialize)]
struct RawMetadata {
    features: Vec<String>,
    label_map: BTreeMap<String, String>,
}

impl ModelMetadata {
    /// Read and validate a metadata file.
    pub fn load(path: &Path) -> Result<Self, MetadataError> {
        let bytes = std::fs::read(path).map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(path, &bytes)
    }

    fn from_slice(path: &Path, bytes: &[u8]) -> Result<Self, MetadataError> {
        let raw: RawMetadata =
            serde_json::from_slice(bytes).map_err(|source| MetadataError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let features =
            FeatureSpec::new(raw.features).map_err(|name| MetadataError::DuplicateFeature {
                path: path.to_path_buf(),
                name,
            })?;
        let labels = raw
            .label_map
            .into_iter()
            .map(|(key, label)| {
                key.trim()
                    .parse::<usize>()
                    .map(|idx| (idx, label))
                    .map_err(|_| MetadataError::LabelKey {
                        path: path.to_path_buf(),
                        key,
                    })
            })
            .collect::<Result<LabelMap, _>>()?;
        Ok(Self { features, labels })
    }
}
