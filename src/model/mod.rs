//! Trained classifier artifacts and the read-only handle used for inference.
//!
//! Artifacts are JSON documents tagged by `kind`. The probability capability
//! is fixed when the artifact is loaded: families with a probability output
//! become [`ModelHandle::Probabilistic`], the rest [`ModelHandle::LabelOnly`].
//! Rows are passed as `f64` slices in feature order with `NaN` marking a
//! missing value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod gbdt_stump;
pub mod logreg;
pub mod math;
pub mod mlp;
pub mod nearest_centroid;

pub use gbdt_stump::{GbdtStumpModel, Stump};
pub use logreg::LogRegModel;
pub use mlp::MlpModel;
pub use nearest_centroid::NearestCentroidModel;

/// Artifact format version understood by this build.
pub const SUPPORTED_MODEL_VERSION: i64 = 1;

/// Minimal inference surface shared by every model family.
pub trait Classifier: Send + Sync {
    /// Number of input columns the model was trained on.
    fn n_features(&self) -> usize;
    /// Number of class indices the model can produce.
    fn n_classes(&self) -> usize;
    /// Predict a class index for one row.
    fn predict(&self, row: &[f64]) -> usize;
}

/// Classifiers that can also report one probability per class.
pub trait ProbabilisticClassifier: Classifier {
    fn predict_proba(&self, row: &[f64]) -> Vec<f64>;
}

/// Serialized model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogRegModel),
    GbdtStump(GbdtStumpModel),
    Mlp(MlpModel),
    NearestCentroid(NearestCentroidModel),
}

impl ModelArtifact {
    fn model_version(&self) -> i64 {
        match self {
            ModelArtifact::LogisticRegression(model) => model.model_version,
            ModelArtifact::GbdtStump(model) => model.model_version,
            ModelArtifact::Mlp(model) => model.model_version,
            ModelArtifact::NearestCentroid(model) => model.model_version,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            ModelArtifact::LogisticRegression(model) => model.validate(),
            ModelArtifact::GbdtStump(model) => model.validate(),
            ModelArtifact::Mlp(model) => model.validate(),
            ModelArtifact::NearestCentroid(model) => model.validate(),
        }
    }

    /// Short name of the model family, as written in the `kind` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::LogisticRegression(_) => "logistic_regression",
            ModelArtifact::GbdtStump(_) => "gbdt_stump",
            ModelArtifact::Mlp(_) => "mlp",
            ModelArtifact::NearestCentroid(_) => "nearest_centroid",
        }
    }
}

/// Errors raised while loading a model artifact.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The artifact could not be read from disk.
    #[error("Failed to read model artifact {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The artifact is not a model document this build understands.
    #[error("Invalid model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The artifact was written by an incompatible exporter.
    #[error("Unsupported model_version {version} in {path} (expected {SUPPORTED_MODEL_VERSION})")]
    UnsupportedVersion { path: PathBuf, version: i64 },
    /// The artifact parsed but its weights are inconsistent.
    #[error("Model artifact {path} failed validation: {reason}")]
    Invalid { path: PathBuf, reason: String },
    /// The artifact does not match the feature list from the metadata file.
    #[error("Model artifact {path} expects {found} features but metadata lists {expected}")]
    FeatureCount {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

/// Output of a single inference call.
#[derive(Debug, Clone, PartialEq)]
pub enum Inference {
    /// One probability per class index.
    Probabilities(Vec<f64>),
    /// A class index without probabilities.
    Label(usize),
}

/// Loaded, immutable classifier.
pub enum ModelHandle {
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    LabelOnly(Box<dyn Classifier>),
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("probabilities", &self.supports_probabilities())
            .field("n_features", &self.n_features())
            .field("n_classes", &self.n_classes())
            .finish()
    }
}

impl ModelHandle {
    /// Load an artifact from disk and check it against the expected feature count.
    pub fn load(path: &Path, n_features: usize) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let version = artifact.model_version();
        if version != SUPPORTED_MODEL_VERSION {
            return Err(ModelError::UnsupportedVersion {
                path: path.to_path_buf(),
                version,
            });
        }
        artifact.validate().map_err(|reason| ModelError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        tracing::debug!("Parsed {} artifact from {}", artifact.kind(), path.display());
        let handle = Self::from(artifact);
        if handle.n_features() != n_features {
            return Err(ModelError::FeatureCount {
                path: path.to_path_buf(),
                expected: n_features,
                found: handle.n_features(),
            });
        }
        Ok(handle)
    }

    /// Whether [`ModelHandle::infer`] returns probabilities.
    pub fn supports_probabilities(&self) -> bool {
        matches!(self, ModelHandle::Probabilistic(_))
    }

    pub fn n_features(&self) -> usize {
        match self {
            ModelHandle::Probabilistic(model) => model.n_features(),
            ModelHandle::LabelOnly(model) => model.n_features(),
        }
    }

    pub fn n_classes(&self) -> usize {
        match self {
            ModelHandle::Probabilistic(model) => model.n_classes(),
            ModelHandle::LabelOnly(model) => model.n_classes(),
        }
    }

    /// Run the model on one row.
    pub fn infer(&self, row: &[f64]) -> Inference {
        match self {
            ModelHandle::Probabilistic(model) => Inference::Probabilities(model.predict_proba(row)),
            ModelHandle::LabelOnly(model) => Inference::Label(model.predict(row)),
        }
    }
}

impl From<ModelArtifact> for ModelHandle {
    fn from(artifact: ModelArtifact) -> Self {
        match artifact {
            ModelArtifact::LogisticRegression(model) => ModelHandle::Probabilistic(Box::new(model)),
            ModelArtifact::GbdtStump(model) => ModelHandle::Probabilistic(Box::new(model)),
            ModelArtifact::Mlp(model) => ModelHandle::Probabilistic(Box::new(model)),
            ModelArtifact::NearestCentroid(model) => ModelHandle::LabelOnly(Box::new(model)),
        }
    }
}
