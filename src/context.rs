//! Process-wide application state, built once before serving.

use serde::Serialize;
use thiserror::Error;

use crate::config::{ConfigError, ServerConfig};
use crate::form::render_form;
use crate::metadata::{FeatureSpec, LabelMap, MetadataError, ModelMetadata};
use crate::model::{ModelError, ModelHandle};
use crate::predict::{PredictError, PredictionResult, predict};
use crate::row::FeatureRow;
use crate::schema::FeatureSchema;

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    Model(#[from] ModelError),
    /// Failed to bind the listening socket.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    /// The HTTP server stopped with an error.
    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// `GET /` response body.
#[derive(Debug, Serialize)]
pub struct ModelInfo<'a> {
    pub status: &'static str,
    pub model: &'a str,
    pub num_features: usize,
    pub features: &'a FeatureSpec,
    pub classes: &'a LabelMap,
}

/// Immutable state shared by every request handler.
#[derive(Debug)]
pub struct AppContext {
    model_name: String,
    title: String,
    metadata: ModelMetadata,
    schema: FeatureSchema,
    model: ModelHandle,
    form_html: String,
}

impl AppContext {
    /// Load metadata and model artifact named by the configuration.
    pub fn load(cfg: &ServerConfig) -> Result<Self, StartupError> {
        let metadata_path = cfg.metadata_path();
        let metadata = ModelMetadata::load(&metadata_path)?;
        tracing::info!(
            "Loaded metadata from {} ({} features, {} classes)",
            metadata_path.display(),
            metadata.features.len(),
            metadata.labels.len()
        );
        let model = ModelHandle::load(&cfg.model_path, metadata.features.len())?;
        tracing::info!(
            "Loaded model from {} (probabilities: {})",
            cfg.model_path.display(),
            model.supports_probabilities()
        );
        Ok(Self::new(
            cfg.model_name.clone(),
            cfg.title.clone(),
            metadata,
            model,
        ))
    }

    /// Assemble the context from already loaded parts.
    pub fn new(model_name: String, title: String, metadata: ModelMetadata, model: ModelHandle) -> Self {
        let unlabelled = metadata.labels.missing_indices(model.n_classes());
        if !unlabelled.is_empty() {
            tracing::warn!(
                "label_map has no entry for class indices {unlabelled:?}; predictions of those classes will fail"
            );
        }
        let schema = FeatureSchema::build(&metadata.features);
        let form_html = render_form(&title, &metadata.features);
        Self {
            model_name,
            title,
            metadata,
            schema,
            model,
            form_html,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn features(&self) -> &FeatureSpec {
        &self.metadata.features
    }

    pub fn labels(&self) -> &LabelMap {
        &self.metadata.labels
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn form_html(&self) -> &str {
        &self.form_html
    }

    pub fn info(&self) -> ModelInfo<'_> {
        ModelInfo {
            status: "ok",
            model: &self.model_name,
            num_features: self.metadata.features.len(),
            features: &self.metadata.features,
            classes: &self.metadata.labels,
        }
    }

    /// Run a validated row through the model.
    pub fn predict(&self, row: FeatureRow) -> Result<PredictionResult, PredictError> {
        predict(&self.model, &self.metadata.labels, row)
    }
}
