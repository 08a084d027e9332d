//! Prediction over a validated feature row.

use serde::{Serialize, Serializer, ser::SerializeMap};
use thiserror::Error;

use crate::metadata::LabelMap;
use crate::model::{Inference, ModelHandle, math::argmax};
use crate::row::FeatureRow;

/// Errors raised while producing a prediction.
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    /// The model produced a class index the metadata has no label for.
    #[error("Model produced class index {index} which is missing from label_map")]
    UnknownLabel { index: usize },
    /// The model returned an empty probability vector.
    #[error("Model returned no class probabilities")]
    EmptyProbabilities,
}

/// Class probabilities keyed by label, in class index order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassProbabilities(Vec<(String, f64)>);

impl ClassProbabilities {
    /// Insert a probability; a repeated label keeps the last value.
    fn insert(&mut self, label: &str, probability: f64) {
        match self.0.iter_mut().find(|(existing, _)| existing == label) {
            Some(entry) => entry.1 = probability,
            None => self.0.push((label.to_string(), probability)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.0
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, p)| *p)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, p)| (label.as_str(), *p))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ClassProbabilities {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (label, probability) in &self.0 {
            map.serialize_entry(label, probability)?;
        }
        map.end()
    }
}

/// Response body of `/predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub prediction_index: usize,
    pub prediction_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probabilities: Option<ClassProbabilities>,
    pub inputs: FeatureRow,
}

/// Sanitize the row, run the model and resolve labels.
pub fn predict(
    model: &ModelHandle,
    labels: &LabelMap,
    mut row: FeatureRow,
) -> Result<PredictionResult, PredictError> {
    let dropped = row.sanitize();
    if dropped > 0 {
        tracing::debug!("Treating {dropped} non-finite input value(s) as missing");
    }
    let input = row.to_model_input();

    let (prediction_index, probabilities) = match model.infer(&input) {
        Inference::Probabilities(proba) => {
            if proba.is_empty() {
                return Err(PredictError::EmptyProbabilities);
            }
            let mut by_label = ClassProbabilities::default();
            for (index, &p) in proba.iter().enumerate() {
                let label = labels
                    .get(index)
                    .ok_or(PredictError::UnknownLabel { index })?;
                by_label.insert(label, p);
            }
            (argmax(&proba), Some(by_label))
        }
        Inference::Label(index) => (index, None),
    };

    let prediction_label = labels
        .get(prediction_index)
        .ok_or(PredictError::UnknownLabel {
            index: prediction_index,
        })?
        .to_string();

    Ok(PredictionResult {
        prediction_index,
        prediction_label,
        probabilities,
        inputs: row,
    })
}
