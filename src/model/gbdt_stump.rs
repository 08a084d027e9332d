//! Gradient-boosted decision-stump classifier.
//!
//! Multi-class models boost one stump per class per round and score with a
//! softmax over the accumulated raw values. Missing inputs follow the
//! direction recorded on each stump.

use serde::{Deserialize, Serialize};

use super::math::{argmax, softmax};
use super::{Classifier, ProbabilisticClassifier};

/// Single-node decision tree used as a weak learner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stump {
    /// Feature index used for the split.
    pub feature_index: usize,
    /// Threshold in feature units.
    pub threshold: f64,
    /// Prediction for `feature <= threshold`.
    pub left_value: f64,
    /// Prediction for `feature > threshold`.
    pub right_value: f64,
    /// Branch taken when the feature is missing.
    #[serde(default = "default_missing_left")]
    pub missing_left: bool,
}

fn default_missing_left() -> bool {
    true
}

impl Stump {
    /// Predict the stump value for a feature row.
    pub fn predict(&self, row: &[f64]) -> f64 {
        let value = row.get(self.feature_index).copied().unwrap_or(f64::NAN);
        let go_left = if value.is_nan() {
            self.missing_left
        } else {
            value <= self.threshold
        };
        if go_left {
            self.left_value
        } else {
            self.right_value
        }
    }
}

/// Gradient-boosted decision stump model for multi-class classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbdtStumpModel {
    pub model_version: i64,
    pub n_features: usize,
    /// Learning rate applied to each stump prediction.
    pub learning_rate: f64,
    /// Initial raw logits before boosting rounds, one per class.
    pub init_raw: Vec<f64>,
    /// Shape: `[n_rounds][n_classes]`.
    pub stumps: Vec<Vec<Stump>>,
}

impl GbdtStumpModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_raw.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if !self.learning_rate.is_finite() {
            return Err("learning_rate must be finite".to_string());
        }
        for (round_idx, round) in self.stumps.iter().enumerate() {
            if round.len() != self.init_raw.len() {
                return Err(format!(
                    "Round {round_idx} has {} stumps but expected {}",
                    round.len(),
                    self.init_raw.len()
                ));
            }
            if let Some(stump) = round.iter().find(|s| s.feature_index >= self.n_features) {
                return Err(format!(
                    "Round {round_idx} splits on feature {} but the model has {} features",
                    stump.feature_index, self.n_features
                ));
            }
        }
        Ok(())
    }

    /// Predict raw logits for a feature row.
    pub fn predict_raw(&self, row: &[f64]) -> Vec<f64> {
        let mut raw = self.init_raw.clone();
        for round in &self.stumps {
            for (class_idx, stump) in round.iter().enumerate() {
                raw[class_idx] += self.learning_rate * stump.predict(row);
            }
        }
        raw
    }
}

impl Classifier for GbdtStumpModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.init_raw.len()
    }

    fn predict(&self, row: &[f64]) -> usize {
        argmax(&self.predict_raw(row))
    }
}

impl ProbabilisticClassifier for GbdtStumpModel {
    fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        softmax(&self.predict_raw(row))
    }
}
