use serde::{Deserialize, Serialize};

use super::math::{argmax, softmax};
use super::{Classifier, ProbabilisticClassifier};

/// Single hidden layer ReLU network with standardized inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpModel {
    pub model_version: i64,
    pub n_features: usize,
    pub hidden_size: usize,
    /// Row-major `[hidden_size][n_features]`.
    pub weights1: Vec<f64>,
    pub bias1: Vec<f64>,
    /// Row-major `[n_classes][hidden_size]`.
    pub weights2: Vec<f64>,
    /// One entry per class.
    pub bias2: Vec<f64>,
    pub feature_mean: Vec<f64>,
    pub feature_std: Vec<f64>,
}

impl MlpModel {
    pub fn validate(&self) -> Result<(), String> {
        let input = self.n_features;
        let hidden = self.hidden_size;
        let classes = self.bias2.len();
        if input == 0 || hidden == 0 {
            return Err("n_features and hidden_size must be > 0".to_string());
        }
        if classes < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.weights1.len() != input * hidden {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != hidden {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != classes * hidden {
            return Err("weights2 length mismatch".to_string());
        }
        if self.feature_mean.len() != input {
            return Err("feature_mean length mismatch".to_string());
        }
        if self.feature_std.len() != input {
            return Err("feature_std length mismatch".to_string());
        }
        Ok(())
    }

    fn logits(&self, row: &[f64]) -> Vec<f64> {
        let input = self.n_features;
        let hidden = self.hidden_size;

        // Missing inputs standardize to zero, i.e. they take the training mean.
        let mut normalized = vec![0.0f64; input];
        for (i, slot) in normalized.iter_mut().enumerate() {
            let value = row.get(i).copied().unwrap_or(f64::NAN);
            if value.is_nan() {
                continue;
            }
            let std = self.feature_std[i].max(1e-6);
            *slot = (value - self.feature_mean[i]) / std;
        }

        let mut hidden_act = vec![0.0f64; hidden];
        for (h, act) in hidden_act.iter_mut().enumerate() {
            let base = h * input;
            let mut sum = self.bias1[h];
            for i in 0..input {
                sum += self.weights1[base + i] * normalized[i];
            }
            *act = sum.max(0.0);
        }

        self.bias2
            .iter()
            .enumerate()
            .map(|(c, bias)| {
                let base = c * hidden;
                bias + (0..hidden)
                    .map(|h| self.weights2[base + h] * hidden_act[h])
                    .sum::<f64>()
            })
            .collect()
    }
}

impl Classifier for MlpModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.bias2.len()
    }

    fn predict(&self, row: &[f64]) -> usize {
        argmax(&self.logits(row))
    }
}

impl ProbabilisticClassifier for MlpModel {
    fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        softmax(&self.logits(row))
    }
}
