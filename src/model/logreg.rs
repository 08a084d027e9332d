//! Logistic regression classifier over tabular feature rows.

use serde::{Deserialize, Serialize};

use super::math::{argmax, sigmoid, softmax};
use super::{Classifier, ProbabilisticClassifier};

/// Logistic regression weights exported by the training pipeline.
///
/// A single weight row with two classes is a binary model scored with a
/// sigmoid; otherwise there is one row per class and scores go through softmax.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRegModel {
    pub model_version: i64,
    pub n_features: usize,
    pub n_classes: usize,
    /// Row-major `[rows][n_features]`.
    pub weights: Vec<f64>,
    pub bias: Vec<f64>,
    /// Values substituted for missing inputs; zero when omitted.
    #[serde(default)]
    pub feature_mean: Option<Vec<f64>>,
}

impl LogRegModel {
    /// Validate the weight layout against the declared dimensions.
    pub fn validate(&self) -> Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be > 0".to_string());
        }
        if self.n_classes < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        let rows = self.rows();
        if self.weights.len() != rows * self.n_features {
            return Err(format!(
                "weights length mismatch: {} (expected {})",
                self.weights.len(),
                rows * self.n_features
            ));
        }
        if self.bias.len() != rows {
            return Err("bias length mismatch".to_string());
        }
        if let Some(mean) = &self.feature_mean {
            if mean.len() != self.n_features {
                return Err("feature_mean length mismatch".to_string());
            }
        }
        if self.weights.iter().chain(&self.bias).any(|v| !v.is_finite()) {
            return Err("weights must be finite".to_string());
        }
        Ok(())
    }

    fn is_binary(&self) -> bool {
        self.n_classes == 2 && self.bias.len() == 1
    }

    fn rows(&self) -> usize {
        if self.is_binary() {
            1
        } else {
            self.n_classes
        }
    }

    fn input_value(&self, row: &[f64], i: usize) -> f64 {
        let value = row.get(i).copied().unwrap_or(f64::NAN);
        if value.is_nan() {
            self.feature_mean
                .as_ref()
                .map(|mean| mean[i])
                .unwrap_or(0.0)
        } else {
            value
        }
    }

    fn logits(&self, row: &[f64]) -> Vec<f64> {
        let rows = self.rows();
        let mut logits = vec![0.0f64; rows];
        for (r, logit) in logits.iter_mut().enumerate() {
            let base = r * self.n_features;
            let mut sum = self.bias[r];
            for i in 0..self.n_features {
                sum += self.weights[base + i] * self.input_value(row, i);
            }
            *logit = sum;
        }
        logits
    }
}

impl Classifier for LogRegModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn predict(&self, row: &[f64]) -> usize {
        argmax(&self.predict_proba(row))
    }
}

impl ProbabilisticClassifier for LogRegModel {
    fn predict_proba(&self, row: &[f64]) -> Vec<f64> {
        let logits = self.logits(row);
        if self.is_binary() {
            let p = sigmoid(logits[0]);
            vec![1.0 - p, p]
        } else {
            softmax(&logits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary() -> LogRegModel {
        LogRegModel {
            model_version: 1,
            n_features: 2,
            n_classes: 2,
            weights: vec![2.0, -1.0],
            bias: vec![0.0],
            feature_mean: Some(vec![0.5, 0.0]),
        }
    }

    #[test]
    fn binary_model_uses_sigmoid() {
        let model = binary();
        model.validate().unwrap();
        let proba = model.predict_proba(&[1.0, 0.0]);
        assert_eq!(proba.len(), 2);
        assert!((proba[1] - sigmoid(2.0)).abs() < 1e-12);
        assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert_eq!(model.predict(&[1.0, 0.0]), 1);
        assert_eq!(model.predict(&[-1.0, 0.0]), 0);
    }

    #[test]
    fn missing_inputs_use_feature_mean() {
        let model = binary();
        let imputed = model.predict_proba(&[f64::NAN, 0.0]);
        let explicit = model.predict_proba(&[0.5, 0.0]);
        assert_eq!(imputed, explicit);
    }

    #[test]
    fn multinomial_model_uses_softmax() {
        let model = LogRegModel {
            model_version: 1,
            n_features: 1,
            n_classes: 3,
            weights: vec![1.0, 0.0, -1.0],
            bias: vec![0.0, 0.0, 0.0],
            feature_mean: None,
        };
        model.validate().unwrap();
        assert_eq!(model.predict(&[2.0]), 0);
        assert_eq!(model.predict(&[-2.0]), 2);
        let proba = model.predict_proba(&[f64::NAN]);
        assert!(proba.iter().all(|p| (p - 1.0 / 3.0).abs() < 1e-12));
    }

    #[test]
    fn opposing_overflow_keeps_probabilities_finite() {
        let model = LogRegModel {
            model_version: 1,
            n_features: 2,
            n_classes: 2,
            weights: vec![2.0, 2.0],
            bias: vec![0.0],
            feature_mean: None,
        };
        let proba = model.predict_proba(&[1e308, -1e308]);
        assert_eq!(proba, vec![0.5, 0.5]);
        assert_eq!(model.predict(&[1e308, -1e308]), 0);
    }

    #[test]
    fn validate_rejects_bad_layout() {
        let mut model = binary();
        model.weights.push(1.0);
        assert!(model.validate().is_err());
    }
}
