//! Nearest-centroid classifier. It has no probability output, so it is
//! served through the label-only path.

use serde::{Deserialize, Serialize};

use super::Classifier;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroidModel {
    pub model_version: i64,
    pub n_features: usize,
    /// One centroid of `n_features` values per class.
    pub centroids: Vec<Vec<f64>>,
}

impl NearestCentroidModel {
    pub fn validate(&self) -> Result<(), String> {
        if self.centroids.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        for (class_idx, centroid) in self.centroids.iter().enumerate() {
            if centroid.len() != self.n_features {
                return Err(format!(
                    "Centroid {class_idx} has {} values but expected {}",
                    centroid.len(),
                    self.n_features
                ));
            }
            if centroid.iter().any(|v| !v.is_finite()) {
                return Err(format!("Centroid {class_idx} contains non-finite values"));
            }
        }
        Ok(())
    }

    /// Squared Euclidean distance over the features present in `row`.
    fn distance(centroid: &[f64], row: &[f64]) -> f64 {
        centroid
            .iter()
            .zip(row)
            .filter(|(_, value)| !value.is_nan())
            .map(|(c, value)| (c - value) * (c - value))
            .sum()
    }
}

impl Classifier for NearestCentroidModel {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.centroids.len()
    }

    fn predict(&self, row: &[f64]) -> usize {
        let mut best_idx = 0usize;
        let mut best_dist = f64::INFINITY;
        for (idx, centroid) in self.centroids.iter().enumerate() {
            let dist = Self::distance(centroid, row);
            if dist < best_dist {
                best_dist = dist;
                best_idx = idx;
            }
        }
        best_idx
    }
}
