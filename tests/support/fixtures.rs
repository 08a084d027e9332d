use std::path::PathBuf;

use exoclass::config::ServerConfig;
use tempfile::TempDir;

/// Metadata with one float feature and one missingness flag.
pub const SCENARIO_META: &str = r#"{
    "features": ["a", "b_miss"],
    "label_map": {"0": "CONFIRMED", "1": "FALSE POSITIVE"}
}"#;

/// Binary logistic model: `z = -1 + a + 2 * b_miss`.
pub const SCENARIO_LOGREG: &str = r#"{
    "kind": "logistic_regression",
    "model_version": 1,
    "n_features": 2,
    "n_classes": 2,
    "weights": [1.0, 2.0],
    "bias": [-1.0]
}"#;

/// Label-only model with centroids at the origin and at (5, 1).
pub const SCENARIO_CENTROID: &str = r#"{
    "kind": "nearest_centroid",
    "model_version": 1,
    "n_features": 2,
    "centroids": [[0.0, 0.0], [5.0, 1.0]]
}"#;

/// Model files written to a temporary export directory.
pub struct ModelFixture {
    pub dir: TempDir,
    pub model_path: PathBuf,
    pub metadata_path: PathBuf,
}

impl ModelFixture {
    pub fn write(metadata: &str, model: &str) -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let model_path = dir.path().join("exoplanet_model.json");
        let metadata_path = dir.path().join("exoplanet_model.meta.json");
        std::fs::write(&model_path, model).expect("write model");
        std::fs::write(&metadata_path, metadata).expect("write metadata");
        Self {
            dir,
            model_path,
            metadata_path,
        }
    }

    /// Config pointing at the fixture; the metadata path is left to the default.
    pub fn config(&self) -> ServerConfig {
        ServerConfig {
            model_path: self.model_path.clone(),
            ..ServerConfig::default()
        }
    }
}

/// Bundled demo export shipped in `assets/demo`.
pub fn demo_model_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/demo/exoplanet_model.json")
}
