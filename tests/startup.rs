mod support;

use exoclass::config::ServerConfig;
use exoclass::context::{AppContext, StartupError};
use exoclass::model::ModelError;
use support::fixtures::{ModelFixture, SCENARIO_LOGREG, SCENARIO_META, demo_model_path};

#[test]
fn loads_bundled_demo_export() {
    let cfg = ServerConfig {
        model_path: demo_model_path(),
        ..ServerConfig::default()
    };
    let ctx = AppContext::load(&cfg).expect("load demo");
    let info = ctx.info();
    assert_eq!(info.num_features, ctx.features().len());
    assert_eq!(ctx.labels().len(), 3);
    assert!(ctx.form_html().contains("koi_period"));
}

#[test]
fn missing_metadata_aborts_startup() {
    let fixture = ModelFixture::write(SCENARIO_META, SCENARIO_LOGREG);
    std::fs::remove_file(&fixture.metadata_path).expect("remove metadata");
    let err = AppContext::load(&fixture.config()).unwrap_err();
    assert!(matches!(err, StartupError::Metadata(_)), "{err}");
}

#[test]
fn missing_model_aborts_startup() {
    let fixture = ModelFixture::write(SCENARIO_META, SCENARIO_LOGREG);
    std::fs::remove_file(&fixture.model_path).expect("remove model");
    let err = AppContext::load(&fixture.config()).unwrap_err();
    assert!(matches!(err, StartupError::Model(ModelError::Read { .. })), "{err}");
}

#[test]
fn feature_count_mismatch_aborts_startup() {
    let metadata = r#"{"features": ["a", "b", "c_miss"], "label_map": {"0": "x", "1": "y"}}"#;
    let fixture = ModelFixture::write(metadata, SCENARIO_LOGREG);
    let err = AppContext::load(&fixture.config()).unwrap_err();
    assert!(
        matches!(
            err,
            StartupError::Model(ModelError::FeatureCount {
                expected: 3,
                found: 2,
                ..
            })
        ),
        "{err}"
    );
}

#[test]
fn explicit_metadata_path_wins_over_default() {
    let fixture = ModelFixture::write(SCENARIO_META, SCENARIO_LOGREG);
    let custom = fixture.dir.path().join("labels.json");
    std::fs::rename(&fixture.metadata_path, &custom).expect("move metadata");
    let cfg = ServerConfig {
        metadata_path: Some(custom),
        ..fixture.config()
    };
    let ctx = AppContext::load(&cfg).expect("load with explicit metadata");
    assert_eq!(ctx.features().names(), ["a", "b_miss"]);
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().expect("create tempdir");
    let path = dir.path().join("exoclass.toml");
    std::fs::write(&path, "port = 9100\nmodel_name = \"koi-gbdt\"\n").expect("write config");
    let cfg = ServerConfig::load(Some(&path)).expect("load config");
    assert_eq!(cfg.port, 9100);
    assert_eq!(cfg.model_name, "koi-gbdt");
    assert_eq!(cfg.host, "0.0.0.0");
}
