//! Unit tests for the model adapter and registry

use ndarray::Array2;
use pricecast::features::{FEATURE_COLUMNS, FEATURE_COUNT};
use pricecast::models::Timeframe;
use pricecast::pipeline::model::ArtifactPaths;
use pricecast::pipeline::{
    LinearModelArtifact, LinearWindowModel, ModelError, ModelRegistry, ReloadOutcome,
    SequenceModel, WINDOW,
};
use std::path::PathBuf;
use std::sync::Arc;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("pricecast-unit-{}-{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn live_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|s| s.to_string()).collect()
}

/// Forecasts the last scaled close plus `bias`.
fn last_close_artifact(bias: f64, version: &str) -> LinearModelArtifact {
    let mut weights = vec![vec![0.0; FEATURE_COUNT]; WINDOW];
    weights[WINDOW - 1][0] = 1.0;
    LinearModelArtifact {
        version: Some(version.to_string()),
        window: WINDOW,
        feature_columns: live_columns(),
        weights,
        bias,
    }
}

fn write_artifact(dir: &PathBuf, timeframe: Timeframe, artifact: &LinearModelArtifact) {
    let path = ArtifactPaths::new(dir, timeframe).linear;
    std::fs::write(path, serde_json::to_vec(artifact).unwrap()).unwrap();
}

#[test]
fn test_linear_model_predicts_weighted_sum() {
    let model = LinearWindowModel::from_artifact(last_close_artifact(0.5, "t1")).unwrap();
    let window = Array2::from_shape_fn((WINDOW, FEATURE_COUNT), |(i, j)| (i + j) as f64 / 100.0);
    let output = model.predict(window.view()).unwrap();
    assert!((output - (0.19 + 0.5)).abs() < 1e-12);
    assert_eq!(model.version(), "t1");
}

#[test]
fn test_linear_model_rejects_wrong_window_shape() {
    let model = LinearWindowModel::from_artifact(last_close_artifact(0.0, "t1")).unwrap();
    let window = Array2::<f64>::zeros((WINDOW - 1, FEATURE_COUNT));
    assert!(matches!(
        model.predict(window.view()),
        Err(ModelError::Shape { rows: 19, .. })
    ));
}

#[test]
fn test_artifact_with_reordered_columns_is_refused() {
    let mut artifact = last_close_artifact(0.0, "t1");
    artifact.feature_columns.swap(0, 1);
    assert!(matches!(
        LinearWindowModel::from_artifact(artifact),
        Err(ModelError::Schema(_))
    ));
}

#[test]
fn test_artifact_with_wrong_weight_rows_is_refused() {
    let mut artifact = last_close_artifact(0.0, "t1");
    artifact.weights.pop();
    assert!(matches!(
        LinearWindowModel::from_artifact(artifact),
        Err(ModelError::Shape { .. })
    ));
}

#[test]
fn test_artifact_paths() {
    let paths = ArtifactPaths::new(std::path::Path::new("models"), Timeframe::FourHours);
    assert!(paths.linear.ends_with("model_4h.json"));
    assert!(paths.onnx.ends_with("lstm_4h.onnx"));
    assert!(paths.onnx_schema.ends_with("lstm_4h.features.json"));
}

#[tokio::test]
async fn test_registry_load_all_with_partial_artifacts() {
    let dir = scratch_dir("load-all");
    write_artifact(&dir, Timeframe::OneHour, &last_close_artifact(0.0, "h1"));
    std::fs::write(ArtifactPaths::new(&dir, Timeframe::FourHours).linear, b"{not json").unwrap();

    let registry = ModelRegistry::new(&dir);
    assert_eq!(registry.load_all().await, 1);
    assert!(registry.get(Timeframe::OneHour).await.is_some());
    assert!(registry.get(Timeframe::FiveMinutes).await.is_none());
    assert!(registry.get(Timeframe::FourHours).await.is_none());
}

#[tokio::test]
async fn test_registry_reload_swaps_without_disturbing_holders() {
    let dir = scratch_dir("swap");
    write_artifact(&dir, Timeframe::OneHour, &last_close_artifact(0.0, "first"));
    let registry = ModelRegistry::new(&dir);
    registry.reload(Timeframe::OneHour).await.unwrap();

    let in_flight = registry.get(Timeframe::OneHour).await.unwrap();

    write_artifact(&dir, Timeframe::OneHour, &last_close_artifact(0.0, "second"));
    let outcome = registry.reload(Timeframe::OneHour).await.unwrap();
    assert_eq!(
        outcome,
        ReloadOutcome::Loaded {
            name: "Linear Window".to_string(),
            version: "second".to_string()
        }
    );

    assert_eq!(in_flight.model.version(), "first");
    let current = registry.get(Timeframe::OneHour).await.unwrap();
    assert_eq!(current.model.version(), "second");
}

#[tokio::test]
async fn test_registry_failed_reload_keeps_previous_model() {
    let dir = scratch_dir("broken");
    write_artifact(&dir, Timeframe::FiveMinutes, &last_close_artifact(0.0, "good"));
    let registry = ModelRegistry::new(&dir);
    registry.reload(Timeframe::FiveMinutes).await.unwrap();

    let mut bad = last_close_artifact(0.0, "bad");
    bad.feature_columns.reverse();
    write_artifact(&dir, Timeframe::FiveMinutes, &bad);

    assert!(registry.reload(Timeframe::FiveMinutes).await.is_err());
    let current = registry.get(Timeframe::FiveMinutes).await.unwrap();
    assert_eq!(current.model.version(), "good");
}

#[tokio::test]
async fn test_registry_missing_artifact_removes_entry() {
    let dir = scratch_dir("missing");
    write_artifact(&dir, Timeframe::OneHour, &last_close_artifact(0.0, "h1"));
    let registry = ModelRegistry::new(&dir);
    registry.reload(Timeframe::OneHour).await.unwrap();

    std::fs::remove_file(ArtifactPaths::new(&dir, Timeframe::OneHour).linear).unwrap();
    assert_eq!(
        registry.reload(Timeframe::OneHour).await.unwrap(),
        ReloadOutcome::Missing
    );
    assert!(registry.get(Timeframe::OneHour).await.is_none());
}

#[tokio::test]
async fn test_registry_install_rejects_schema_mismatch() {
    struct Reordered(Vec<String>);

    impl SequenceModel for Reordered {
        fn predict(&self, _window: ndarray::ArrayView2<'_, f64>) -> Result<f64, ModelError> {
            Ok(0.0)
        }
        fn feature_columns(&self) -> &[String] {
            &self.0
        }
        fn name(&self) -> &str {
            "Reordered"
        }
        fn version(&self) -> &str {
            "x"
        }
    }

    let mut columns = live_columns();
    columns.swap(5, 6);
    let registry = ModelRegistry::new(scratch_dir("install"));
    let result = registry
        .install(Timeframe::OneHour, Arc::new(Reordered(columns)))
        .await;
    assert!(matches!(result, Err(ModelError::Schema(_))));
    assert!(registry.snapshot().await.is_empty());
}
