//! Sequence model interface and the portable linear artifact.

use crate::features::{schema_mismatch, SchemaMismatch, FEATURE_COUNT};
use crate::models::Timeframe;
use crate::pipeline::window::WINDOW;
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("model feature schema does not match: {0}")]
    Schema(#[from] SchemaMismatch),
    #[error("model expects input {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    Shape {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
    #[error("model runtime error: {0}")]
    Runtime(String),
}

/// A trained model mapping one scaled feature window to a scaled close.
pub trait SequenceModel: Send + Sync {
    /// Forecast the next scaled close from a `WINDOW × FEATURE_COUNT` window.
    fn predict(&self, window: ArrayView2<'_, f64>) -> Result<f64, ModelError>;

    /// Feature column order the model was trained with
    fn feature_columns(&self) -> &[String];

    fn name(&self) -> &str;

    fn version(&self) -> &str;
}

/// Reject windows that do not have the trained shape.
pub fn check_window_shape(window: &ArrayView2<'_, f64>) -> Result<(), ModelError> {
    let (rows, cols) = window.dim();
    if rows != WINDOW || cols != FEATURE_COUNT {
        return Err(ModelError::Shape {
            expected_rows: WINDOW,
            expected_cols: FEATURE_COUNT,
            rows,
            cols,
        });
    }
    Ok(())
}

/// On-disk form of [`LinearWindowModel`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    #[serde(default)]
    pub version: Option<String>,
    pub window: usize,
    pub feature_columns: Vec<String>,
    /// `window` rows of `FEATURE_COUNT` weights
    pub weights: Vec<Vec<f64>>,
    pub bias: f64,
}

/// Weighted sum over every cell of the window plus a bias.
#[derive(Debug, Clone)]
pub struct LinearWindowModel {
    feature_columns: Vec<String>,
    weights: Vec<Vec<f64>>,
    bias: f64,
    version: String,
}

impl LinearWindowModel {
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, ModelError> {
        if let Some(mismatch) = schema_mismatch(&artifact.feature_columns) {
            return Err(mismatch.into());
        }

        let cols = artifact.weights.first().map(Vec::len).unwrap_or(0);
        let ragged = artifact.weights.iter().any(|row| row.len() != FEATURE_COUNT);
        if artifact.window != WINDOW || artifact.weights.len() != WINDOW || ragged {
            return Err(ModelError::Shape {
                expected_rows: WINDOW,
                expected_cols: FEATURE_COUNT,
                rows: artifact.weights.len(),
                cols,
            });
        }

        Ok(Self {
            feature_columns: artifact.feature_columns,
            weights: artifact.weights,
            bias: artifact.bias,
            version: artifact.version.unwrap_or_else(|| "v1".to_string()),
        })
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: LinearModelArtifact =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_artifact(artifact)
    }
}

impl SequenceModel for LinearWindowModel {
    fn predict(&self, window: ArrayView2<'_, f64>) -> Result<f64, ModelError> {
        check_window_shape(&window)?;
        let mut output = self.bias;
        for (row, weights) in window.rows().into_iter().zip(self.weights.iter()) {
            for (value, weight) in row.iter().zip(weights.iter()) {
                output += value * weight;
            }
        }
        Ok(output)
    }

    fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    fn name(&self) -> &str {
        "Linear Window"
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// Artifact file names for a timeframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub linear: PathBuf,
    pub onnx: PathBuf,
    pub onnx_schema: PathBuf,
}

impl ArtifactPaths {
    pub fn new(models_dir: &Path, timeframe: Timeframe) -> Self {
        let tf = timeframe.as_str();
        Self {
            linear: models_dir.join(format!("model_{tf}.json")),
            onnx: models_dir.join(format!("lstm_{tf}.onnx")),
            onnx_schema: models_dir.join(format!("lstm_{tf}.features.json")),
        }
    }
}

/// Load whichever artifact exists for `timeframe`.
///
/// `Ok(None)` means no artifact is present. The linear artifact wins when
/// both exist. ONNX artifacts need the `onnx` feature.
pub fn load_model(
    models_dir: &Path,
    timeframe: Timeframe,
) -> Result<Option<Arc<dyn SequenceModel>>, ModelError> {
    let paths = ArtifactPaths::new(models_dir, timeframe);

    if paths.linear.exists() {
        let model = LinearWindowModel::load(&paths.linear)?;
        info!(
            timeframe = %timeframe,
            path = %paths.linear.display(),
            "ModelLoader: loaded linear model for {}",
            timeframe
        );
        return Ok(Some(Arc::new(model)));
    }

    #[cfg(feature = "onnx")]
    if paths.onnx.exists() {
        let model = crate::pipeline::onnx::OnnxSequenceModel::load(&paths.onnx, &paths.onnx_schema)?;
        info!(
            timeframe = %timeframe,
            path = %paths.onnx.display(),
            "ModelLoader: loaded ONNX model for {}",
            timeframe
        );
        return Ok(Some(Arc::new(model)));
    }

    debug!(
        timeframe = %timeframe,
        dir = %models_dir.display(),
        "ModelLoader: no artifact for {}",
        timeframe
    );
    Ok(None)
}
