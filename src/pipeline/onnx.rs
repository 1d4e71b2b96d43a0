//! ONNX Runtime adapter for exported sequence models.

use super::model::{check_window_shape, ModelError, SequenceModel};
use crate::features::{schema_mismatch, FEATURE_COUNT};
use crate::pipeline::window::{flatten_f32, WINDOW};
use ndarray::ArrayView2;
use ort::session::Session;
use std::path::Path;
use std::sync::Mutex;

pub struct OnnxSequenceModel {
    session: Mutex<Session>,
    feature_columns: Vec<String>,
}

impl OnnxSequenceModel {
    /// Load a model together with its feature column sidecar.
    ///
    /// The sidecar is a JSON array of column names and is required.
    pub fn load(model_path: &Path, schema_path: &Path) -> Result<Self, ModelError> {
        let bytes = std::fs::read(schema_path).map_err(|source| ModelError::Io {
            path: schema_path.to_path_buf(),
            source,
        })?;
        let feature_columns: Vec<String> =
            serde_json::from_slice(&bytes).map_err(|source| ModelError::Parse {
                path: schema_path.to_path_buf(),
                source,
            })?;
        if let Some(mismatch) = schema_mismatch(&feature_columns) {
            return Err(mismatch.into());
        }

        let session = Session::builder()
            .and_then(|builder| builder.commit_from_file(model_path))
            .map_err(|e| ModelError::Runtime(format!("failed to load ONNX model: {e}")))?;

        Ok(Self {
            session: Mutex::new(session),
            feature_columns,
        })
    }
}

impl SequenceModel for OnnxSequenceModel {
    fn predict(&self, window: ArrayView2<'_, f64>) -> Result<f64, ModelError> {
        check_window_shape(&window)?;

        let flat_data = flatten_f32(window);
        let shape = vec![1, WINDOW, FEATURE_COUNT];
        let input_value = ort::value::Value::from_array((shape.as_slice(), flat_data))
            .map_err(|e| ModelError::Runtime(format!("input value creation failed: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ModelError::Runtime(format!("session lock failed: {e}")))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| ModelError::Runtime(e.to_string()))?;

        let output_value = outputs
            .iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| ModelError::Runtime("no output found".to_string()))?;
        let data = output_value
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::Runtime(e.to_string()))?;
        let value = data
            .1
            .iter()
            .next()
            .ok_or_else(|| ModelError::Runtime("empty output".to_string()))?;
        Ok(*value as f64)
    }

    fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    fn name(&self) -> &str {
        "ONNX Runtime (LSTM)"
    }

    fn version(&self) -> &str {
        "onnx"
    }
}
