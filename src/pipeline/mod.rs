//! Prediction pipeline: scaling, windowing, model registry and inference.

pub mod baseline;
pub mod model;
pub mod normalizer;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod predictor;
pub mod registry;
pub mod window;

pub use model::{load_model, LinearModelArtifact, LinearWindowModel, ModelError, SequenceModel};
pub use normalizer::{fit_transform, MinMaxScaler};
pub use predictor::{PredictionError, PredictionHistory, PricePrediction, Predictor};
pub use registry::{ModelRegistry, RegisteredModel, ReloadOutcome};
pub use window::{MIN_HISTORY, WINDOW};
