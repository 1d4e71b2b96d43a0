//! Timeframe → model registry with swap-on-write entries.

use super::model::{load_model, ModelError, SequenceModel};
use crate::features::{schema_mismatch, schema_tag};
use crate::models::Timeframe;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// A model as installed for one timeframe. Never mutated after install.
pub struct RegisteredModel {
    pub timeframe: Timeframe,
    pub model: Arc<dyn SequenceModel>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisteredModelInfo {
    pub timeframe: Timeframe,
    pub name: String,
    pub version: String,
    pub loaded_at: DateTime<Utc>,
}

/// Result of reloading one timeframe from disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReloadOutcome {
    Loaded { name: String, version: String },
    /// No artifact on disk; any previous entry was removed.
    Missing,
}

/// Registry shared by the predictor, scheduler, and HTTP shell.
///
/// Readers clone the entry `Arc` under a short read lock, so a reload never
/// disturbs a prediction already running on the previous model.
pub struct ModelRegistry {
    models_dir: PathBuf,
    entries: RwLock<HashMap<Timeframe, Arc<RegisteredModel>>>,
}

impl ModelRegistry {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub async fn get(&self, timeframe: Timeframe) -> Option<Arc<RegisteredModel>> {
        self.entries.read().await.get(&timeframe).cloned()
    }

    /// Install a model, replacing any previous entry in one step.
    ///
    /// Models declaring a different feature column order are refused.
    pub async fn install(
        &self,
        timeframe: Timeframe,
        model: Arc<dyn SequenceModel>,
    ) -> Result<(), ModelError> {
        if let Some(mismatch) = schema_mismatch(model.feature_columns()) {
            return Err(mismatch.into());
        }

        debug!(
            timeframe = %timeframe,
            model = %model.name(),
            version = %model.version(),
            schema = %schema_tag(),
            "ModelRegistry: schema accepted for {}",
            timeframe
        );
        let entry = Arc::new(RegisteredModel {
            timeframe,
            model,
            loaded_at: Utc::now(),
        });
        self.entries.write().await.insert(timeframe, entry);
        Ok(())
    }

    pub async fn remove(&self, timeframe: Timeframe) -> bool {
        self.entries.write().await.remove(&timeframe).is_some()
    }

    /// Re-read the artifact for `timeframe` and swap it in.
    ///
    /// A missing artifact removes the entry. A broken artifact leaves the
    /// current entry in place and returns the error.
    pub async fn reload(&self, timeframe: Timeframe) -> Result<ReloadOutcome, ModelError> {
        let models_dir = self.models_dir.clone();
        let loaded = tokio::task::spawn_blocking(move || load_model(&models_dir, timeframe))
            .await
            .map_err(|e| ModelError::Runtime(format!("model load task failed: {e}")))?;

        match loaded {
            Ok(Some(model)) => {
                let outcome = ReloadOutcome::Loaded {
                    name: model.name().to_string(),
                    version: model.version().to_string(),
                };
                self.install(timeframe, model).await?;
                info!(timeframe = %timeframe, "ModelRegistry: installed model for {}", timeframe);
                Ok(outcome)
            }
            Ok(None) => {
                if self.remove(timeframe).await {
                    warn!(timeframe = %timeframe, "ModelRegistry: artifact gone, removed model for {}", timeframe);
                } else {
                    warn!(timeframe = %timeframe, "ModelRegistry: no model artifact for {}", timeframe);
                }
                Ok(ReloadOutcome::Missing)
            }
            Err(e) => {
                error!(
                    timeframe = %timeframe,
                    error = %e,
                    "ModelRegistry: failed to load model for {}, keeping previous entry",
                    timeframe
                );
                Err(e)
            }
        }
    }

    /// Load every timeframe's artifact. Returns how many models are installed.
    pub async fn load_all(&self) -> usize {
        info!(dir = %self.models_dir.display(), "ModelRegistry: loading models");
        for timeframe in Timeframe::ALL {
            // failures are logged by reload; the timeframe falls back to echo
            let _ = self.reload(timeframe).await;
        }
        let count = self.entries.read().await.len();
        info!(count = count, "ModelRegistry: {} models loaded", count);
        count
    }

    pub async fn snapshot(&self) -> Vec<RegisteredModelInfo> {
        let entries = self.entries.read().await;
        let mut infos: Vec<RegisteredModelInfo> = entries
            .values()
            .map(|entry| RegisteredModelInfo {
                timeframe: entry.timeframe,
                name: entry.model.name().to_string(),
                version: entry.model.version().to_string(),
                loaded_at: entry.loaded_at,
            })
            .collect();
        infos.sort_by_key(|info| info.timeframe);
        infos
    }
}
