use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::ModelError;
use crate::model::{ModelPrediction, TrainedModel};
use crate::CampaignInput;

#[derive(Debug)]
enum ModelState {
    Unloaded,
    Loaded(Box<TrainedModel>),
    LoadFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Unloaded,
    Loaded,
    LoadFailed,
}

impl ModelStatus {
    pub fn label(self) -> &'static str {
        match self {
            ModelStatus::Unloaded => "unloaded",
            ModelStatus::Loaded => "loaded",
            ModelStatus::LoadFailed => "load_failed",
        }
    }
}

/// Owns the trained model for the lifetime of the process. State is settled
/// during construction and never changes afterwards.
#[derive(Debug)]
pub struct ModelManager {
    state: ModelState,
}

impl ModelManager {
    pub fn unloaded() -> Self {
        Self {
            state: ModelState::Unloaded,
        }
    }

    /// Loads the bundle at `path`. Failure is logged and leaves the manager
    /// in `LoadFailed`; it never aborts startup.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match TrainedModel::load(&path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    classes = model.platform_encoder.len(),
                    trees = model.platform_classifier.tree_count(),
                    "Model bundle loaded"
                );
                ModelState::Loaded(Box::new(model))
            }
            Err(ModelError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "Model bundle not found, serving heuristic recommendations. \
                     Run `campaign-advisor train` to create one"
                );
                ModelState::LoadFailed(format!("model bundle not found: {}", path.display()))
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Model bundle could not be loaded, serving heuristic recommendations"
                );
                ModelState::LoadFailed(err.to_string())
            }
        };

        Self { state }
    }

    pub fn from_model(model: TrainedModel) -> Result<Self, ModelError> {
        model.validate()?;
        Ok(Self {
            state: ModelState::Loaded(Box::new(model)),
        })
    }

    pub fn status(&self) -> ModelStatus {
        match self.state {
            ModelState::Unloaded => ModelStatus::Unloaded,
            ModelState::Loaded(_) => ModelStatus::Loaded,
            ModelState::LoadFailed(_) => ModelStatus::LoadFailed,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            ModelState::LoadFailed(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    pub fn model(&self) -> Option<&TrainedModel> {
        match &self.state {
            ModelState::Loaded(model) => Some(model.as_ref()),
            _ => None,
        }
    }

    pub fn predict(&self, input: &CampaignInput) -> Result<ModelPrediction, ModelError> {
        let model = self.model().ok_or(ModelError::NotTrained)?;
        Ok(model.predict(input)?)
    }
}
