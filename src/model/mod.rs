pub mod encoding;
pub mod forest;
pub mod lifecycle;
pub mod training;

pub use encoding::{
    CategoricalEncoders, FeatureVector, LabelEncoder, StandardScaler, FEATURE_COUNT,
};
pub use forest::{
    DecisionTree, ForestParams, RandomForestClassifier, RandomForestRegressor, TreeNode,
};
pub use lifecycle::{ModelManager, ModelStatus};
pub use training::{Trainer, TrainingRecord, TrainingReport};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ModelError, PredictionError};
use crate::scoring::{allocate, argmax, normalize_by_max, objective_weights};
use crate::{
    BudgetAllocation, CampaignInput, PerformancePrediction, Platform, PlatformScores,
    PredictionSource, ScoredCampaign,
};

pub const BUNDLE_VERSION: u32 = 1;

const CONFIDENCE_MARGIN: f64 = 0.05;
const CONFIDENCE_CEILING: f64 = 0.95;
const REACH_PER_UNIT_BUDGET: f64 = 15.0;
const IMPRESSIONS_PER_UNIT_BUDGET: f64 = 50.0;

/// Everything the offline trainer fits, persisted as a single JSON bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub version: u32,
    pub is_trained: bool,
    pub feature_count: usize,
    pub platform_classifier: RandomForestClassifier,
    pub score_regressor: RandomForestRegressor,
    pub ctr_regressor: RandomForestRegressor,
    pub conversion_regressor: RandomForestRegressor,
    pub label_encoders: CategoricalEncoders,
    pub platform_encoder: LabelEncoder,
    pub scaler: StandardScaler,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutputs {
    pub class_index: usize,
    pub class_probabilities: Vec<f64>,
    pub platform_score: f64,
    pub ctr_prediction: f64,
    pub conversion_prediction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    pub recommended_platform: Platform,
    pub platform_scores: PlatformScores,
    pub platform_score: f64,
    pub ctr_prediction: f64,
    pub conversion_prediction: f64,
    pub confidence_score: f64,
    pub budget_allocation: BudgetAllocation,
}

impl TrainedModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let data = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, ModelError> {
        let model: TrainedModel = serde_json::from_str(data)?;
        model.validate()?;
        Ok(model)
    }

    /// Writes the bundle next to its final path and renames it into place.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let io_error = |source: std::io::Error| ModelError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }
        let payload = serde_json::to_string(self)?;
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload).map_err(io_error)?;
        std::fs::rename(&tmp_path, path).map_err(io_error)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if !self.is_trained {
            return Err(ModelError::NotTrained);
        }
        if self.version != BUNDLE_VERSION {
            return Err(ModelError::Invalid(format!(
                "unsupported bundle version {}",
                self.version
            )));
        }
        if self.feature_count != FEATURE_COUNT || self.scaler.width() != FEATURE_COUNT {
            return Err(ModelError::Invalid(format!(
                "expected {} features, bundle declares {} and scales {}",
                FEATURE_COUNT,
                self.feature_count,
                self.scaler.width()
            )));
        }
        if !self.scaler.is_consistent() {
            return Err(ModelError::Invalid("scaler parameters are inconsistent".to_string()));
        }
        if self.platform_encoder.is_empty()
            || self.platform_classifier.n_classes() != self.platform_encoder.len()
        {
            return Err(ModelError::Invalid(format!(
                "classifier predicts {} classes but encoder knows {}",
                self.platform_classifier.n_classes(),
                self.platform_encoder.len()
            )));
        }
        let encoders = [
            &self.platform_encoder,
            &self.label_encoders.location,
            &self.label_encoders.age_group,
            &self.label_encoders.objective,
        ];
        if encoders.iter().any(|encoder| !encoder.is_sorted()) {
            return Err(ModelError::Invalid(
                "encoder classes must be sorted and unique".to_string(),
            ));
        }
        if let Some(unknown) = self
            .platform_encoder
            .classes()
            .iter()
            .find(|label| Platform::from_label(label).is_none())
        {
            return Err(ModelError::Invalid(format!("unknown platform label {}", unknown)));
        }
        let forests = [
            self.platform_classifier.tree_count(),
            self.score_regressor.tree_count(),
            self.ctr_regressor.tree_count(),
            self.conversion_regressor.tree_count(),
        ];
        if forests.contains(&0) {
            return Err(ModelError::Invalid("bundle contains an empty forest".to_string()));
        }
        Ok(())
    }

    pub fn encode(&self, input: &CampaignInput) -> Result<FeatureVector, PredictionError> {
        FeatureVector::encode(
            &self.label_encoders,
            &input.location,
            &input.target_audience.age_group,
            input.primary_objective(),
            input.budget,
            &input.interests_text(),
        )
    }

    pub fn infer(&self, features: &FeatureVector) -> Result<ModelOutputs, PredictionError> {
        let row = self.scaler.transform(&features.to_row())?;
        let (class_index, class_probabilities) = self.platform_classifier.predict(&row)?;

        Ok(ModelOutputs {
            class_index,
            class_probabilities,
            platform_score: finite("platform score", self.score_regressor.predict(&row)?)?,
            ctr_prediction: finite("ctr", self.ctr_regressor.predict(&row)?)?,
            conversion_prediction: finite("conversion", self.conversion_regressor.predict(&row)?)?,
        })
    }

    pub fn predict(&self, input: &CampaignInput) -> Result<ModelPrediction, PredictionError> {
        let features = self.encode(input)?;
        let outputs = self.infer(&features)?;

        let mut probabilities: PlatformScores =
            Platform::ALL.iter().map(|&platform| (platform, 0.0)).collect();
        for (idx, probability) in outputs.class_probabilities.iter().enumerate() {
            let platform = self.decode_platform(idx)?;
            *probabilities.entry(platform).or_insert(0.0) += probability;
        }
        // Pick the winner after rounding so near-ties resolve in platform order.
        let platform_scores = normalize_by_max(&probabilities);
        let recommended_platform = match argmax(&platform_scores) {
            Some(platform) => platform,
            None => self.decode_platform(outputs.class_index)?,
        };

        let confidence_score = (outputs.platform_score + CONFIDENCE_MARGIN)
            .min(CONFIDENCE_CEILING)
            .max(0.0);
        let budget_allocation =
            allocate(&objective_weights(input.primary_objective()), input.budget);

        Ok(ModelPrediction {
            recommended_platform,
            platform_scores,
            platform_score: outputs.platform_score,
            ctr_prediction: outputs.ctr_prediction,
            conversion_prediction: outputs.conversion_prediction,
            confidence_score,
            budget_allocation,
        })
    }

    fn decode_platform(&self, index: usize) -> Result<Platform, PredictionError> {
        let label = self.platform_encoder.inverse_transform(index)?;
        Platform::from_label(label).ok_or(PredictionError::UnknownLabel(index))
    }
}

impl ModelPrediction {
    /// The conversion regressor is read as a rate and scaled by reach into a
    /// count, so both scoring paths report conversions in the same unit.
    pub fn into_scored(self, input: &CampaignInput) -> ScoredCampaign {
        let estimated_reach = (input.budget * REACH_PER_UNIT_BUDGET) as u64;
        let estimated_impressions = (input.budget * IMPRESSIONS_PER_UNIT_BUDGET) as u64;
        let estimated_conversions =
            (self.conversion_prediction.max(0.0) * estimated_reach as f64).round() as u64;

        ScoredCampaign {
            source: PredictionSource::Model,
            recommended_platform: self.recommended_platform,
            platform_scores: self.platform_scores,
            budget_allocation: self.budget_allocation,
            performance: PerformancePrediction {
                estimated_ctr: self.ctr_prediction.max(0.0),
                estimated_conversions,
                estimated_reach,
                estimated_impressions: Some(estimated_impressions),
            },
            confidence_score: self.confidence_score,
        }
    }
}

fn finite(name: &'static str, value: f64) -> Result<f64, PredictionError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictionError::NonFinite(name))
    }
}
