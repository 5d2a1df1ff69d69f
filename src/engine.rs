use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::AdvisorConfig;
use crate::error::{EngineError, ModelError};
use crate::format::format_recommendation;
use crate::model::{ModelManager, ModelStatus};
use crate::scoring::{RandomSource, RuleBasedScorer};
use crate::validate::{parse_campaign, InputDefaults};
use crate::{CampaignInput, Recommendation, ScoredCampaign};

// Any model fault degrades to the rule-based scorer.
#[derive(Debug)]
pub struct RecommendationEngine {
    models: ModelManager,
    scorer: RuleBasedScorer,
    random: RandomSource,
    defaults: InputDefaults,
}

impl RecommendationEngine {
    pub fn new(models: ModelManager, random: RandomSource) -> Self {
        Self {
            models,
            scorer: RuleBasedScorer::default(),
            random,
            defaults: InputDefaults::default(),
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        let engine = Self::new(
            ModelManager::load(config.model.path.clone()),
            RandomSource::from_seed(config.scoring.seed),
        )
        .with_defaults(config.scoring.input_defaults());
        info!(
            model = engine.model_status().label(),
            random = engine.random.label(),
            "Recommendation engine ready"
        );
        engine
    }

    pub fn with_defaults(mut self, defaults: InputDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_scorer(mut self, scorer: RuleBasedScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn model_status(&self) -> ModelStatus {
        self.models.status()
    }

    pub fn models(&self) -> &ModelManager {
        &self.models
    }

    pub fn score(&self, input: &CampaignInput) -> ScoredCampaign {
        match self.models.predict(input) {
            Ok(prediction) => prediction.into_scored(input),
            Err(err) => {
                match &err {
                    ModelError::NotTrained => debug!(
                        status = self.models.status().label(),
                        "No trained model, using heuristic scorer"
                    ),
                    other => warn!(
                        error = %other,
                        "Model prediction failed, falling back to heuristic scorer"
                    ),
                }
                let mut rng = self.random.rng_for(input);
                self.scorer.score(input, &mut rng)
            }
        }
    }

    pub fn recommend(&self, payload: &Value) -> Result<Recommendation, EngineError> {
        let input = parse_campaign(payload, &self.defaults).map_err(|err| {
            warn!(error = %err, "Rejected campaign payload");
            err
        })?;
        let scored = self.score(&input);
        debug!(
            source = scored.source.label(),
            platform = scored.recommended_platform.label(),
            "Campaign scored"
        );
        format_recommendation(&scored, &input, Utc::now())
    }
}
