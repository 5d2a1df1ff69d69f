use rand::Rng;

use crate::scoring::{allocate, argmax, normalize_by_max};
use crate::{
    round_to, CampaignInput, PerformancePrediction, Platform, PlatformScores, PredictionSource,
    ScoredCampaign,
};

const TECH_KEYWORDS: [&str; 3] = ["tech", "software", "b2b"];
const LIFESTYLE_KEYWORDS: [&str; 3] = ["fashion", "food", "lifestyle"];

const SEARCH_BOOST: f64 = 0.3;
const PROFESSIONAL_BOOST: f64 = 0.4;
const SOCIAL_BOOST: f64 = 0.3;

const HEURISTIC_CTR: f64 = 0.025;
const SPEND_PER_THOUSAND_REACHED: f64 = 2.5;

#[derive(Debug, Clone)]
pub struct RuleBasedScorer {
    baseline: PlatformScores,
}

impl Default for RuleBasedScorer {
    fn default() -> Self {
        let baseline = [
            (Platform::Facebook, 0.5),
            (Platform::Google, 0.5),
            (Platform::Instagram, 0.3),
            (Platform::LinkedIn, 0.3),
            (Platform::Twitter, 0.2),
        ]
        .into_iter()
        .collect();
        Self { baseline }
    }
}

impl RuleBasedScorer {
    pub fn new(baseline: PlatformScores) -> Self {
        Self { baseline }
    }

    pub fn platform_scores(&self, product_name: &str) -> PlatformScores {
        let mut scores = self.baseline.clone();
        let name = product_name.to_lowercase();

        if TECH_KEYWORDS.iter().any(|keyword| name.contains(keyword)) {
            *scores.entry(Platform::Google).or_insert(0.0) += SEARCH_BOOST;
            *scores.entry(Platform::LinkedIn).or_insert(0.0) += PROFESSIONAL_BOOST;
        }
        if LIFESTYLE_KEYWORDS.iter().any(|keyword| name.contains(keyword)) {
            *scores.entry(Platform::Facebook).or_insert(0.0) += SOCIAL_BOOST;
        }

        normalize_by_max(&scores)
    }

    pub fn score<R: Rng + ?Sized>(&self, input: &CampaignInput, rng: &mut R) -> ScoredCampaign {
        let platform_scores = self.platform_scores(&input.product_name);
        let recommended_platform = argmax(&platform_scores).unwrap_or(Platform::Facebook);
        let budget_allocation = allocate(&platform_scores, input.budget);

        let estimated_reach = (input.budget / SPEND_PER_THOUSAND_REACHED * 1000.0) as u64;
        let estimated_conversions = rng.gen_range(50..=500u64);
        let confidence_score = round_to(rng.gen_range(0.75..=0.95), 2);

        ScoredCampaign {
            source: PredictionSource::Heuristic,
            recommended_platform,
            platform_scores,
            budget_allocation,
            performance: PerformancePrediction {
                estimated_ctr: HEURISTIC_CTR,
                estimated_conversions,
                estimated_reach,
                estimated_impressions: None,
            },
            confidence_score,
        }
    }
}
