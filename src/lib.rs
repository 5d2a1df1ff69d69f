pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod scoring;
pub mod server;
pub mod validate;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use engine::RecommendationEngine;
pub use error::{EngineError, ModelError, PredictionError, TrainingError, ValidationError};

pub const DEFAULT_BUDGET: f64 = 1000.0;
pub const DEFAULT_LOCATION: &str = "United States";
pub const DEFAULT_AGE_GROUP: &str = "25-34";
pub const DEFAULT_OBJECTIVE: &str = "awareness";

const MAX_EXACT_INTEGER: f64 = 4_503_599_627_370_496.0;

// Declaration order doubles as the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Platform {
    Facebook,
    Google,
    Instagram,
    LinkedIn,
    Twitter,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Facebook,
        Platform::Google,
        Platform::Instagram,
        Platform::LinkedIn,
        Platform::Twitter,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Platform::Facebook => "Facebook",
            Platform::Google => "Google",
            Platform::Instagram => "Instagram",
            Platform::LinkedIn => "LinkedIn",
            Platform::Twitter => "Twitter",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "facebook" | "meta" | "meta_ads" | "facebook_ads" => Some(Platform::Facebook),
            "google" | "google_ads" => Some(Platform::Google),
            "instagram" | "instagram_ads" => Some(Platform::Instagram),
            "linkedin" | "linkedin_ads" => Some(Platform::LinkedIn),
            "twitter" | "x" | "twitter_ads" => Some(Platform::Twitter),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Facebook => "Meta Ads (Facebook)",
            Platform::Google => "Google Ads",
            Platform::Instagram => "Meta Ads (Instagram)",
            Platform::LinkedIn => "LinkedIn Ads",
            Platform::Twitter => "X Ads (Twitter)",
        }
    }

    pub fn ad_types(self) -> &'static [&'static str] {
        match self {
            Platform::Facebook => &["Feed", "Stories", "Reels"],
            Platform::Google => &["Search", "Display", "Shopping"],
            Platform::Instagram => &["Feed", "Stories", "Reels"],
            Platform::LinkedIn => &["Sponsored", "Message"],
            Platform::Twitter => &["Promoted", "Takeover"],
        }
    }

    pub fn min_budget(self) -> u32 {
        match self {
            Platform::Facebook | Platform::Instagram => 5,
            Platform::Google | Platform::LinkedIn | Platform::Twitter => 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetAudience {
    pub age_group: String,
    pub interests: Vec<String>,
}

impl Default for TargetAudience {
    fn default() -> Self {
        Self {
            age_group: DEFAULT_AGE_GROUP.to_string(),
            interests: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignInput {
    pub product_name: String,
    pub budget: f64,
    pub location: String,
    pub target_audience: TargetAudience,
    pub objectives: Vec<String>,
}

impl Default for CampaignInput {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            budget: DEFAULT_BUDGET,
            location: DEFAULT_LOCATION.to_string(),
            target_audience: TargetAudience::default(),
            objectives: vec![DEFAULT_OBJECTIVE.to_string()],
        }
    }
}

impl CampaignInput {
    pub fn primary_objective(&self) -> &str {
        self.objectives
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_OBJECTIVE)
    }

    pub fn interests_text(&self) -> String {
        self.target_audience.interests.join(";")
    }
}

pub type PlatformScores = BTreeMap<Platform, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetShare {
    pub amount: f64,
    pub percentage: f64,
}

pub type BudgetAllocation = BTreeMap<Platform, BudgetShare>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePrediction {
    pub estimated_ctr: f64,
    pub estimated_conversions: u64,
    pub estimated_reach: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_impressions: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimalTiming {
    pub best_days: Vec<String>,
    pub best_hours: Vec<String>,
    pub timezone: String,
    pub frequency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    Model,
    Heuristic,
}

impl PredictionSource {
    pub fn label(self) -> &'static str {
        match self {
            PredictionSource::Model => "model",
            PredictionSource::Heuristic => "heuristic",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCampaign {
    pub source: PredictionSource,
    pub recommended_platform: Platform,
    pub platform_scores: PlatformScores,
    pub budget_allocation: BudgetAllocation,
    pub performance: PerformancePrediction,
    pub confidence_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommended_platform: Platform,
    pub platform_scores: PlatformScores,
    pub budget_allocation: BudgetAllocation,
    pub ad_copy_suggestions: Vec<String>,
    pub optimal_timing: OptimalTiming,
    pub performance_predictions: PerformancePrediction,
    pub confidence_score: f64,
    pub insights: Vec<String>,
    pub source: PredictionSource,
    pub generated_at: DateTime<Utc>,
}

// Values past 2^52 after scaling have no fractional part left to round.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= MAX_EXACT_INTEGER {
        return value;
    }
    scaled.round() / factor
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    grouped
}

pub fn format_percent(value: f64, digits: usize) -> String {
    format!("{:.1$}%", value * 100.0, digits)
}
