use campaign_advisor::format::{ad_copy, format_recommendation, insights, optimal_timing};
use campaign_advisor::scoring::allocate;
use campaign_advisor::{
    BudgetShare, CampaignInput, EngineError, PerformancePrediction, Platform, PlatformScores,
    PredictionSource, ScoredCampaign,
};
use chrono::{TimeZone, Utc};

fn scored(platform_scores: PlatformScores, ctr: f64, confidence: f64) -> ScoredCampaign {
    ScoredCampaign {
        source: PredictionSource::Model,
        recommended_platform: Platform::Google,
        budget_allocation: allocate(&platform_scores, 1000.0),
        platform_scores,
        performance: PerformancePrediction {
            estimated_ctr: ctr,
            estimated_conversions: 1234,
            estimated_reach: 15_000,
            estimated_impressions: Some(50_000),
        },
        confidence_score: confidence,
    }
}

fn scores() -> PlatformScores {
    [
        (Platform::Facebook, 0.456),
        (Platform::Google, 1.0),
        (Platform::Instagram, 0.2),
        (Platform::LinkedIn, 0.333),
        (Platform::Twitter, 0.1),
    ]
    .into_iter()
    .collect()
}

fn input(objective: &str) -> CampaignInput {
    CampaignInput {
        product_name: "Analytics Suite".to_string(),
        objectives: vec![objective.to_string()],
        ..CampaignInput::default()
    }
}

#[test]
fn ad_copy_follows_objective() {
    let copy = ad_copy("Widget", "leads");
    assert_eq!(copy.len(), 3);
    assert_eq!(copy[0], "Get Your Free Widget Demo Today");

    let fallback = ad_copy("Widget", "engagement");
    assert_eq!(fallback[0], "Discover the amazing Widget - Now Available!");

    assert_eq!(ad_copy("  ", "CONVERSIONS")[0], "Buy Product Now - Special Discount Available");
}

#[test]
fn timing_is_fixed() {
    let timing = optimal_timing();
    assert_eq!(timing.best_days, vec!["Tuesday", "Wednesday", "Thursday"]);
    assert_eq!(timing.best_hours, vec!["9:00 AM", "1:00 PM", "7:00 PM"]);
    assert_eq!(timing.timezone, "Target audience timezone");
}

#[test]
fn recommendation_rounds_and_clamps() {
    let generated_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let scored = scored(scores(), 0.034567, 1.4);
    let recommendation =
        format_recommendation(&scored, &input("traffic"), generated_at).unwrap();

    assert_eq!(recommendation.platform_scores[&Platform::Facebook], 0.46);
    assert_eq!(recommendation.platform_scores[&Platform::LinkedIn], 0.33);
    assert_eq!(recommendation.performance_predictions.estimated_ctr, 0.0346);
    assert_eq!(recommendation.confidence_score, 1.0);
    assert_eq!(recommendation.generated_at, generated_at);
    assert_eq!(recommendation.source, PredictionSource::Model);
    assert_eq!(
        recommendation.ad_copy_suggestions[0],
        "Visit Our Website to Learn More About Analytics Suite"
    );
}

#[test]
fn non_finite_values_are_internal_errors() {
    let mut bad = scores();
    bad.insert(Platform::Twitter, f64::NAN);
    let mut campaign = scored(scores(), 0.02, 0.8);
    campaign.platform_scores = bad;

    let err = format_recommendation(&campaign, &input("awareness"), Utc::now()).unwrap_err();
    assert!(matches!(err, EngineError::Internal(_)));

    let mut campaign = scored(scores(), 0.02, 0.8);
    campaign.budget_allocation.insert(
        Platform::Google,
        BudgetShare {
            amount: f64::INFINITY,
            percentage: 10.0,
        },
    );
    assert!(format_recommendation(&campaign, &input("awareness"), Utc::now()).is_err());
}

#[test]
fn insights_describe_performance() {
    let lines = insights(&scored(scores(), 0.0275, 0.8), "traffic");

    assert!(lines[0].starts_with("Google is the strongest fit for traffic campaigns"));
    assert_eq!(lines[1], "Expected click-through rate of 2.75%.");
    assert_eq!(lines[2], "Projected 1,234 conversions.");
    assert_eq!(lines[3], "Estimated reach of 15,000 people.");
    assert_eq!(lines[4], "Around 50,000 impressions over the campaign.");
}

#[test]
fn response_serializes_with_platform_keys() {
    let recommendation =
        format_recommendation(&scored(scores(), 0.02, 0.8), &input("leads"), Utc::now()).unwrap();
    let value = serde_json::to_value(&recommendation).unwrap();

    assert_eq!(value["recommended_platform"], "Google");
    assert_eq!(value["source"], "model");
    assert!(value["platform_scores"]["LinkedIn"].is_number());
    assert!(value["budget_allocation"]["Facebook"]["percentage"].is_number());
    assert_eq!(value["performance_predictions"]["estimated_impressions"], 50_000);
}
