use campaign_advisor::model::ModelManager;
use campaign_advisor::scoring::{
    allocate, argmax, normalize_by_max, objective_weights, RandomSource, RuleBasedScorer,
};
use campaign_advisor::{
    round_to, CampaignInput, Platform, PlatformScores, PredictionSource, RecommendationEngine,
    TargetAudience,
};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn campaign(product_name: &str, budget: f64) -> CampaignInput {
    CampaignInput {
        product_name: product_name.to_string(),
        budget,
        ..CampaignInput::default()
    }
}

fn seeded_engine(seed: u64) -> RecommendationEngine {
    RecommendationEngine::new(ModelManager::unloaded(), RandomSource::Seeded(seed))
}

#[test]
fn tech_product_prefers_search() {
    let scorer = RuleBasedScorer::default();
    let mut rng = StdRng::seed_from_u64(7);
    let scored = scorer.score(&campaign("CloudTech CRM Software", 5000.0), &mut rng);

    assert_eq!(scored.source, PredictionSource::Heuristic);
    assert_eq!(scored.recommended_platform, Platform::Google);
    assert_eq!(scored.platform_scores[&Platform::Google], 1.0);
    let linkedin = scored.platform_scores[&Platform::LinkedIn];
    assert!(linkedin > 0.85 && linkedin < 0.9, "linkedin score {}", linkedin);
    assert_eq!(scored.performance.estimated_reach, 2_000_000);
    assert_eq!(scored.performance.estimated_ctr, 0.025);
    assert!(scored.performance.estimated_impressions.is_none());
}

#[test]
fn lifestyle_product_prefers_social() {
    let scorer = RuleBasedScorer::default();
    let scores = scorer.platform_scores("Organic Food Delivery");

    assert_eq!(argmax(&scores), Some(Platform::Facebook));
    assert_eq!(scores[&Platform::Facebook], 1.0);
    assert!(scores[&Platform::Google] > 0.6 && scores[&Platform::Google] < 0.65);
}

#[test]
fn neutral_product_breaks_ties_in_platform_order() {
    let scores = RuleBasedScorer::default().platform_scores("Garden Hose");

    assert_eq!(scores[&Platform::Facebook], 1.0);
    assert_eq!(scores[&Platform::Google], 1.0);
    assert_eq!(argmax(&scores), Some(Platform::Facebook));
}

#[test]
fn scores_are_bounded_and_top_is_one() {
    let scorer = RuleBasedScorer::default();
    for name in ["CloudTech CRM Software", "Fashion Tech B2B", "Garden Hose", ""] {
        let scores = scorer.platform_scores(name);
        assert_eq!(scores.len(), Platform::ALL.len());
        assert!(scores.values().all(|score| (0.0..=1.0).contains(score)));
        let top = argmax(&scores).unwrap();
        assert_eq!(scores[&top], 1.0, "{}", name);
    }
}

#[test]
fn heuristic_draws_stay_in_range() {
    let scorer = RuleBasedScorer::default();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..200 {
        let scored = scorer.score(&campaign("Widget", 1000.0), &mut rng);
        assert!((50..=500).contains(&scored.performance.estimated_conversions));
        assert!(scored.confidence_score >= 0.75 && scored.confidence_score <= 0.95);
    }
}

#[test]
fn allocation_sums_to_budget_within_one_percent() {
    let scorer = RuleBasedScorer::default();
    let campaigns = [
        ("CloudTech CRM Software", 5000.0),
        ("Garden Hose", 333.33),
        ("Food Blog", 100.0),
    ];
    for (name, budget) in campaigns {
        let scores = scorer.platform_scores(name);
        let allocation = allocate(&scores, budget);
        let total: f64 = allocation.values().map(|share| share.amount).sum();
        let percent: f64 = allocation.values().map(|share| share.percentage).sum();

        assert!((total - budget).abs() <= budget * 0.01, "{} sums to {}", name, total);
        assert!((percent - 100.0).abs() <= 1.0);
    }
}

#[test]
fn zero_budget_allocates_nothing() {
    let allocation = allocate(&objective_weights("awareness"), 0.0);
    assert!(allocation.values().all(|share| share.amount == 0.0));
    let percent: f64 = allocation.values().map(|share| share.percentage).sum();
    assert!((percent - 100.0).abs() <= 1.0);
}

#[test]
fn huge_budgets_stay_finite() {
    for budget in [1e307, f64::MAX] {
        let recommendation = seeded_engine(2)
            .recommend(&json!({ "product_name": "Widget", "budget": budget }))
            .unwrap();

        assert!(recommendation
            .budget_allocation
            .values()
            .all(|share| share.amount.is_finite() && share.amount <= budget));
        assert_eq!(recommendation.performance_predictions.estimated_reach, u64::MAX);
    }

    let allocation = allocate(&objective_weights("traffic"), f64::MAX);
    assert!(allocation.values().all(|share| share.amount.is_finite()));
}

#[test]
fn rounding_leaves_large_values_untouched() {
    assert_eq!(round_to(1e300, 2), 1e300);
    assert_eq!(round_to(f64::MAX, 1), f64::MAX);
    assert_eq!(round_to(1234.5678, 2), 1234.57);
}

#[test]
fn objective_weights_follow_the_objective() {
    assert_eq!(argmax(&objective_weights("traffic")), Some(Platform::Google));
    assert_eq!(argmax(&objective_weights("Engagement")), Some(Platform::Facebook));
    let fallback = objective_weights("brand lift");
    assert_eq!(fallback[&Platform::Google], 0.3);
    assert_eq!(fallback[&Platform::Twitter], 0.1);
}

#[test]
fn normalize_handles_all_zero_scores() {
    let scores: PlatformScores = Platform::ALL.iter().map(|&platform| (platform, 0.0)).collect();
    let normalized = normalize_by_max(&scores);
    assert!(normalized.values().all(|score| *score == 0.0));
}

#[test]
fn seeded_engine_is_deterministic_per_campaign() {
    let payload = json!({
        "product_name": "CloudTech CRM Software",
        "budget": 5000,
        "target_audience": { "age_group": "25-34", "interests": ["technology", "business"] },
        "objectives": ["leads"]
    });

    let first = seeded_engine(11).recommend(&payload).unwrap();
    let second = seeded_engine(11).recommend(&payload).unwrap();

    assert_eq!(first.performance_predictions, second.performance_predictions);
    assert_eq!(first.confidence_score, second.confidence_score);
    assert_eq!(first.platform_scores, second.platform_scores);
    assert_eq!(first.budget_allocation, second.budget_allocation);
}

#[test]
fn custom_baseline_changes_recommendation() {
    let baseline: PlatformScores = [
        (Platform::Facebook, 0.1),
        (Platform::Google, 0.1),
        (Platform::Instagram, 0.1),
        (Platform::LinkedIn, 0.1),
        (Platform::Twitter, 0.9),
    ]
    .into_iter()
    .collect();
    let engine = seeded_engine(1).with_scorer(RuleBasedScorer::new(baseline));

    let input = CampaignInput {
        target_audience: TargetAudience::default(),
        ..campaign("Garden Hose", 100.0)
    };
    assert_eq!(engine.score(&input).recommended_platform, Platform::Twitter);
}
