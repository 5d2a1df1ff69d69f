use chrono::{DateTime, Utc};

use crate::error::EngineError;
use crate::{
    format_number, format_percent, round_to, BudgetAllocation, BudgetShare, CampaignInput,
    OptimalTiming, PerformancePrediction, Platform, PlatformScores, Recommendation,
    ScoredCampaign,
};

pub fn format_recommendation(
    scored: &ScoredCampaign,
    input: &CampaignInput,
    generated_at: DateTime<Utc>,
) -> Result<Recommendation, EngineError> {
    let objective = input.primary_objective();

    Ok(Recommendation {
        recommended_platform: scored.recommended_platform,
        platform_scores: format_scores(&scored.platform_scores)?,
        budget_allocation: format_allocation(&scored.budget_allocation)?,
        ad_copy_suggestions: ad_copy(&input.product_name, objective),
        optimal_timing: optimal_timing(),
        performance_predictions: format_performance(&scored.performance)?,
        confidence_score: round_to(
            finite("confidence score", scored.confidence_score)?.clamp(0.0, 1.0),
            2,
        ),
        insights: insights(scored, objective),
        source: scored.source,
        generated_at,
    })
}

pub fn ad_copy(product_name: &str, objective: &str) -> Vec<String> {
    let product = if product_name.trim().is_empty() {
        "Product"
    } else {
        product_name.trim()
    };

    match objective.trim().to_lowercase().as_str() {
        "traffic" => vec![
            format!("Visit Our Website to Learn More About {}", product),
            format!("Click Here to Explore {} Features", product),
            format!("Get Details About {} - Click Now", product),
        ],
        "leads" => vec![
            format!("Get Your Free {} Demo Today", product),
            format!("Sign Up for {} - Free Trial Available", product),
            format!("Request Information About {}", product),
        ],
        "conversions" => vec![
            format!("Buy {} Now - Special Discount Available", product),
            format!("Order {} Today - Fast Shipping", product),
            format!("Get {} - 30% Off This Week", product),
        ],
        _ => vec![
            format!("Discover the amazing {} - Now Available!", product),
            format!("Introducing {} - Revolutionary Innovation", product),
            format!("Don't Miss Out on {} - Limited Time", product),
        ],
    }
}

pub fn optimal_timing() -> OptimalTiming {
    OptimalTiming {
        best_days: ["Tuesday", "Wednesday", "Thursday"].map(String::from).to_vec(),
        best_hours: ["9:00 AM", "1:00 PM", "7:00 PM"].map(String::from).to_vec(),
        timezone: "Target audience timezone".to_string(),
        frequency: "Show ads 3-4 times per day per user".to_string(),
    }
}

pub fn insights(scored: &ScoredCampaign, objective: &str) -> Vec<String> {
    let performance = &scored.performance;
    let mut insights = vec![
        format!(
            "{} is the strongest fit for {} campaigns: {}.",
            scored.recommended_platform.label(),
            objective,
            platform_rationale(scored.recommended_platform, objective)
        ),
        format!(
            "Expected click-through rate of {}.",
            format_percent(performance.estimated_ctr, 2)
        ),
        format!(
            "Projected {} conversions.",
            format_number(performance.estimated_conversions as f64)
        ),
        format!(
            "Estimated reach of {} people.",
            format_number(performance.estimated_reach as f64)
        ),
    ];
    if let Some(impressions) = performance.estimated_impressions {
        insights.push(format!(
            "Around {} impressions over the campaign.",
            format_number(impressions as f64)
        ));
    }
    insights
}

fn platform_rationale(platform: Platform, objective: &str) -> &'static str {
    match (platform, objective.trim().to_lowercase().as_str()) {
        (Platform::Google, "traffic") | (Platform::Google, "conversions") => {
            "search ads capture people already looking for products like this"
        }
        (Platform::LinkedIn, "leads") => "professional targeting reaches decision makers directly",
        (Platform::Facebook, "awareness") | (Platform::Instagram, "awareness") => {
            "broad feed placements build reach at a low cost per impression"
        }
        (Platform::Facebook, "engagement") | (Platform::Instagram, "engagement") => {
            "feed and story formats invite reactions and shares"
        }
        (Platform::Google, _) => "intent-driven search and display inventory",
        (Platform::LinkedIn, _) => "audiences segmented by industry and job function",
        (Platform::Facebook, _) => "detailed interest targeting across a large audience",
        (Platform::Instagram, _) => "visual formats suited to lifestyle and consumer products",
        (Platform::Twitter, _) => "real-time conversation around trending topics",
    }
}

fn format_scores(scores: &PlatformScores) -> Result<PlatformScores, EngineError> {
    scores
        .iter()
        .map(|(&platform, &score)| Ok((platform, round_to(finite("platform score", score)?, 2))))
        .collect()
}

fn format_allocation(allocation: &BudgetAllocation) -> Result<BudgetAllocation, EngineError> {
    allocation
        .iter()
        .map(|(&platform, share)| {
            Ok((
                platform,
                BudgetShare {
                    amount: round_to(finite("allocation amount", share.amount)?, 2),
                    percentage: round_to(finite("allocation percentage", share.percentage)?, 1),
                },
            ))
        })
        .collect()
}

fn format_performance(
    performance: &PerformancePrediction,
) -> Result<PerformancePrediction, EngineError> {
    Ok(PerformancePrediction {
        estimated_ctr: round_to(finite("ctr", performance.estimated_ctr)?, 4),
        ..performance.clone()
    })
}

fn finite(field: &str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::Internal(format!("{} is not a finite number", field)))
    }
}
