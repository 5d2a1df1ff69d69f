use std::collections::BTreeMap;

use crate::{round_to, BudgetAllocation, BudgetShare, Platform};

// Amounts follow the rounded percentage, so totals can drift by a fraction
// of a percent.
pub fn allocate(weights: &BTreeMap<Platform, f64>, budget: f64) -> BudgetAllocation {
    let total: f64 = weights.values().copied().filter(|w| usable(*w)).sum();

    weights
        .iter()
        .map(|(&platform, &weight)| {
            let share = if total > 0.0 && usable(weight) {
                weight / total
            } else {
                0.0
            };
            let percentage = round_to(share * 100.0, 1);
            let amount = round_to(budget * (percentage / 100.0), 2);
            (platform, BudgetShare { amount, percentage })
        })
        .collect()
}

pub fn objective_weight(platform: Platform, objective: &str) -> f64 {
    let objective = objective.trim().to_lowercase();
    objective_row(platform)
        .iter()
        .find(|(key, _)| *key == objective)
        .map(|(_, weight)| *weight)
        .unwrap_or_else(|| default_weight(platform))
}

pub fn objective_weights(objective: &str) -> BTreeMap<Platform, f64> {
    Platform::ALL
        .iter()
        .map(|&platform| (platform, objective_weight(platform, objective)))
        .collect()
}

fn objective_row(platform: Platform) -> &'static [(&'static str, f64)] {
    match platform {
        Platform::Facebook => &[
            ("awareness", 0.4),
            ("engagement", 0.45),
            ("traffic", 0.3),
            ("leads", 0.2),
            ("conversions", 0.25),
        ],
        Platform::Google => &[
            ("awareness", 0.3),
            ("engagement", 0.25),
            ("traffic", 0.5),
            ("leads", 0.4),
            ("conversions", 0.35),
        ],
        Platform::Instagram => &[
            ("awareness", 0.2),
            ("engagement", 0.2),
            ("traffic", 0.25),
            ("leads", 0.15),
            ("conversions", 0.35),
        ],
        Platform::LinkedIn => &[
            ("awareness", 0.05),
            ("engagement", 0.05),
            ("traffic", 0.1),
            ("leads", 0.4),
            ("conversions", 0.1),
        ],
        Platform::Twitter => &[
            ("awareness", 0.05),
            ("engagement", 0.05),
            ("traffic", 0.05),
            ("leads", 0.05),
            ("conversions", 0.05),
        ],
    }
}

fn default_weight(platform: Platform) -> f64 {
    match platform {
        Platform::Facebook => 0.25,
        Platform::Google => 0.3,
        Platform::Instagram => 0.2,
        Platform::LinkedIn => 0.15,
        Platform::Twitter => 0.1,
    }
}

fn usable(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}
