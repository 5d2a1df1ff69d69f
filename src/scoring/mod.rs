pub mod allocation;
pub mod heuristic;
pub mod random;

pub use allocation::{allocate, objective_weight, objective_weights};
pub use heuristic::RuleBasedScorer;
pub use random::RandomSource;

use crate::{round_to, Platform, PlatformScores};

pub fn normalize_by_max(scores: &PlatformScores) -> PlatformScores {
    let max = scores
        .values()
        .copied()
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);

    scores
        .iter()
        .map(|(&platform, &value)| {
            let normalized = if max > 0.0 && value.is_finite() {
                round_to(value / max, 2)
            } else {
                0.0
            };
            (platform, normalized)
        })
        .collect()
}

pub fn argmax(scores: &PlatformScores) -> Option<Platform> {
    let mut best: Option<(Platform, f64)> = None;
    for (&platform, &value) in scores {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((platform, value)),
        }
    }
    best.map(|(platform, _)| platform)
}
