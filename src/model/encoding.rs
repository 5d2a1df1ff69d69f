use serde::{Deserialize, Serialize};

use crate::error::PredictionError;

/// Interest categories flagged by case-insensitive substring match.
pub const INTEREST_VOCABULARY: [&str; 7] = [
    "technology",
    "business",
    "fitness",
    "lifestyle",
    "health",
    "fashion",
    "education",
];

/// location, age group, objective, budget, interest count, then one flag
/// per interest category.
pub const FEATURE_COUNT: usize = 5 + INTEREST_VOCABULARY.len();

pub type FeatureRow = [f64; FEATURE_COUNT];

/// Maps category strings to dense indices. Classes are kept sorted, so the
/// index of a value does not depend on the order it was first seen in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn fit<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        Self::from_classes(values.into_iter().map(str::to_string).collect())
    }

    pub fn from_classes(mut classes: Vec<String>) -> Self {
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.classes.windows(2).all(|pair| pair[0] < pair[1])
    }

    pub fn transform(&self, column: &'static str, value: &str) -> Result<usize, PredictionError> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .map_err(|_| PredictionError::UnseenCategory {
                column,
                value: value.to_string(),
            })
    }

    pub fn inverse_transform(&self, index: usize) -> Result<&str, PredictionError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(PredictionError::UnknownLabel(index))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoders {
    pub location: LabelEncoder,
    pub age_group: LabelEncoder,
    pub objective: LabelEncoder,
}

/// Per-feature standardization fitted on training rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    /// Population standard deviation; constant columns get a scale of 1.
    pub fn fit(rows: &[FeatureRow]) -> Self {
        let count = rows.len().max(1) as f64;
        let mut mean = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for (acc, value) in mean.iter_mut().zip(row.iter()) {
                *acc += value;
            }
        }
        for value in mean.iter_mut() {
            *value /= count;
        }

        let mut variance = vec![0.0; FEATURE_COUNT];
        for row in rows {
            for (idx, value) in row.iter().enumerate() {
                let delta = value - mean[idx];
                variance[idx] += delta * delta;
            }
        }

        let scale = variance
            .iter()
            .map(|total| {
                let std = (total / count).sqrt();
                if std.is_finite() && std > 0.0 {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        Self { mean, scale }
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn is_consistent(&self) -> bool {
        self.mean.len() == self.scale.len()
            && self.scale.iter().all(|value| value.is_finite() && *value != 0.0)
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, PredictionError> {
        if row.len() != self.width() || self.scale.len() != self.width() {
            return Err(PredictionError::FeatureMismatch {
                expected: self.width(),
                actual: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(value, (mean, scale))| (value - mean) / scale)
            .collect())
    }
}

/// Campaign attributes in the numeric form the forests consume.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    pub location: usize,
    pub age_group: usize,
    pub objective: usize,
    pub budget: f64,
    pub interest_count: usize,
    pub interest_flags: [bool; INTEREST_VOCABULARY.len()],
}

impl FeatureVector {
    pub fn encode(
        encoders: &CategoricalEncoders,
        location: &str,
        age_group: &str,
        objective: &str,
        budget: f64,
        interests: &str,
    ) -> Result<Self, PredictionError> {
        if !budget.is_finite() {
            return Err(PredictionError::NonFinite("budget"));
        }

        Ok(Self {
            location: encoders.location.transform("location", location)?,
            age_group: encoders.age_group.transform("age_group", age_group)?,
            objective: encoders.objective.transform("objective", objective)?,
            budget,
            interest_count: interest_count(interests),
            interest_flags: interest_flags(interests),
        })
    }

    pub fn to_row(&self) -> FeatureRow {
        let mut row = [0.0; FEATURE_COUNT];
        row[0] = self.location as f64;
        row[1] = self.age_group as f64;
        row[2] = self.objective as f64;
        row[3] = self.budget;
        row[4] = self.interest_count as f64;
        for (slot, flag) in row[5..].iter_mut().zip(self.interest_flags.iter()) {
            *slot = if *flag { 1.0 } else { 0.0 };
        }
        row
    }
}

/// Number of `;`-separated entries. An empty string still counts as one,
/// matching how historical records were encoded.
pub fn interest_count(interests: &str) -> usize {
    interests.matches(';').count() + 1
}

pub fn interest_flags(interests: &str) -> [bool; INTEREST_VOCABULARY.len()] {
    let lowercase = interests.to_lowercase();
    INTEREST_VOCABULARY.map(|category| lowercase.contains(category))
}
