//! Offline fitting of the model bundle from historical campaign records.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::config::TrainingConfig;
use crate::error::TrainingError;
use crate::model::encoding::{
    CategoricalEncoders, FeatureRow, FeatureVector, LabelEncoder, StandardScaler,
};
use crate::model::forest::{ForestParams, RandomForestClassifier, RandomForestRegressor};
use crate::model::{TrainedModel, BUNDLE_VERSION, FEATURE_COUNT};
use crate::{Platform, DEFAULT_OBJECTIVE};

/// One historical campaign with its observed outcome; fields match the
/// campaign export columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    #[serde(default)]
    pub product_name: String,
    pub budget: f64,
    pub location: String,
    pub age_group: String,
    #[serde(default)]
    pub interests: String,
    pub objectives: String,
    pub recommended_platform: String,
    pub platform_score: f64,
    pub ctr_prediction: f64,
    pub conversion_prediction: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingReport {
    pub sample_count: usize,
    pub train_count: usize,
    pub test_count: usize,
    pub platform_accuracy: f64,
    pub score_mse: f64,
    pub ctr_mse: f64,
    pub conversion_mse: f64,
}

impl TrainingRecord {
    /// Serving encodes only the first objective, so training does the same.
    pub fn primary_objective(&self) -> &str {
        self.objectives
            .split(';')
            .map(str::trim)
            .find(|objective| !objective.is_empty())
            .unwrap_or(DEFAULT_OBJECTIVE)
    }
}

/// `.csv` files need a header row; anything else is read as a JSON array.
pub fn load_records(path: &Path) -> Result<Vec<TrainingRecord>, TrainingError> {
    let data = std::fs::read_to_string(path).map_err(|source| TrainingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }

    let is_csv = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        parse_csv_records(&data)
    } else {
        Ok(serde_json::from_str(&data)?)
    }
}

pub fn parse_csv_records(data: &str) -> Result<Vec<TrainingRecord>, TrainingError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let records = reader.deserialize().collect::<Result<Vec<TrainingRecord>, _>>()?;
    Ok(records)
}

pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn train(
        &self,
        records: &[TrainingRecord],
    ) -> Result<(TrainedModel, TrainingReport), TrainingError> {
        if records.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let platforms = records
            .iter()
            .enumerate()
            .map(|(index, record)| check_record(index, record))
            .collect::<Result<Vec<Platform>, _>>()?;

        let label_encoders = CategoricalEncoders {
            location: LabelEncoder::fit(records.iter().map(|record| record.location.as_str())),
            age_group: LabelEncoder::fit(records.iter().map(|record| record.age_group.as_str())),
            objective: LabelEncoder::fit(records.iter().map(TrainingRecord::primary_objective)),
        };
        let platform_encoder = LabelEncoder::fit(platforms.iter().map(|platform| platform.label()));

        let raw_rows = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                FeatureVector::encode(
                    &label_encoders,
                    &record.location,
                    &record.age_group,
                    record.primary_objective(),
                    record.budget,
                    &record.interests,
                )
                .map(|features| features.to_row())
                .map_err(|err| invalid(index, err))
            })
            .collect::<Result<Vec<FeatureRow>, _>>()?;

        let scaler = StandardScaler::fit(&raw_rows);
        let rows = raw_rows
            .iter()
            .enumerate()
            .map(|(index, row)| scaler.transform(row).map_err(|err| invalid(index, err)))
            .collect::<Result<Vec<Vec<f64>>, _>>()?;
        let classes = platforms
            .iter()
            .enumerate()
            .map(|(index, platform)| {
                platform_encoder
                    .transform("platform", platform.label())
                    .map_err(|err| invalid(index, err))
            })
            .collect::<Result<Vec<usize>, _>>()?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut order: Vec<usize> = (0..records.len()).collect();
        order.shuffle(&mut rng);
        let test_count = holdout_size(records.len(), self.config.test_fraction);
        let (test_idx, train_idx) = order.split_at(test_count);

        let train_rows: Vec<Vec<f64>> = train_idx.iter().map(|&idx| rows[idx].clone()).collect();
        let train_classes: Vec<usize> = train_idx.iter().map(|&idx| classes[idx]).collect();
        let train_targets = |target: fn(&TrainingRecord) -> f64| -> Vec<f64> {
            train_idx.iter().map(|&idx| target(&records[idx])).collect()
        };

        let params = ForestParams {
            n_estimators: self.config.n_estimators,
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
        };
        info!(
            records = records.len(),
            train = train_idx.len(),
            test = test_idx.len(),
            trees = params.n_estimators,
            max_depth = params.max_depth,
            "Training models"
        );

        let platform_classifier = RandomForestClassifier::fit(
            &train_rows,
            &train_classes,
            platform_encoder.len(),
            &params,
            &mut rng,
        );
        let score_regressor = RandomForestRegressor::fit(
            &train_rows,
            &train_targets(|r| r.platform_score),
            &params,
            &mut rng,
        );
        let ctr_regressor = RandomForestRegressor::fit(
            &train_rows,
            &train_targets(|r| r.ctr_prediction),
            &params,
            &mut rng,
        );
        let conversion_regressor = RandomForestRegressor::fit(
            &train_rows,
            &train_targets(|r| r.conversion_prediction),
            &params,
            &mut rng,
        );

        let model = TrainedModel {
            version: BUNDLE_VERSION,
            is_trained: true,
            feature_count: FEATURE_COUNT,
            platform_classifier,
            score_regressor,
            ctr_regressor,
            conversion_regressor,
            label_encoders,
            platform_encoder,
            scaler,
        };

        let report = evaluate(&model, &rows, &classes, records, test_idx, train_idx.len())?;
        if report.test_count == 0 {
            warn!("Too few records for a holdout set; metrics are not meaningful");
        }
        info!(
            accuracy = report.platform_accuracy,
            score_mse = report.score_mse,
            ctr_mse = report.ctr_mse,
            conversion_mse = report.conversion_mse,
            "Training completed"
        );

        Ok((model, report))
    }
}

fn check_record(index: usize, record: &TrainingRecord) -> Result<Platform, TrainingError> {
    let numeric = [
        record.budget,
        record.platform_score,
        record.ctr_prediction,
        record.conversion_prediction,
    ];
    if numeric.iter().any(|value| !value.is_finite()) {
        return Err(invalid(index, "numeric fields must be finite"));
    }
    if record.budget < 0.0 {
        return Err(invalid(index, "budget must not be negative"));
    }
    Platform::from_label(&record.recommended_platform)
        .ok_or_else(|| invalid(index, format!("unknown platform {}", record.recommended_platform)))
}

fn holdout_size(total: usize, fraction: f64) -> usize {
    if total < 2 {
        return 0;
    }
    let fraction = if fraction.is_finite() { fraction.clamp(0.0, 0.9) } else { 0.0 };
    ((total as f64 * fraction).ceil() as usize).min(total - 1)
}

fn evaluate(
    model: &TrainedModel,
    rows: &[Vec<f64>],
    classes: &[usize],
    records: &[TrainingRecord],
    test_idx: &[usize],
    train_count: usize,
) -> Result<TrainingReport, TrainingError> {
    let mut correct = 0usize;
    let (mut score_se, mut ctr_se, mut conversion_se) = (0.0, 0.0, 0.0);

    for &idx in test_idx {
        let row = &rows[idx];
        let record = &records[idx];
        let (predicted, _) = model
            .platform_classifier
            .predict(row)
            .map_err(|err| invalid(idx, err))?;
        if predicted == classes[idx] {
            correct += 1;
        }
        score_se += squared_error(&model.score_regressor, row, record.platform_score, idx)?;
        ctr_se += squared_error(&model.ctr_regressor, row, record.ctr_prediction, idx)?;
        conversion_se += squared_error(
            &model.conversion_regressor,
            row,
            record.conversion_prediction,
            idx,
        )?;
    }

    let count = test_idx.len().max(1) as f64;
    Ok(TrainingReport {
        sample_count: records.len(),
        train_count,
        test_count: test_idx.len(),
        platform_accuracy: correct as f64 / count,
        score_mse: score_se / count,
        ctr_mse: ctr_se / count,
        conversion_mse: conversion_se / count,
    })
}

fn squared_error(
    regressor: &RandomForestRegressor,
    row: &[f64],
    actual: f64,
    idx: usize,
) -> Result<f64, TrainingError> {
    let predicted = regressor.predict(row).map_err(|err| invalid(idx, err))?;
    Ok((predicted - actual).powi(2))
}

fn invalid(index: usize, reason: impl ToString) -> TrainingError {
    TrainingError::InvalidRecord {
        index,
        reason: reason.to_string(),
    }
}
