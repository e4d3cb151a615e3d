//! Pipeline runner — wires together splitting, per-entity model fits, and
//! metrics.
//!
//! Two entry points:
//! - `run_univariate()`: one forecaster fit per entity on its training
//!   slice, evaluated against the test year. Used by `evaluate`.
//! - `forecast_future()`: fits on each entity's full history and predicts an
//!   unseen future year (no truth available). Used by `forecast`.
//!
//! The tabular variant lives in `crate::tabular` and shares the result types
//! defined here.

use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use epicast_core::models::{GbtParams, ModelError, UnivariateForecaster};
use epicast_core::split::{split, SplitError};
use epicast_core::CombinedDataset;

use crate::metrics::{evaluate, MetricsError, MetricsSummary};

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Which modeling strategy produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Univariate,
    Tabular,
}

/// One entity's forecast paired with its true outcome when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub entity_id: String,
    pub predicted: f64,
    /// Absent when forecasting an unseen future year.
    pub actual: Option<f64>,
}

/// Why an entity produced no prediction. Skips are data, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkipReason {
    NoTrainingData,
    NoTestData,
    FitFailed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntity {
    pub entity_id: String,
    pub reason: SkipReason,
}

/// Complete result of one evaluation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub variant: Variant,
    pub predictions: Vec<PredictionRecord>,
    pub skipped: Vec<SkippedEntity>,
    pub metrics: MetricsSummary,
    /// Total wall-clock model-fit time across all entities (or the single
    /// global search + refit, for the tabular variant).
    pub fit_seconds: f64,
    pub train_cutoff_year: i32,
    pub test_year: i32,
    /// Distinct entities in the dataset, including skipped ones.
    pub entity_count: usize,
    pub dataset_hash: String,
    pub timestamp: DateTime<Utc>,
    /// Winning grid configuration (tabular variant only).
    pub best_params: Option<GbtParams>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Predictions for a future year with no observed outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FutureForecast {
    pub target_year: i32,
    pub predictions: Vec<PredictionRecord>,
    pub skipped: Vec<SkippedEntity>,
    pub fit_seconds: f64,
    pub dataset_hash: String,
}

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("split error: {0}")]
    Split(#[from] SplitError),
    #[error("model error: {0}")]
    Model(#[from] ModelError),
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),
    #[error("target year {target_year} is not after the last observed year {last_year}")]
    TargetYearNotInFuture { target_year: i32, last_year: i32 },
}

enum EntityOutcome {
    Predicted(PredictionRecord),
    Skipped(SkippedEntity),
}

/// Fit one forecaster per entity and evaluate against the test year.
///
/// Entities with an empty training or test slice are skipped, as are
/// entities whose model fit fails — neither aborts the run. The run is fatal
/// only when *no* entity yields a prediction, since metrics over an empty
/// set cannot be produced.
pub fn run_univariate(
    dataset: &CombinedDataset,
    train_cutoff_year: i32,
    test_year: i32,
    model: &dyn UnivariateForecaster,
) -> Result<RunResult, RunError> {
    let partition = split(dataset, train_cutoff_year, test_year)?;
    let entities = dataset.entities();

    let start = Instant::now();
    let outcomes: Vec<EntityOutcome> = entities
        .par_iter()
        .map(|entity| {
            let series = partition.train_outcomes(entity);
            if series.is_empty() {
                return EntityOutcome::Skipped(SkippedEntity {
                    entity_id: entity.clone(),
                    reason: SkipReason::NoTrainingData,
                });
            }
            let test = match partition.test_record(entity) {
                Some(rec) => rec,
                None => {
                    return EntityOutcome::Skipped(SkippedEntity {
                        entity_id: entity.clone(),
                        reason: SkipReason::NoTestData,
                    })
                }
            };
            match model.fit_and_forecast(&series, 1) {
                Ok(predicted) => EntityOutcome::Predicted(PredictionRecord {
                    entity_id: entity.clone(),
                    predicted,
                    actual: Some(test.outcome),
                }),
                Err(e) => EntityOutcome::Skipped(SkippedEntity {
                    entity_id: entity.clone(),
                    reason: SkipReason::FitFailed(e.to_string()),
                }),
            }
        })
        .collect();
    let fit_seconds = start.elapsed().as_secs_f64();

    let (predictions, skipped) = partition_outcomes(outcomes);

    let y_true: Vec<f64> = predictions.iter().filter_map(|p| p.actual).collect();
    let y_pred: Vec<f64> = predictions.iter().map(|p| p.predicted).collect();
    let metrics = evaluate(&y_true, &y_pred)?;

    Ok(RunResult {
        schema_version: SCHEMA_VERSION,
        variant: Variant::Univariate,
        predictions,
        skipped,
        metrics,
        fit_seconds,
        train_cutoff_year,
        test_year,
        entity_count: entities.len(),
        dataset_hash: dataset.fingerprint(),
        timestamp: Utc::now(),
        best_params: None,
    })
}

/// Fit on each entity's full history and predict `target_year`.
///
/// The forecast horizon is the gap between `target_year` and the last
/// observed year; a target inside the observed range is rejected.
pub fn forecast_future(
    dataset: &CombinedDataset,
    target_year: i32,
    model: &dyn UnivariateForecaster,
) -> Result<FutureForecast, RunError> {
    let last_year = dataset.years().last().copied().unwrap_or(target_year);
    if target_year <= last_year {
        return Err(RunError::TargetYearNotInFuture {
            target_year,
            last_year,
        });
    }
    let horizon = (target_year - last_year) as usize;
    let entities = dataset.entities();

    let start = Instant::now();
    let outcomes: Vec<EntityOutcome> = entities
        .par_iter()
        .map(|entity| {
            let series: Vec<f64> = dataset
                .records()
                .iter()
                .filter(|r| &r.entity_id == entity)
                .map(|r| r.outcome)
                .collect();
            match model.fit_and_forecast(&series, horizon) {
                Ok(predicted) => EntityOutcome::Predicted(PredictionRecord {
                    entity_id: entity.clone(),
                    predicted,
                    actual: None,
                }),
                Err(e) => EntityOutcome::Skipped(SkippedEntity {
                    entity_id: entity.clone(),
                    reason: SkipReason::FitFailed(e.to_string()),
                }),
            }
        })
        .collect();
    let fit_seconds = start.elapsed().as_secs_f64();

    let (predictions, skipped) = partition_outcomes(outcomes);

    Ok(FutureForecast {
        target_year,
        predictions,
        skipped,
        fit_seconds,
        dataset_hash: dataset.fingerprint(),
    })
}

/// Split outcomes into predictions and skips, preserving entity order.
fn partition_outcomes(
    outcomes: Vec<EntityOutcome>,
) -> (Vec<PredictionRecord>, Vec<SkippedEntity>) {
    let mut predictions = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            EntityOutcome::Predicted(p) => predictions.push(p),
            EntityOutcome::Skipped(s) => skipped.push(s),
        }
    }
    (predictions, skipped)
}
