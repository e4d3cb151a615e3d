//! Exhaustive grid search with k-fold cross-validation.
//!
//! Candidates are scored by negative mean squared error over contiguous
//! folds of the training set; the best configuration is returned for the
//! caller to refit on the full training set. Fold evaluation fans out over
//! rayon — every (candidate, fold) pair is independent.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::gbt::GbtParams;
use crate::models::matrix::FeatureMatrix;
use crate::models::traits::{ModelError, Result, TabularRegressor};

/// Candidate values per hyperparameter; the search expands the full
/// cartesian product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub n_trees: Vec<usize>,
    pub learning_rate: Vec<f64>,
    pub max_depth: Vec<usize>,
    pub subsample: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            n_trees: vec![50, 100, 150, 200],
            learning_rate: vec![0.01, 0.05, 0.1, 0.2],
            max_depth: vec![2, 3, 4, 5],
            subsample: vec![0.7, 0.8, 0.9, 1.0],
        }
    }
}

impl ParamGrid {
    /// A single-candidate grid, useful for tests and quick runs.
    pub fn single(params: &GbtParams) -> Self {
        Self {
            n_trees: vec![params.n_trees],
            learning_rate: vec![params.learning_rate],
            max_depth: vec![params.max_depth],
            subsample: vec![params.subsample],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.n_trees.is_empty()
            || self.learning_rate.is_empty()
            || self.max_depth.is_empty()
            || self.subsample.is_empty()
    }

    /// Expand to the full cartesian product, in deterministic order.
    pub fn expand(&self) -> Vec<GbtParams> {
        let mut out = Vec::new();
        for &n_trees in &self.n_trees {
            for &learning_rate in &self.learning_rate {
                for &max_depth in &self.max_depth {
                    for &subsample in &self.subsample {
                        out.push(GbtParams {
                            n_trees,
                            learning_rate,
                            max_depth,
                            subsample,
                        });
                    }
                }
            }
        }
        out
    }
}

/// Select the best configuration by k-fold cross-validated negative MSE.
///
/// Candidates that fail to fit on any fold are discarded. Ties keep the
/// earliest candidate in grid expansion order, so the result is
/// deterministic.
pub fn grid_search(
    model: &dyn TabularRegressor,
    x: &FeatureMatrix,
    y: &[f64],
    grid: &ParamGrid,
    cv_folds: usize,
) -> Result<GbtParams> {
    if grid.is_empty() {
        return Err(ModelError::EmptyGrid);
    }
    if cv_folds < 2 {
        return Err(ModelError::InvalidParameter(
            "cv_folds must be at least 2".into(),
        ));
    }
    let n = y.len();
    if x.n_rows() != n {
        return Err(ModelError::DimensionMismatch {
            expected: x.n_rows(),
            got: n,
        });
    }
    if n < cv_folds {
        return Err(ModelError::InsufficientData {
            needed: cv_folds,
            got: n,
        });
    }

    let candidates = grid.expand();
    let folds = fold_bounds(n, cv_folds);

    // One job per (candidate, fold); a failed fit poisons its candidate.
    let jobs: Vec<(usize, usize)> = (0..candidates.len())
        .flat_map(|ci| (0..folds.len()).map(move |fi| (ci, fi)))
        .collect();

    let fold_errors: Vec<(usize, Option<(f64, usize)>)> = jobs
        .par_iter()
        .map(|&(ci, fi)| {
            let (start, end) = folds[fi];
            (ci, eval_fold(model, x, y, &candidates[ci], start, end))
        })
        .collect();

    let mut sse = vec![Some((0.0, 0usize)); candidates.len()];
    for (ci, result) in fold_errors {
        match (&mut sse[ci], result) {
            (Some((acc_sse, acc_n)), Some((fold_sse, fold_n))) => {
                *acc_sse += fold_sse;
                *acc_n += fold_n;
            }
            (slot, None) => *slot = None,
            (None, _) => {}
        }
    }

    let mut best: Option<(f64, usize)> = None;
    for (ci, slot) in sse.iter().enumerate() {
        if let Some((total_sse, total_n)) = slot {
            let score = -(total_sse / *total_n as f64); // neg MSE, higher is better
            if best.map_or(true, |(b, _)| score > b) {
                best = Some((score, ci));
            }
        }
    }

    match best {
        Some((_, ci)) => Ok(candidates[ci].clone()),
        None => Err(ModelError::Computation(
            "no grid candidate could be fitted".into(),
        )),
    }
}

/// Contiguous fold boundaries `[start, end)` covering `0..n`.
fn fold_bounds(n: usize, k: usize) -> Vec<(usize, usize)> {
    (0..k).map(|f| (f * n / k, (f + 1) * n / k)).collect()
}

/// Fit on everything outside `[start, end)`, score squared error inside it.
fn eval_fold(
    model: &dyn TabularRegressor,
    x: &FeatureMatrix,
    y: &[f64],
    params: &GbtParams,
    start: usize,
    end: usize,
) -> Option<(f64, usize)> {
    let train_idx: Vec<usize> = (0..y.len()).filter(|i| *i < start || *i >= end).collect();
    let test_idx: Vec<usize> = (start..end).collect();
    if train_idx.is_empty() || test_idx.is_empty() {
        return None;
    }

    let x_train = x.take_rows(&train_idx);
    let y_train: Vec<f64> = train_idx.iter().map(|&i| y[i]).collect();
    let fitted = model.fit(&x_train, &y_train, params).ok()?;

    let x_test = x.take_rows(&test_idx);
    let preds = fitted.predict(&x_test);
    let sse: f64 = test_idx
        .iter()
        .zip(&preds)
        .map(|(&i, p)| (y[i] - p) * (y[i] - p))
        .sum();
    sse.is_finite().then_some((sse, test_idx.len()))
}
