//! Regression metrics — pure functions that score a prediction pass.
//!
//! Every metric is a pure function: true and predicted values in, scalar out.
//! `evaluate` computes the whole battery from the identical pair in one pass;
//! nothing is cached across calls.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    #[error("length mismatch: {expected} true values vs {got} predictions")]
    LengthMismatch { expected: usize, got: usize },

    #[error("cannot compute metrics over empty inputs")]
    EmptyInput,
}

/// The fixed metric battery for one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
    pub explained_variance: f64,
    pub mae: f64,
    pub median_ae: f64,
}

/// Compute all six metrics from parallel true/predicted sequences.
///
/// Fails with `LengthMismatch` on unequal lengths and `EmptyInput` when
/// either side is empty — a summary over nothing is meaningless.
pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<MetricsSummary, MetricsError> {
    if y_true.len() != y_pred.len() {
        return Err(MetricsError::LengthMismatch {
            expected: y_true.len(),
            got: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(MetricsError::EmptyInput);
    }

    let mse = mean_squared_error(y_true, y_pred);
    Ok(MetricsSummary {
        mse,
        rmse: mse.sqrt(),
        r2: r2_score(y_true, y_pred),
        explained_variance: explained_variance_score(y_true, y_pred),
        mae: mean_absolute_error(y_true, y_pred),
        median_ae: median_absolute_error(y_true, y_pred),
    })
}

// ─── Individual metric functions ────────────────────────────────────
//
// All assume validated input: equal lengths, at least one element.

/// Mean of squared residuals.
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum::<f64>()
        / y_true.len() as f64
}

/// Coefficient of determination: 1 - SS_res / SS_tot.
///
/// For a constant true series (SS_tot = 0): 1.0 on a perfect fit, 0.0
/// otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let mean = mean(y_true);
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean) * (t - mean)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p) * (t - p))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Explained variance: 1 - Var(residuals) / Var(y_true).
///
/// Differs from r2 when residuals have non-zero mean (a biased model).
pub fn explained_variance_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let residuals: Vec<f64> = y_true.iter().zip(y_pred).map(|(t, p)| t - p).collect();
    let var_res = population_variance(&residuals);
    let var_true = population_variance(y_true);

    if var_true == 0.0 {
        return if var_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - var_res / var_true
}

/// Mean of absolute residuals.
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

/// Median of absolute residuals (mean of the middle two for even counts).
pub fn median_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let mut abs_errors: Vec<f64> = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .collect();
    abs_errors.sort_by(|a, b| a.total_cmp(b));

    let n = abs_errors.len();
    if n % 2 == 1 {
        abs_errors[n / 2]
    } else {
        (abs_errors[n / 2 - 1] + abs_errors[n / 2]) / 2.0
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn population_variance(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Validation ──

    #[test]
    fn length_mismatch_rejected() {
        let err = evaluate(&[1.0, 2.0], &[1.0]).unwrap_err();
        assert_eq!(err, MetricsError::LengthMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn empty_input_rejected() {
        assert_eq!(evaluate(&[], &[]).unwrap_err(), MetricsError::EmptyInput);
    }

    // ── Perfect prediction ──

    #[test]
    fn perfect_prediction_is_exact() {
        let y = vec![41.0, 12.0, 7.5, 99.0];
        let m = evaluate(&y, &y).unwrap();
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.explained_variance, 1.0);
        assert_eq!(m.mae, 0.0);
        assert_eq!(m.median_ae, 0.0);
    }

    #[test]
    fn perfect_prediction_on_constant_series() {
        let y = vec![5.0, 5.0, 5.0];
        let m = evaluate(&y, &y).unwrap();
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.explained_variance, 1.0);
    }

    // ── Known values ──

    #[test]
    fn mse_and_rmse_known() {
        // Errors: 1, -1, 2 → squared 1, 1, 4 → mse = 2
        let m = evaluate(&[3.0, 3.0, 3.0], &[2.0, 4.0, 1.0]).unwrap();
        assert!((m.mse - 2.0).abs() < 1e-12);
        assert!((m.rmse - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn mae_and_median_known() {
        // Abs errors: 1, 1, 2, 10 → mae = 3.5, median = 1.5
        let m = evaluate(&[0.0, 0.0, 0.0, 0.0], &[1.0, -1.0, 2.0, 10.0]).unwrap();
        assert!((m.mae - 3.5).abs() < 1e-12);
        assert!((m.median_ae - 1.5).abs() < 1e-12);
    }

    #[test]
    fn median_odd_count() {
        // Abs errors: 1, 2, 5 → median = 2
        assert_eq!(
            median_absolute_error(&[0.0, 0.0, 0.0], &[1.0, -2.0, 5.0]),
            2.0
        );
    }

    #[test]
    fn r2_mean_predictor_is_zero() {
        // Predicting the mean of y everywhere gives r2 = 0.
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let mean_pred = vec![2.5; 4];
        assert!((r2_score(&y, &mean_pred)).abs() < 1e-12);
    }

    #[test]
    fn r2_worse_than_mean_is_negative() {
        let y = vec![1.0, 2.0, 3.0];
        let bad = vec![10.0, -10.0, 10.0];
        assert!(r2_score(&y, &bad) < 0.0);
    }

    #[test]
    fn r2_constant_truth_imperfect_fit_is_zero() {
        assert_eq!(r2_score(&[5.0, 5.0], &[4.0, 6.0]), 0.0);
    }

    #[test]
    fn explained_variance_ignores_constant_bias() {
        // Uniform offset: r2 drops, explained variance stays 1.
        let y = vec![1.0, 2.0, 3.0, 4.0];
        let shifted: Vec<f64> = y.iter().map(|v| v + 2.0).collect();
        let m = evaluate(&y, &shifted).unwrap();
        assert!((m.explained_variance - 1.0).abs() < 1e-12);
        assert!(m.r2 < 1.0);
    }

    // ── Order independence ──

    #[test]
    fn identical_permutation_leaves_metrics_unchanged() {
        let y_true = vec![3.0, 1.0, 4.0, 1.0, 5.0];
        let y_pred = vec![2.5, 1.5, 4.5, 0.5, 5.5];
        let perm = [4usize, 2, 0, 3, 1];

        let pt: Vec<f64> = perm.iter().map(|&i| y_true[i]).collect();
        let pp: Vec<f64> = perm.iter().map(|&i| y_pred[i]).collect();

        let a = evaluate(&y_true, &y_pred).unwrap();
        let b = evaluate(&pt, &pp).unwrap();
        assert!((a.mse - b.mse).abs() < 1e-12);
        assert!((a.r2 - b.r2).abs() < 1e-12);
        assert!((a.explained_variance - b.explained_variance).abs() < 1e-12);
        assert!((a.mae - b.mae).abs() < 1e-12);
        assert!((a.median_ae - b.median_ae).abs() < 1e-12);
    }

    // ── Serialization ──

    #[test]
    fn summary_round_trips_through_json() {
        let m = evaluate(&[1.0, 2.0, 3.0], &[1.1, 2.2, 2.9]).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: MetricsSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }
}
