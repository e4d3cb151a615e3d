//! Auto-order autoregressive forecaster.
//!
//! Fits AR(p) by ordinary least squares for every candidate order up to
//! `max_order`, scores each fit with AIC, and forecasts from the winning
//! order. AR(0) degenerates to the series mean and is always a valid
//! candidate, so the search never comes up empty on usable input.

use crate::models::traits::{ModelError, Result, UnivariateForecaster};

/// Configuration for the AR order search.
#[derive(Debug, Clone)]
pub struct AutoArConfig {
    /// Maximum AR order to consider (further bounded by series length).
    pub max_order: usize,
}

impl Default for AutoArConfig {
    fn default() -> Self {
        Self { max_order: 5 }
    }
}

impl AutoArConfig {
    pub fn with_max_order(mut self, max_order: usize) -> Self {
        self.max_order = max_order;
        self
    }
}

/// Auto-order AR model selected by AIC.
#[derive(Debug, Clone, Default)]
pub struct AutoAr {
    config: AutoArConfig,
}

impl AutoAr {
    pub fn new(config: AutoArConfig) -> Self {
        Self { config }
    }
}

/// One fitted AR(p) candidate: intercept followed by lag coefficients.
struct Candidate {
    coefs: Vec<f64>,
    aic: f64,
}

impl UnivariateForecaster for AutoAr {
    fn name(&self) -> &str {
        "auto_ar"
    }

    fn fit_and_forecast(&self, series: &[f64], horizon: usize) -> Result<f64> {
        if horizon == 0 {
            return Err(ModelError::InvalidParameter(
                "horizon must be positive".into(),
            ));
        }
        let n = series.len();
        if n < 3 {
            return Err(ModelError::InsufficientData { needed: 3, got: n });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Computation(
                "series contains non-finite values".into(),
            ));
        }

        // Keep each regression overdetermined: m = n - p rows, p + 1 params.
        let max_p = self.config.max_order.min((n - 2) / 2);
        let mut best: Option<Candidate> = None;
        for p in 0..=max_p {
            let candidate = match fit_order(series, p) {
                Some(c) => c,
                None => continue, // singular design, e.g. constant series at p >= 1
            };
            let better = match &best {
                Some(b) => candidate.aic < b.aic,
                None => true,
            };
            if better {
                best = Some(candidate);
            }
        }

        let best = best.ok_or_else(|| {
            ModelError::Computation("no AR order could be fitted".into())
        })?;
        Ok(forecast(series, &best.coefs, horizon))
    }
}

/// Fit AR(p) by least squares on the normal equations; `None` if singular.
fn fit_order(series: &[f64], p: usize) -> Option<Candidate> {
    let n = series.len();
    let m = n - p;
    let k = p + 1;

    if p == 0 {
        let mean = series.iter().sum::<f64>() / n as f64;
        let rss: f64 = series.iter().map(|y| (y - mean).powi(2)).sum();
        return Some(Candidate {
            coefs: vec![mean],
            aic: aic(rss, m, k),
        });
    }

    // Gram matrix X'X and X'y for rows t = p..n, X = [1, y[t-1], .., y[t-p]].
    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for t in p..n {
        let mut x = Vec::with_capacity(k);
        x.push(1.0);
        for lag in 1..=p {
            x.push(series[t - lag]);
        }
        for i in 0..k {
            xty[i] += x[i] * series[t];
            for j in 0..k {
                xtx[i][j] += x[i] * x[j];
            }
        }
    }

    let coefs = solve(xtx, xty)?;

    let mut rss = 0.0;
    for t in p..n {
        let mut fitted = coefs[0];
        for lag in 1..=p {
            fitted += coefs[lag] * series[t - lag];
        }
        let resid = series[t] - fitted;
        rss += resid * resid;
    }

    Some(Candidate {
        aic: aic(rss, m, k),
        coefs,
    })
}

fn aic(rss: f64, m: usize, k: usize) -> f64 {
    m as f64 * (rss.max(1e-12) / m as f64).ln() + 2.0 * k as f64
}

/// Iterated point forecast from fitted coefficients.
fn forecast(series: &[f64], coefs: &[f64], horizon: usize) -> f64 {
    let p = coefs.len() - 1;
    let mut history: Vec<f64> = series.to_vec();
    let mut value = 0.0;
    for _ in 0..horizon {
        value = coefs[0];
        for lag in 1..=p {
            value += coefs[lag] * history[history.len() - lag];
        }
        history.push(value);
    }
    value
}

/// Gaussian elimination with partial pivoting; `None` when singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap();
        if a[pivot_row][col].abs() < 1e-10 {
            return None;
        }
        a.swap(col, pivot_row);
        b.swap(col, pivot_row);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for col in (row + 1)..n {
            sum -= a[row][col] * x[col];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}
