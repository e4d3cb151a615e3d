//! Model capability traits and the shared model error type.

use thiserror::Error;

use crate::models::gbt::GbtParams;
use crate::models::matrix::FeatureMatrix;
use crate::models::tuning::ParamGrid;

/// Result type alias for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors from model fitting and prediction.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("empty input data")]
    EmptyData,

    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("empty parameter grid")]
    EmptyGrid,

    #[error("computation error: {0}")]
    Computation(String),
}

/// A per-entity time-series forecaster.
///
/// Consumes one entity's training outcomes on a synthetic regularly-spaced
/// annual axis (original row order, no reordering by value) and returns a
/// point forecast `horizon` steps past the end of the series. The pipeline
/// always asks for `horizon = 1`.
pub trait UnivariateForecaster: Send + Sync {
    fn name(&self) -> &str;

    fn fit_and_forecast(&self, series: &[f64], horizon: usize) -> Result<f64>;
}

/// Type alias for boxed univariate forecasters.
pub type BoxedUnivariate = Box<dyn UnivariateForecaster>;

/// A fitted tabular model, ready to predict.
pub trait FittedRegressor: Send + Sync {
    fn predict(&self, x: &FeatureMatrix) -> Vec<f64>;
}

/// A supervised tabular regressor with hyperparameter search.
///
/// The two-stage contract matters: `search_best` selects a configuration by
/// cross-validation on the training set, and the caller then refits that
/// configuration on the full training set with `fit`. Evaluation metrics must
/// come from the refit model's predictions, never from fold estimates.
pub trait TabularRegressor: Send + Sync {
    fn name(&self) -> &str;

    fn search_best(
        &self,
        x: &FeatureMatrix,
        y: &[f64],
        grid: &ParamGrid,
        cv_folds: usize,
    ) -> Result<GbtParams>;

    fn fit(&self, x: &FeatureMatrix, y: &[f64], params: &GbtParams)
        -> Result<Box<dyn FittedRegressor>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ModelError::InsufficientData { needed: 3, got: 1 };
        assert_eq!(err.to_string(), "insufficient data: need at least 3, got 1");

        let err = ModelError::InvalidParameter("horizon must be positive".into());
        assert_eq!(err.to_string(), "invalid parameter: horizon must be positive");

        assert_eq!(ModelError::EmptyGrid.to_string(), "empty parameter grid");
    }

    #[test]
    fn univariate_trait_is_object_safe() {
        struct Last;
        impl UnivariateForecaster for Last {
            fn name(&self) -> &str {
                "last"
            }
            fn fit_and_forecast(&self, series: &[f64], _horizon: usize) -> Result<f64> {
                series.last().copied().ok_or(ModelError::EmptyData)
            }
        }

        let model: BoxedUnivariate = Box::new(Last);
        assert_eq!(model.name(), "last");
        assert_eq!(model.fit_and_forecast(&[1.0, 2.0], 1).unwrap(), 2.0);
        assert_eq!(model.fit_and_forecast(&[], 1), Err(ModelError::EmptyData));
    }
}
