//! Forecasting models.
//!
//! The orchestration layer only sees the capability traits in `traits`; the
//! built-in implementations (`AutoAr`, `Gbt`) satisfy them and any other
//! model library can be substituted without touching the pipeline.

pub mod auto_ar;
pub mod gbt;
pub mod matrix;
pub mod traits;
pub mod tuning;

pub use auto_ar::{AutoAr, AutoArConfig};
pub use gbt::{Gbt, GbtModel, GbtParams};
pub use matrix::FeatureMatrix;
pub use traits::{
    BoxedUnivariate, FittedRegressor, ModelError, TabularRegressor, UnivariateForecaster,
};
pub use tuning::{grid_search, ParamGrid};
