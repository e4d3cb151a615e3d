//! Epicast runner — pipeline orchestration, metrics, and artifact export.
//!
//! This crate builds on `epicast-core` to provide:
//! - The per-entity univariate evaluation pass and future-year forecasting
//! - The global tabular pass (grid search, refit, predict)
//! - The regression metric battery
//! - JSON/CSV/Markdown artifact export with schema versioning
//! - TOML run configuration

pub mod config;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod tabular;

pub use config::{ConfigError, RunConfig};
pub use export::{
    export_json, export_predictions_csv, generate_report, import_json, load_artifacts,
    save_artifacts, save_forecast_csv,
};
pub use metrics::{evaluate, MetricsError, MetricsSummary};
pub use runner::{
    forecast_future, run_univariate, FutureForecast, PredictionRecord, RunError, RunResult,
    SkipReason, SkippedEntity, Variant, SCHEMA_VERSION,
};
pub use tabular::run_tabular;

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<RunResult>();
        assert_sync::<RunResult>();
        assert_send::<FutureForecast>();
        assert_sync::<FutureForecast>();
    }

    #[test]
    fn metrics_summary_is_send_sync() {
        assert_send::<MetricsSummary>();
        assert_sync::<MetricsSummary>();
    }

    #[test]
    fn config_is_send_sync() {
        assert_send::<RunConfig>();
        assert_sync::<RunConfig>();
    }

    #[test]
    fn prediction_record_is_send_sync() {
        assert_send::<PredictionRecord>();
        assert_sync::<PredictionRecord>();
    }
}
