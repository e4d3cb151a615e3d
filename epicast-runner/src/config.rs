//! Serializable run configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use epicast_core::models::ParamGrid;
use epicast_core::TableSchema;

use crate::runner::Variant;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Complete configuration for one pipeline run, loadable from TOML.
///
/// Defaults mirror the original study: train through 2018, test on 2019,
/// forecast 2020, five CV folds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory of per-year CSV partitions.
    pub data_dir: PathBuf,

    /// Which modeling strategy to run.
    #[serde(default = "default_variant")]
    pub variant: Variant,

    #[serde(default = "default_train_cutoff_year")]
    pub train_cutoff_year: i32,

    #[serde(default = "default_test_year")]
    pub test_year: i32,

    /// Future year for the forecast command.
    #[serde(default = "default_forecast_year")]
    pub forecast_year: i32,

    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    // Table-valued fields last so TOML serialization stays valid.
    /// Column convention; defaults match the source workbook.
    #[serde(default)]
    pub schema: TableSchema,

    /// Hyperparameter grid for the tabular variant.
    #[serde(default)]
    pub grid: ParamGrid,
}

fn default_variant() -> Variant {
    Variant::Univariate
}

fn default_train_cutoff_year() -> i32 {
    2018
}

fn default_test_year() -> i32 {
    2019
}

fn default_forecast_year() -> i32 {
    2020
}

fn default_cv_folds() -> usize {
    5
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl RunConfig {
    /// A config with all defaults for the given data directory.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            variant: default_variant(),
            train_cutoff_year: default_train_cutoff_year(),
            test_year: default_test_year(),
            forecast_year: default_forecast_year(),
            cv_folds: default_cv_folds(),
            output_dir: default_output_dir(),
            schema: TableSchema::default(),
            grid: ParamGrid::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }
}
