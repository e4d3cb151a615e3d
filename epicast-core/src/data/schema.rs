//! Column convention for the per-year source tables.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fixed column convention for every source partition.
///
/// Column names must match exactly; a partition missing any required column
/// fails assembly with `AssembleError::SchemaMismatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Entity identifier column (the municipality).
    #[serde(default = "default_entity_col")]
    pub entity_col: String,
    /// Outcome column (the death count being forecast).
    #[serde(default = "default_outcome_col")]
    pub outcome_col: String,
    /// Covariate columns (exposure features for the tabular variant).
    #[serde(default = "default_covariate_cols")]
    pub covariate_cols: Vec<String>,
}

fn default_entity_col() -> String {
    "comune".into()
}

fn default_outcome_col() -> String {
    "cns_deaths".into()
}

fn default_covariate_cols() -> Vec<String> {
    vec!["pm25".into(), "pm10".into()]
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            entity_col: default_entity_col(),
            outcome_col: default_outcome_col(),
            covariate_cols: default_covariate_cols(),
        }
    }
}

impl TableSchema {
    /// All columns a partition must carry.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut cols = vec![self.entity_col.as_str(), self.outcome_col.as_str()];
        cols.extend(self.covariate_cols.iter().map(|c| c.as_str()));
        cols
    }

    /// First required column absent from `df`, if any.
    pub fn first_missing(&self, df: &DataFrame) -> Option<String> {
        let actual = df.schema();
        self.required_columns()
            .into_iter()
            .find(|&name| !actual.contains(name))
            .map(|name| name.to_string())
    }
}
