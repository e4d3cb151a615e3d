//! Dataset assembly — merge per-year tables into one long-form dataset.

use std::collections::{BTreeMap, HashSet};

use polars::prelude::*;
use thiserror::Error;

use crate::data::schema::TableSchema;
use crate::domain::{CombinedDataset, ObservationRecord};

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("partition label '{label}' cannot be parsed as a year")]
    MalformedPartitionLabel { label: String },

    #[error("partition '{partition}' is missing required column '{column}'")]
    SchemaMismatch { partition: String, column: String },

    #[error("partition '{partition}' row {row}: missing value in column '{column}'")]
    MissingValue {
        partition: String,
        row: usize,
        column: String,
    },

    #[error("duplicate record for entity '{entity_id}' in year {year}")]
    DuplicateRecord { entity_id: String, year: i32 },

    #[error("column read failed in partition '{partition}': {message}")]
    ColumnRead { partition: String, message: String },
}

/// Merge per-year tables into a single `CombinedDataset`.
///
/// Every row is tagged with the year parsed from its partition label. All
/// labels and all partition schemas are validated before any row is
/// converted, so a malformed input never yields a half-assembled dataset.
/// Source tables are not mutated.
pub fn assemble(
    partitions: Vec<(String, DataFrame)>,
    schema: &TableSchema,
) -> Result<CombinedDataset, AssembleError> {
    let mut labeled: Vec<(i32, String, DataFrame)> = Vec::with_capacity(partitions.len());
    for (label, df) in partitions {
        let year: i32 = label
            .trim()
            .parse()
            .map_err(|_| AssembleError::MalformedPartitionLabel {
                label: label.clone(),
            })?;
        if let Some(column) = schema.first_missing(&df) {
            return Err(AssembleError::SchemaMismatch {
                partition: label,
                column,
            });
        }
        labeled.push((year, label, df));
    }

    let mut records = Vec::new();
    let mut seen: HashSet<(String, i32)> = HashSet::new();
    for (year, label, df) in &labeled {
        convert_partition(df, *year, label, schema, &mut seen, &mut records)?;
    }

    Ok(CombinedDataset::new(records, schema.clone()))
}

fn convert_partition(
    df: &DataFrame,
    year: i32,
    partition: &str,
    schema: &TableSchema,
    seen: &mut HashSet<(String, i32)>,
    records: &mut Vec<ObservationRecord>,
) -> Result<(), AssembleError> {
    let col_err = |e: PolarsError| AssembleError::ColumnRead {
        partition: partition.to_string(),
        message: e.to_string(),
    };

    let entities = df
        .column(&schema.entity_col)
        .map_err(col_err)?
        .str()
        .map_err(col_err)?
        .clone();
    let outcomes = numeric_column(df, &schema.outcome_col, partition)?;
    let mut covariates: Vec<(&str, Float64Chunked)> =
        Vec::with_capacity(schema.covariate_cols.len());
    for name in &schema.covariate_cols {
        covariates.push((name.as_str(), numeric_column(df, name, partition)?));
    }

    for row in 0..df.height() {
        let entity_id = entities
            .get(row)
            .ok_or_else(|| AssembleError::MissingValue {
                partition: partition.to_string(),
                row,
                column: schema.entity_col.clone(),
            })?
            .to_string();
        let outcome = outcomes.get(row).ok_or_else(|| AssembleError::MissingValue {
            partition: partition.to_string(),
            row,
            column: schema.outcome_col.clone(),
        })?;

        let mut features = BTreeMap::new();
        for (name, values) in &covariates {
            let value = values.get(row).ok_or_else(|| AssembleError::MissingValue {
                partition: partition.to_string(),
                row,
                column: (*name).to_string(),
            })?;
            features.insert((*name).to_string(), value);
        }

        if !seen.insert((entity_id.clone(), year)) {
            return Err(AssembleError::DuplicateRecord { entity_id, year });
        }

        records.push(ObservationRecord {
            entity_id,
            year,
            covariates: features,
            outcome,
        });
    }
    Ok(())
}

/// Extract a column as f64, casting integer-inferred CSV columns.
fn numeric_column(
    df: &DataFrame,
    name: &str,
    partition: &str,
) -> Result<Float64Chunked, AssembleError> {
    let col_err = |e: PolarsError| AssembleError::ColumnRead {
        partition: partition.to_string(),
        message: e.to_string(),
    };
    let cast = df
        .column(name)
        .map_err(col_err)?
        .cast(&DataType::Float64)
        .map_err(col_err)?;
    Ok(cast.f64().map_err(col_err)?.clone())
}
