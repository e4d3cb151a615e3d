//! CSV partition ingestion.
//!
//! The source "workbook" is a directory of per-year CSV files, one per
//! partition, with the file stem as the partition label (the year). Reading
//! is a thin adapter over polars; label parsing and schema validation happen
//! during assembly.

use std::path::Path;

use polars::prelude::*;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot read partition directory {dir}: {source}")]
    DirUnreadable {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no CSV partitions found in {0}")]
    NoPartitions(String),

    #[error("failed to read partition '{label}': {message}")]
    ReadFailed { label: String, message: String },
}

/// Read every `*.csv` file under `dir` as a `(label, table)` pair.
///
/// Labels are file stems, returned in ascending label order so assembly is
/// deterministic regardless of directory iteration order.
pub fn read_partition_dir(dir: &Path) -> Result<Vec<(String, DataFrame)>, IngestError> {
    let entries = std::fs::read_dir(dir).map_err(|source| IngestError::DirUnreadable {
        dir: dir.display().to_string(),
        source,
    })?;

    let mut paths: Vec<(String, std::path::PathBuf)> = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        let label = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        paths.push((label, path));
    }
    paths.sort_by(|a, b| a.0.cmp(&b.0));

    if paths.is_empty() {
        return Err(IngestError::NoPartitions(dir.display().to_string()));
    }

    let mut partitions = Vec::with_capacity(paths.len());
    for (label, path) in paths {
        let df = read_partition_csv(&path).map_err(|e| IngestError::ReadFailed {
            label: label.clone(),
            message: e.to_string(),
        })?;
        partitions.push((label, df));
    }
    Ok(partitions)
}

/// Read a single partition CSV.
pub fn read_partition_csv(path: &Path) -> PolarsResult<DataFrame> {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .collect()
}
