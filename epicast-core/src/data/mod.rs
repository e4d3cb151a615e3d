//! Data layer: per-year CSV ingestion, column-convention validation, dataset
//! assembly, and entity label encoding.

pub mod assemble;
pub mod encode;
pub mod ingest;
pub mod schema;

use std::path::Path;

use thiserror::Error;

use crate::domain::CombinedDataset;
use assemble::AssembleError;
use ingest::IngestError;
use schema::TableSchema;

/// Errors from the combined ingest-then-assemble path.
#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

/// Read every per-year partition under `dir` and assemble the dataset.
///
/// Convenience entry point used by the CLI; the pieces are public for callers
/// that already hold DataFrames.
pub fn load_dataset(dir: &Path, schema: &TableSchema) -> Result<CombinedDataset, DataError> {
    let partitions = ingest::read_partition_dir(dir)?;
    Ok(assemble::assemble(partitions, schema)?)
}
