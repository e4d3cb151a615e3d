//! Epicast core — dataset assembly, time partitioning, entity encoding, and
//! forecasting models for per-municipality mortality forecasting.
//!
//! The pipeline in `epicast-runner` builds on this crate:
//! - `data`: ingest per-year CSV partitions, validate the column convention,
//!   assemble one long-form dataset, encode entity identifiers
//! - `split`: leakage-free train/test partitioning along the year axis
//! - `models`: capability traits for the model fitters plus the built-in
//!   auto-order AR forecaster and gradient-boosted-tree regressor

pub mod data;
pub mod domain;
pub mod models;
pub mod split;

pub use data::assemble::{assemble, AssembleError};
pub use data::encode::EntityEncoder;
pub use data::schema::TableSchema;
pub use data::{load_dataset, DataError};
pub use domain::{CombinedDataset, ObservationRecord};
pub use split::{split, Split, SplitError};
