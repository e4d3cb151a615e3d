//! Domain types — the long-form observation record and the assembled dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::schema::TableSchema;

/// One entity-year observation: covariates plus the outcome being forecast.
///
/// Identity is `(entity_id, year)`; the assembler guarantees uniqueness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub entity_id: String,
    pub year: i32,
    /// Named numeric features (e.g. pollutant concentrations).
    pub covariates: BTreeMap<String, f64>,
    /// The value being forecast (annual death count).
    pub outcome: f64,
}

/// The assembled long-form dataset spanning all years and entities.
///
/// Immutable after assembly: splits borrow from it, and both the entity
/// vocabulary and the fingerprint are derived read-only views.
#[derive(Debug, Clone)]
pub struct CombinedDataset {
    records: Vec<ObservationRecord>,
    schema: TableSchema,
}

impl CombinedDataset {
    pub(crate) fn new(records: Vec<ObservationRecord>, schema: TableSchema) -> Self {
        Self { records, schema }
    }

    /// Build a dataset from records already in memory.
    ///
    /// Enforces the same `(entity_id, year)` uniqueness invariant as CSV
    /// assembly; use this for non-CSV sources and tests.
    pub fn from_records(
        records: Vec<ObservationRecord>,
        schema: TableSchema,
    ) -> Result<Self, crate::data::assemble::AssembleError> {
        let mut seen = std::collections::HashSet::new();
        for rec in &records {
            if !seen.insert((rec.entity_id.clone(), rec.year)) {
                return Err(crate::data::assemble::AssembleError::DuplicateRecord {
                    entity_id: rec.entity_id.clone(),
                    year: rec.year,
                });
            }
        }
        Ok(Self::new(records, schema))
    }

    pub fn records(&self) -> &[ObservationRecord] {
        &self.records
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct entity identifiers in first-appearance order.
    pub fn entities(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for rec in &self.records {
            if seen.insert(rec.entity_id.as_str()) {
                out.push(rec.entity_id.clone());
            }
        }
        out
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Content-addressable hash of the assembled records.
    ///
    /// Carried into run results so an artifact can be tied back to the exact
    /// dataset it was computed from.
    pub fn fingerprint(&self) -> String {
        let json =
            serde_json::to_string(&self.records).expect("ObservationRecord serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
