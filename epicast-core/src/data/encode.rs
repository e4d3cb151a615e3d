//! Entity label encoding for the tabular variant.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::CombinedDataset;

/// Maps entity identifiers to dense integer codes.
///
/// Fit once over the FULL entity vocabulary before any train/test split, so
/// test-time entities are always representable. Codes are assigned in sorted
/// identifier order, which makes the mapping stable across runs and across
/// fit/predict passes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityEncoder {
    codes: BTreeMap<String, u32>,
    ids: Vec<String>,
}

impl EntityEncoder {
    /// Learn the encoding from the full dataset.
    pub fn fit(dataset: &CombinedDataset) -> Self {
        let mut ids = dataset.entities();
        ids.sort_unstable();
        ids.dedup();
        let codes = ids
            .iter()
            .enumerate()
            .map(|(code, id)| (id.clone(), code as u32))
            .collect();
        Self { codes, ids }
    }

    pub fn encode(&self, entity_id: &str) -> Option<u32> {
        self.codes.get(entity_id).copied()
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.ids.get(code as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::TableSchema;
    use crate::domain::ObservationRecord;

    fn dataset(entities: &[&str]) -> CombinedDataset {
        let records = entities
            .iter()
            .enumerate()
            .map(|(i, e)| ObservationRecord {
                entity_id: (*e).to_string(),
                year: 2017 + i as i32,
                covariates: Default::default(),
                outcome: 1.0,
            })
            .collect();
        CombinedDataset::new(records, TableSchema::default())
    }

    #[test]
    fn codes_are_dense_and_sorted() {
        let enc = EntityEncoder::fit(&dataset(&["milano", "aosta", "bergamo"]));
        assert_eq!(enc.len(), 3);
        assert_eq!(enc.encode("aosta"), Some(0));
        assert_eq!(enc.encode("bergamo"), Some(1));
        assert_eq!(enc.encode("milano"), Some(2));
    }

    #[test]
    fn encoding_is_stable_across_calls() {
        let enc = EntityEncoder::fit(&dataset(&["milano", "aosta"]));
        assert_eq!(enc.encode("milano"), enc.encode("milano"));
    }

    #[test]
    fn decode_inverts_encode() {
        let enc = EntityEncoder::fit(&dataset(&["milano", "aosta", "bergamo"]));
        for id in ["aosta", "bergamo", "milano"] {
            let code = enc.encode(id).unwrap();
            assert_eq!(enc.decode(code), Some(id));
        }
    }

    #[test]
    fn unknown_entity_is_none() {
        let enc = EntityEncoder::fit(&dataset(&["milano"]));
        assert_eq!(enc.encode("torino"), None);
        assert_eq!(enc.decode(7), None);
    }

    #[test]
    fn repeated_entities_collapse() {
        let enc = EntityEncoder::fit(&dataset(&["milano", "milano", "aosta"]));
        assert_eq!(enc.len(), 2);
    }
}
