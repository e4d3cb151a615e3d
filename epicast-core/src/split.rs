//! Train/test partitioning along the year axis.

use thiserror::Error;

use crate::domain::{CombinedDataset, ObservationRecord};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("test year {test_year} must be after train cutoff {train_cutoff_year}")]
    TestYearNotAfterCutoff {
        train_cutoff_year: i32,
        test_year: i32,
    },
}

/// Disjoint train/test views over the assembled dataset.
///
/// Train holds every record with `year <= train_cutoff_year`; test holds the
/// single designated test year. Records outside both are ignored. Record
/// order inside each side follows dataset order, so an entity's series is
/// already in chronological partition order.
#[derive(Debug)]
pub struct Split<'a> {
    pub train: Vec<&'a ObservationRecord>,
    pub test: Vec<&'a ObservationRecord>,
    pub train_cutoff_year: i32,
    pub test_year: i32,
}

impl<'a> Split<'a> {
    /// Training outcome series for one entity, in dataset order.
    pub fn train_outcomes(&self, entity_id: &str) -> Vec<f64> {
        self.train
            .iter()
            .filter(|r| r.entity_id == entity_id)
            .map(|r| r.outcome)
            .collect()
    }

    /// The entity's test record, if it has one.
    pub fn test_record(&self, entity_id: &str) -> Option<&'a ObservationRecord> {
        self.test.iter().copied().find(|r| r.entity_id == entity_id)
    }
}

/// Partition the dataset by year.
///
/// Rejects `test_year <= train_cutoff_year`: the unguarded original silently
/// produced a semantically backwards split, so the inverted range is an
/// explicit error here.
pub fn split(
    dataset: &CombinedDataset,
    train_cutoff_year: i32,
    test_year: i32,
) -> Result<Split<'_>, SplitError> {
    if test_year <= train_cutoff_year {
        return Err(SplitError::TestYearNotAfterCutoff {
            train_cutoff_year,
            test_year,
        });
    }

    let train = dataset
        .records()
        .iter()
        .filter(|r| r.year <= train_cutoff_year)
        .collect();
    let test = dataset
        .records()
        .iter()
        .filter(|r| r.year == test_year)
        .collect();

    Ok(Split {
        train,
        test,
        train_cutoff_year,
        test_year,
    })
}
