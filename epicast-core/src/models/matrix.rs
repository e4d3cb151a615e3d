//! Dense row-major feature matrix for the tabular models.

use crate::models::traits::{ModelError, Result};

/// Row-major feature matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    data: Vec<f64>,
    n_rows: usize,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Build from row vectors; all rows must share the same width.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        if n_rows == 0 {
            return Err(ModelError::EmptyData);
        }
        let n_cols = rows[0].len();
        if n_cols == 0 {
            return Err(ModelError::EmptyData);
        }
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in &rows {
            if row.len() != n_cols {
                return Err(ModelError::DimensionMismatch {
                    expected: n_cols,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            n_rows,
            n_cols,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// New matrix holding the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Self {
            data,
            n_rows: indices.len(),
            n_cols: self.n_cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_round_trip() {
        let m = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.row(0), &[1.0, 2.0]);
        assert_eq!(m.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = FeatureMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err, ModelError::DimensionMismatch { expected: 2, got: 1 });
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(
            FeatureMatrix::from_rows(vec![]).unwrap_err(),
            ModelError::EmptyData
        );
        assert_eq!(
            FeatureMatrix::from_rows(vec![vec![]]).unwrap_err(),
            ModelError::EmptyData
        );
    }

    #[test]
    fn take_rows_selects_in_order() {
        let m = FeatureMatrix::from_rows(vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
        ])
        .unwrap();
        let sub = m.take_rows(&[2, 0]);
        assert_eq!(sub.n_rows(), 2);
        assert_eq!(sub.row(0), &[3.0, 3.0]);
        assert_eq!(sub.row(1), &[1.0, 1.0]);
    }
}
