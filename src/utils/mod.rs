//! Utility functions shared by the training, explanation and validation modules

use crate::error::{RbfError, Result};
use ndarray::{Array1, Array2, ArrayView1};

/// Squared Euclidean distance between two vectors of equal length.
#[inline]
pub fn euclidean_sq(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Build a feature matrix from parallel row vectors.
///
/// Dimensionality is taken from the first record; every later record must
/// match it. Rows are never truncated or padded.
pub fn rows_to_array(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let first = rows
        .first()
        .ok_or_else(|| RbfError::DataError("dataset is empty".to_string()))?;
    let n_features = first.len();
    if n_features == 0 {
        return Err(RbfError::DataError("records have no features".to_string()));
    }

    let mut flat = Vec::with_capacity(rows.len() * n_features);
    for (i, row) in rows.iter().enumerate() {
        if row.len() != n_features {
            return Err(RbfError::DataError(format!(
                "record {} has {} features, expected {}",
                i,
                row.len(),
                n_features
            )));
        }
        flat.extend_from_slice(row);
    }

    Ok(Array2::from_shape_vec((rows.len(), n_features), flat)?)
}

/// Copy the selected rows of `x` into a new matrix, in index order.
pub fn gather_rows(x: &Array2<f64>, indices: &[usize]) -> Array2<f64> {
    let n_cols = x.ncols();
    let mut out = Array2::zeros((indices.len(), n_cols));
    for (dst, &src) in indices.iter().enumerate() {
        out.row_mut(dst).assign(&x.row(src));
    }
    out
}

/// Copy the selected entries of `y`, in index order.
pub fn gather(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    indices.iter().map(|&i| y[i]).collect()
}
