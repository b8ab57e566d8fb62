//! Z-score normalization statistics

use crate::error::{RbfError, Result};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Standard deviations at or below this value are replaced by 1.0.
pub const MIN_STD_DEV: f64 = 1e-12;

/// Per-column mean and population standard deviation.
///
/// Computed once from the training (or background) data and replayed
/// unchanged on every later row; never refit on evaluation data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStats {
    mean: Array1<f64>,
    std_dev: Array1<f64>,
}

impl NormalizationStats {
    /// Compute population statistics (divide by N) for every column.
    pub fn compute(data: &Array2<f64>) -> Result<Self> {
        let n_rows = data.nrows();
        if n_rows == 0 || data.ncols() == 0 {
            return Err(RbfError::DataError(
                "cannot compute normalization statistics of an empty dataset".to_string(),
            ));
        }

        let mean = data
            .mean_axis(Axis(0))
            .ok_or_else(|| RbfError::DataError("empty dataset".to_string()))?;

        let mut sum_sq = Array1::<f64>::zeros(data.ncols());
        for row in data.rows() {
            for (acc, (&x, &m)) in sum_sq.iter_mut().zip(row.iter().zip(mean.iter())) {
                *acc += (x - m).powi(2);
            }
        }

        let std_dev = sum_sq.mapv(|s| {
            let std = (s / n_rows as f64).sqrt();
            if std <= MIN_STD_DEV {
                1.0
            } else {
                std
            }
        });

        Ok(Self { mean, std_dev })
    }

    /// Rebuild statistics from stored vectors.
    pub fn from_parts(mean: Array1<f64>, std_dev: Array1<f64>) -> Result<Self> {
        if mean.is_empty() {
            return Err(RbfError::DataError("normalization mean is empty".to_string()));
        }
        if mean.len() != std_dev.len() {
            return Err(RbfError::shape(
                format!("{} standard deviations", mean.len()),
                std_dev.len(),
            ));
        }
        if let Some(bad) = std_dev.iter().find(|s| !(**s > 0.0) || !s.is_finite()) {
            return Err(RbfError::invalid(
                "std_dev",
                bad,
                "standard deviations must be positive and finite",
            ));
        }
        Ok(Self { mean, std_dev })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std_dev(&self) -> &Array1<f64> {
        &self.std_dev
    }

    /// The "feature absent" baseline used for attribution: the column means.
    pub fn background(&self) -> Array1<f64> {
        self.mean.clone()
    }

    /// Apply `(x - mean) / std_dev` to a single row.
    pub fn normalize(&self, row: &ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_len(row.len())?;
        Ok(Array1::from_iter(
            row.iter()
                .zip(self.mean.iter().zip(self.std_dev.iter()))
                .map(|(&x, (&m, &s))| (x - m) / s),
        ))
    }

    /// Inverse transform `x * std_dev + mean`.
    pub fn denormalize(&self, row: &ArrayView1<f64>) -> Result<Array1<f64>> {
        self.check_len(row.len())?;
        Ok(Array1::from_iter(
            row.iter()
                .zip(self.mean.iter().zip(self.std_dev.iter()))
                .map(|(&x, (&m, &s))| x * s + m),
        ))
    }

    /// Normalize every row of a matrix.
    pub fn normalize_matrix(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_len(data.ncols())?;
        let mut out = data.clone();
        for mut row in out.rows_mut() {
            for (x, (&m, &s)) in row.iter_mut().zip(self.mean.iter().zip(self.std_dev.iter())) {
                *x = (*x - m) / s;
            }
        }
        Ok(out)
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len != self.mean.len() {
            return Err(RbfError::shape(
                format!("{} features", self.mean.len()),
                format!("{} features", len),
            ));
        }
        Ok(())
    }
}

/// Join values with `;` using Rust's round-trip float formatting.
pub fn encode_array(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(";")
}

/// Parse a `;`-joined list. Blank input decodes to an empty vector.
pub fn decode_array(data: &str) -> Result<Vec<f64>> {
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }
    data.split(';')
        .map(|s| {
            s.trim().parse::<f64>().map_err(|e| {
                RbfError::SerializationError(format!("invalid number '{}': {}", s, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_population_statistics() {
        let data = array![[1.0, 10.0], [3.0, 10.0]];
        let stats = NormalizationStats::compute(&data).unwrap();
        assert_eq!(stats.mean(), &array![2.0, 10.0]);
        // population std of {1, 3} is 1.0; constant column is clamped to 1.0
        assert_abs_diff_eq!(stats.std_dev()[0], 1.0, epsilon = 1e-12);
        assert_eq!(stats.std_dev()[1], 1.0);
    }

    #[test]
    fn test_std_dev_always_positive() {
        let data = array![[5.0, 0.0, -2.0], [5.0, 0.0, 7.0], [5.0, 0.0, 1.0]];
        let stats = NormalizationStats::compute(&data).unwrap();
        assert!(stats.std_dev().iter().all(|&s| s > 0.0));
    }

    #[test]
    fn test_empty_dataset_is_rejected() {
        let data = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            NormalizationStats::compute(&data),
            Err(RbfError::DataError(_))
        ));
    }

    #[test]
    fn test_normalize_round_trip() {
        let data = array![[1.0, 200.0, -3.0], [4.0, 150.0, 0.5], [2.5, 90.0, 8.0]];
        let stats = NormalizationStats::compute(&data).unwrap();
        for row in data.rows() {
            let z = stats.normalize(&row).unwrap();
            let back = stats.denormalize(&z.view()).unwrap();
            for (a, b) in row.iter().zip(back.iter()) {
                assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn test_normalize_matrix_has_zero_mean() {
        let data = array![[1.0, 2.0], [2.0, 4.0], [3.0, 9.0]];
        let stats = NormalizationStats::compute(&data).unwrap();
        let z = stats.normalize_matrix(&data).unwrap();
        for m in z.mean_axis(Axis(0)).unwrap().iter() {
            assert_abs_diff_eq!(*m, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_normalize_length_mismatch() {
        let stats = NormalizationStats::compute(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let row = array![1.0, 2.0, 3.0];
        assert!(matches!(
            stats.normalize(&row.view()),
            Err(RbfError::ShapeError { .. })
        ));
    }

    #[test]
    fn test_from_parts_rejects_zero_std() {
        let result = NormalizationStats::from_parts(array![0.0, 1.0], array![1.0, 0.0]);
        assert!(matches!(result, Err(RbfError::InvalidParameter { .. })));
    }

    #[test]
    fn test_array_codec() {
        let values = vec![1.5, -0.25, 3.0e-7];
        let text = encode_array(&values);
        assert_eq!(text.split(';').count(), 3);
        assert_eq!(decode_array(&text).unwrap(), values);
        assert!(decode_array("  ").unwrap().is_empty());
        assert!(decode_array("1;x").is_err());
    }
}
