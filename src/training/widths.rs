//! Gaussian width estimation from centroid spacing
//!
//! Each hidden unit gets a sigma equal to the mean distance to its nearest
//! neighbouring centroids, so dense regions get narrow kernels and isolated
//! centroids get wide ones.

use crate::error::{RbfError, Result};
use crate::utils::euclidean_sq;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Lower clamp for a width on standardized data.
pub const MIN_SIGMA: f64 = 0.1;
/// Upper clamp for a width on standardized data.
pub const MAX_SIGMA: f64 = 3.0;
/// Width used when there is only one centroid.
pub const SINGLE_CENTROID_SIGMA: f64 = 1.0;

/// K-nearest-neighbour width heuristic
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KnnWidthEstimator {
    pub k_neighbors: usize,
    pub min_sigma: f64,
    pub max_sigma: f64,
}

impl Default for KnnWidthEstimator {
    fn default() -> Self {
        Self::new(2)
    }
}

impl KnnWidthEstimator {
    pub fn new(k_neighbors: usize) -> Self {
        Self {
            k_neighbors,
            min_sigma: MIN_SIGMA,
            max_sigma: MAX_SIGMA,
        }
    }

    /// Compute one width per centroid row.
    ///
    /// With fewer than `k_neighbors` other centroids, the average runs over
    /// the ones that exist. Results are clipped to `[min_sigma, max_sigma]`.
    pub fn estimate(&self, centroids: &Array2<f64>) -> Result<Array1<f64>> {
        if self.k_neighbors == 0 {
            return Err(RbfError::invalid("k_neighbors", 0, "must be at least 1"));
        }
        let n = centroids.nrows();
        match n {
            0 => Err(RbfError::DataError("no centroids to size".to_string())),
            1 => Ok(Array1::from_elem(1, SINGLE_CENTROID_SIGMA)),
            _ => {
                let k = self.k_neighbors.min(n - 1);
                let sigmas = (0..n)
                    .map(|i| {
                        let mut distances: Vec<f64> = (0..n)
                            .filter(|&j| j != i)
                            .map(|j| euclidean_sq(&centroids.row(i), &centroids.row(j)).sqrt())
                            .collect();
                        distances.sort_by(|a, b| a.total_cmp(b));
                        let avg = distances[..k].iter().sum::<f64>() / k as f64;
                        avg.clamp(self.min_sigma, self.max_sigma)
                    })
                    .collect();
                Ok(sigmas)
            }
        }
    }
}

/// Widths with the default clamp range.
pub fn estimate_widths(centroids: &Array2<f64>, k_neighbors: usize) -> Result<Array1<f64>> {
    KnnWidthEstimator::new(k_neighbors).estimate(centroids)
}
