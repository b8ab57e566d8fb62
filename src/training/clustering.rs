//! K-Means clustering used to place RBF centers
//!
//! Unsupervised: takes X only. Centroids are seeded from randomly drawn data
//! points (duplicates allowed) and refined with Lloyd iterations.

use crate::error::{RbfError, Result};
use crate::utils::euclidean_sq;
use ndarray::{Array1, Array2, ArrayView1};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default iteration cap for Lloyd iterations.
pub const DEFAULT_MAX_ITER: usize = 100;

/// K-Means clustering with random-point initialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iter: usize,
    pub random_state: u64,
    /// Fitted cluster centroids (n_clusters × n_features)
    centroids: Option<Array2<f64>>,
    /// Cluster index of every training point against the final centroids
    labels: Option<Array1<usize>>,
    /// Number of Lloyd iterations performed
    pub n_iter: usize,
    /// Whether the last iteration left every assignment unchanged
    pub converged: bool,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: DEFAULT_MAX_ITER,
            random_state: 42,
            centroids: None,
            labels: None,
            n_iter: 0,
            converged: false,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Fit using a generator seeded from `random_state`.
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        self.fit_with_rng(x, &mut rng)
    }

    /// Fit drawing every random choice from `rng`.
    ///
    /// Stops when no point changes cluster or after `max_iter` iterations.
    /// A cluster that receives no points is moved onto a random data point.
    pub fn fit_with_rng<R: Rng + ?Sized>(&mut self, x: &Array2<f64>, rng: &mut R) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples == 0 {
            return Err(RbfError::DataError("cannot cluster an empty dataset".to_string()));
        }
        if self.n_clusters == 0 {
            return Err(RbfError::invalid("n_clusters", 0, "must be at least 1"));
        }

        let mut centroids = Array2::zeros((self.n_clusters, x.ncols()));
        for mut centroid in centroids.rows_mut() {
            centroid.assign(&x.row(rng.gen_range(0..n_samples)));
        }

        // usize::MAX marks "not yet assigned" so the first pass always counts as a change
        let mut labels = vec![usize::MAX; n_samples];
        self.converged = false;
        self.n_iter = 0;

        while self.n_iter < self.max_iter {
            self.n_iter += 1;

            let mut changed = false;
            for (i, label) in labels.iter_mut().enumerate() {
                let best = nearest_centroid(&x.row(i), &centroids);
                if *label != best {
                    *label = best;
                    changed = true;
                }
            }

            if !changed {
                self.converged = true;
                break;
            }

            let mut sums = Array2::<f64>::zeros(centroids.dim());
            let mut counts = vec![0usize; self.n_clusters];
            for (i, &c) in labels.iter().enumerate() {
                counts[c] += 1;
                let mut sum = sums.row_mut(c);
                sum += &x.row(i);
            }

            for (c, &count) in counts.iter().enumerate() {
                if count > 0 {
                    let mean = sums.row(c).mapv(|v| v / count as f64);
                    centroids.row_mut(c).assign(&mean);
                } else {
                    let idx = rng.gen_range(0..n_samples);
                    debug!(cluster = c, point = idx, "relocating empty cluster");
                    centroids.row_mut(c).assign(&x.row(idx));
                }
            }
        }

        if !self.converged {
            warn!(
                max_iter = self.max_iter,
                "k-means stopped on the iteration cap before assignments settled"
            );
            // the last step was an update, so refresh labels against the final centroids
            for (i, label) in labels.iter_mut().enumerate() {
                *label = nearest_centroid(&x.row(i), &centroids);
            }
        }

        debug!(
            n_clusters = self.n_clusters,
            n_iter = self.n_iter,
            converged = self.converged,
            "k-means finished"
        );

        self.centroids = Some(centroids);
        self.labels = Some(Array1::from_vec(labels));
        Ok(self)
    }

    /// Predict cluster indices for new data
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<usize>> {
        let centroids = self
            .centroids
            .as_ref()
            .ok_or_else(|| RbfError::TrainingError("k-means has not been fitted".to_string()))?;
        if x.ncols() != centroids.ncols() {
            return Err(RbfError::shape(
                format!("{} features", centroids.ncols()),
                format!("{} features", x.ncols()),
            ));
        }
        Ok(x.rows().into_iter().map(|row| nearest_centroid(&row, centroids)).collect())
    }

    /// Get cluster centroids
    pub fn centroids(&self) -> Option<&Array2<f64>> {
        self.centroids.as_ref()
    }

    /// Consume the model and return its centroids
    pub fn into_centroids(self) -> Option<Array2<f64>> {
        self.centroids
    }

    /// Cluster index of every training point
    pub fn labels(&self) -> Option<&Array1<usize>> {
        self.labels.as_ref()
    }

    /// Sum of squared distances from each training point to its centroid
    pub fn inertia(&self, x: &Array2<f64>) -> Option<f64> {
        let centroids = self.centroids.as_ref()?;
        let labels = self.labels.as_ref()?;
        Some(
            labels
                .iter()
                .enumerate()
                .map(|(i, &c)| euclidean_sq(&x.row(i), &centroids.row(c)))
                .sum(),
        )
    }
}

/// Index of the closest centroid; ties go to the lowest index.
pub(crate) fn nearest_centroid(point: &ArrayView1<f64>, centroids: &Array2<f64>) -> usize {
    let mut best_c = 0;
    let mut best_dist = f64::MAX;
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d = euclidean_sq(point, &centroid);
        if d < best_dist {
            best_dist = d;
            best_c = c;
        }
    }
    best_c
}
