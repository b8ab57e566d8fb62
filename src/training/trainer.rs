//! RBF network trainer
//!
//! Training runs in three strictly ordered phases:
//! 1. K-Means places the hidden-unit centroids.
//! 2. A nearest-neighbour heuristic sizes each Gaussian.
//! 3. Online gradient descent with momentum fits the output weights and bias
//!    against the log-loss gradient of a logistic output.
//!
//! Centroids and widths stay fixed during phase 3. All randomness comes from
//! one generator seeded from the config, so a run is bit-for-bit reproducible.

use super::clustering::KMeans;
use super::config::TrainerConfig;
use super::rbf_network::RbfNetwork;
use super::widths::KnnWidthEstimator;
use crate::error::{RbfError, Result};
use crate::utils::rows_to_array;
use ndarray::{Array1, Array2};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Trains [`RbfNetwork`]s from a [`TrainerConfig`]
#[derive(Debug, Clone, Default)]
pub struct RbfTrainer {
    config: TrainerConfig,
}

impl RbfTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train on row vectors; the first row fixes the input dimensionality.
    pub fn fit_rows(&self, inputs: &[Vec<f64>], targets: &[f64]) -> Result<RbfNetwork> {
        let x = rows_to_array(inputs)?;
        let y = Array1::from_vec(targets.to_vec());
        self.fit(&x, &y)
    }

    /// Train on (already normalized) inputs with 0/1 targets.
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<RbfNetwork> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        self.fit_with_rng(x, y, &mut rng)
    }

    /// Train drawing every random choice from `rng`.
    pub fn fit_with_rng<R: Rng + ?Sized>(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        rng: &mut R,
    ) -> Result<RbfNetwork> {
        self.config.validate()?;
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(RbfError::DataError("training set is empty".to_string()));
        }
        if y.len() != x.nrows() {
            return Err(RbfError::shape(
                format!("{} targets", x.nrows()),
                format!("{} targets", y.len()),
            ));
        }

        let input_dim = x.ncols();
        let hidden = self.config.hidden_neurons;

        // Phase 1: centroids
        let mut kmeans = KMeans::new(hidden).with_max_iter(self.config.max_cluster_iter);
        kmeans.fit_with_rng(x, rng)?;
        let centroids = kmeans
            .into_centroids()
            .ok_or_else(|| RbfError::TrainingError("clustering produced no centroids".to_string()))?;

        // Phase 2: widths
        let sigmas = KnnWidthEstimator::new(self.config.sigma_neighbors).estimate(&centroids)?;
        debug!(?sigmas, "estimated kernel widths");

        // Phase 3: output layer, Xavier/Glorot uniform initialization
        let init_range = (6.0 / (input_dim + hidden) as f64).sqrt();
        let weights: Array1<f64> = (0..hidden)
            .map(|_| (rng.gen::<f64>() * 2.0 - 1.0) * init_range)
            .collect();
        let mut network = RbfNetwork::from_parts(centroids, sigmas, weights, 0.0)?;

        self.descend(&mut network, x, y);

        Ok(network)
    }

    /// Online momentum gradient descent over the output weights and bias.
    fn descend(&self, network: &mut RbfNetwork, x: &Array2<f64>, y: &Array1<f64>) {
        let momentum = self.config.momentum;
        let mut weight_velocity = Array1::<f64>::zeros(network.hidden_count());
        let mut bias_velocity = 0.0;

        for epoch in 0..self.config.epochs {
            let lr = self.config.learning_rate / (1.0 + self.config.lr_decay * epoch as f64);
            let mut log_loss = 0.0;

            for (row, &target) in x.rows().into_iter().zip(y.iter()) {
                let activations = network.hidden_activations(&row);
                let output = network.output(&activations);

                // d(log loss)/dz for a logistic output is (output - target);
                // stepping along (target - output) descends the loss.
                let error_gradient = target - output;

                for ((v, w), &a) in weight_velocity
                    .iter_mut()
                    .zip(network.weights_mut().iter_mut())
                    .zip(activations.iter())
                {
                    *v = lr * error_gradient * a + momentum * *v;
                    *w += *v;
                }

                bias_velocity = lr * error_gradient + momentum * bias_velocity;
                *network.bias_mut() += bias_velocity;

                let p = output.clamp(1e-12, 1.0 - 1e-12);
                log_loss -= target * p.ln() + (1.0 - target) * (1.0 - p).ln();
            }

            debug!(
                epoch,
                learning_rate = lr,
                log_loss = log_loss / x.nrows() as f64,
                "epoch complete"
            );
        }
    }
}

/// Train a network with the default momentum, decay and width settings.
pub fn train(
    inputs: &[Vec<f64>],
    targets: &[f64],
    hidden_neurons: usize,
    epochs: usize,
    learning_rate: f64,
    seed: u64,
) -> Result<RbfNetwork> {
    let config = TrainerConfig::new(hidden_neurons, epochs, learning_rate).with_seed(seed);
    RbfTrainer::new(config).fit_rows(inputs, targets)
}
