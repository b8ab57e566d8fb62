//! Trained classifier: an RBF network paired with its normalization statistics

use crate::error::{RbfError, Result};
use crate::explainability::{Predictor, ShapleyExplainer};
use crate::preprocessing::NormalizationStats;
use crate::training::{RbfNetwork, RbfTrainer, TrainerConfig};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Classifier operating on raw (unnormalized) feature rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbfClassifier {
    network: RbfNetwork,
    stats: NormalizationStats,
}

impl RbfClassifier {
    /// Pair a network with the statistics its inputs were normalized with.
    pub fn new(network: RbfNetwork, stats: NormalizationStats) -> Result<Self> {
        if network.input_dim() != stats.n_features() {
            return Err(RbfError::shape(
                format!("{} normalization columns", network.input_dim()),
                format!("{} normalization columns", stats.n_features()),
            ));
        }
        Ok(Self { network, stats })
    }

    /// Fit normalization on `x`, then train a network on the normalized rows.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, config: TrainerConfig) -> Result<Self> {
        let stats = NormalizationStats::compute(x)?;
        let normalized = stats.normalize_matrix(x)?;
        let network = RbfTrainer::new(config).fit(&normalized, y)?;
        info!(
            n_samples = x.nrows(),
            n_features = x.ncols(),
            hidden = network.hidden_count(),
            "classifier trained"
        );
        Self::new(network, stats)
    }

    pub fn network(&self) -> &RbfNetwork {
        &self.network
    }

    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }

    pub fn n_features(&self) -> usize {
        self.network.input_dim()
    }

    /// Probability-like score in (0, 1) for one raw row.
    pub fn predict(&self, row: &ArrayView1<f64>) -> Result<f64> {
        let normalized = self.stats.normalize(row)?;
        self.network.forward(&normalized.view())
    }

    /// Scores for every raw row of `x`.
    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let normalized = self.stats.normalize_matrix(x)?;
        self.network.forward_batch(&normalized)
    }

    /// `true` when the score reaches `threshold`.
    pub fn classify(&self, row: &ArrayView1<f64>, threshold: f64) -> Result<bool> {
        Ok(self.predict(row)? >= threshold)
    }

    /// Explainer in raw feature space with the training mean as background.
    pub fn explainer(&self) -> Result<ShapleyExplainer<'_, Self>> {
        ShapleyExplainer::new(self, self.stats.background())
    }
}

impl Predictor for RbfClassifier {
    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        self.predict(&ArrayView1::from(features))
    }
}
