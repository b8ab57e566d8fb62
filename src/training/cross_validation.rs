//! K-fold cross-validation and grid search over hidden-neuron counts

use super::config::{FoldShuffle, GridSearchConfig, NormalizationScope};
use super::metrics::{ClassificationMetrics, MetricSummary, DEFAULT_THRESHOLD};
use super::trainer::RbfTrainer;
use crate::error::{RbfError, Result};
use crate::preprocessing::NormalizationStats;
use crate::utils::{gather, gather_rows, rows_to_array};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info};

/// A single train/test split
#[derive(Debug, Clone)]
pub struct CVSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Contiguous test windows over `0..n`.
///
/// Every window has `n / k` positions except the last, which also takes the
/// remainder, so the windows cover `0..n` exactly once.
pub fn fold_windows(n: usize, k: usize) -> Result<Vec<Range<usize>>> {
    if k < 2 {
        return Err(RbfError::invalid("k_folds", k, "must be at least 2"));
    }
    if n < k {
        return Err(RbfError::ValidationError(format!(
            "cannot split {} records into {} folds",
            n, k
        )));
    }
    let fold_size = n / k;
    Ok((0..k)
        .map(|f| {
            let start = f * fold_size;
            let end = if f == k - 1 { n } else { start + fold_size };
            start..end
        })
        .collect())
}

/// Seeded permutation of `0..n`.
pub fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

/// Shuffle `0..n` once and cut the permutation into `k` folds.
pub fn kfold_splits(n: usize, k: usize, seed: u64) -> Result<Vec<CVSplit>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    kfold_splits_with_rng(n, k, &mut rng)
}

/// Like [`kfold_splits`], drawing the permutation from `rng`.
pub fn kfold_splits_with_rng<R: Rng + ?Sized>(
    n: usize,
    k: usize,
    rng: &mut R,
) -> Result<Vec<CVSplit>> {
    let windows = fold_windows(n, k)?;
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    Ok(windows
        .into_iter()
        .enumerate()
        .map(|(fold_idx, window)| {
            let test_indices = indices[window.clone()].to_vec();
            let train_indices = indices[..window.start]
                .iter()
                .chain(indices[window.end..].iter())
                .copied()
                .collect();
            CVSplit {
                train_indices,
                test_indices,
                fold_idx,
            }
        })
        .collect())
}

/// Results of one fold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoldMetrics {
    pub fold_idx: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub metrics: ClassificationMetrics,
}

/// Fold results and their aggregates for one neuron count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigurationSummary {
    pub hidden_neurons: usize,
    pub folds: Vec<FoldMetrics>,
    pub accuracy: MetricSummary,
    pub precision: MetricSummary,
    pub recall: MetricSummary,
    pub f1: MetricSummary,
    pub auc: MetricSummary,
}

impl ConfigurationSummary {
    fn from_folds(hidden_neurons: usize, folds: Vec<FoldMetrics>) -> Self {
        let summarize = |pick: fn(&ClassificationMetrics) -> f64| {
            let samples: Vec<f64> = folds.iter().map(|f| pick(&f.metrics)).collect();
            MetricSummary::from_samples(&samples)
        };
        Self {
            hidden_neurons,
            accuracy: summarize(|m| m.accuracy),
            precision: summarize(|m| m.precision),
            recall: summarize(|m| m.recall),
            f1: summarize(|m| m.f1),
            auc: summarize(|m| m.auc),
            folds,
        }
    }
}

/// Output of a grid search, configurations in scan order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSearchReport {
    pub configurations: Vec<ConfigurationSummary>,
    /// Neuron count with the strictly highest mean accuracy; the earliest
    /// configuration wins ties
    pub best: Option<usize>,
}

impl GridSearchReport {
    pub fn best_configuration(&self) -> Option<&ConfigurationSummary> {
        let best = self.best?;
        self.configurations.iter().find(|c| c.hidden_neurons == best)
    }
}

/// Runs k-fold grid search with fresh trainers per fold
#[derive(Debug, Clone, Default)]
pub struct CrossValidator {
    config: GridSearchConfig,
}

impl CrossValidator {
    pub fn new(config: GridSearchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GridSearchConfig {
        &self.config
    }

    /// Search every neuron count of the configured range on raw features.
    pub fn grid_search(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<GridSearchReport> {
        self.config.validate()?;
        if y.len() != x.nrows() {
            return Err(RbfError::shape(
                format!("{} targets", x.nrows()),
                format!("{} targets", y.len()),
            ));
        }
        // also rejects n < k before any training starts
        fold_windows(x.nrows(), self.config.k_folds)?;

        let normalized = match self.config.normalization {
            NormalizationScope::Global => {
                let stats = NormalizationStats::compute(x)?;
                Some(stats.normalize_matrix(x)?)
            }
            NormalizationScope::PerFold => None,
        };

        let mut configurations = Vec::new();
        let mut best = None;
        let mut best_accuracy = 0.0;

        let mut shuffle_rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        for hidden_neurons in self.config.neuron_counts() {
            let (n, k) = (x.nrows(), self.config.k_folds);
            let splits = match self.config.fold_shuffle {
                FoldShuffle::Fixed => kfold_splits(n, k, self.config.seed)?,
                FoldShuffle::Continuous => kfold_splits_with_rng(n, k, &mut shuffle_rng)?,
            };
            let trainer = RbfTrainer::new(self.config.trainer_config(hidden_neurons));

            let run = |split: &CVSplit| match &normalized {
                Some(data) => evaluate_fold(&trainer, data, y, split),
                None => evaluate_fold_local(&trainer, x, y, split),
            };
            let folds: Vec<FoldMetrics> = if self.config.parallel {
                splits.par_iter().map(run).collect::<Result<_>>()?
            } else {
                splits.iter().map(run).collect::<Result<_>>()?
            };

            let summary = ConfigurationSummary::from_folds(hidden_neurons, folds);
            info!(
                hidden_neurons,
                accuracy = summary.accuracy.mean,
                accuracy_std = summary.accuracy.std_dev,
                f1 = summary.f1.mean,
                auc = summary.auc.mean,
                "configuration evaluated"
            );

            if summary.accuracy.mean > best_accuracy {
                best_accuracy = summary.accuracy.mean;
                best = Some(hidden_neurons);
            }
            configurations.push(summary);
        }

        if let Some(hidden_neurons) = best {
            info!(hidden_neurons, accuracy = best_accuracy, "best configuration");
        }

        Ok(GridSearchReport {
            configurations,
            best,
        })
    }
}

/// Train on the split's training rows of already normalized data and score
/// its test rows.
fn evaluate_fold(
    trainer: &RbfTrainer,
    x: &Array2<f64>,
    y: &Array1<f64>,
    split: &CVSplit,
) -> Result<FoldMetrics> {
    let x_train = gather_rows(x, &split.train_indices);
    let y_train = gather(y, &split.train_indices);
    let x_test = gather_rows(x, &split.test_indices);
    let y_test = gather(y, &split.test_indices);
    score_fold(trainer, split, &x_train, &y_train, &x_test, &y_test)
}

/// Like [`evaluate_fold`], but fits normalization on the training rows only.
fn evaluate_fold_local(
    trainer: &RbfTrainer,
    x: &Array2<f64>,
    y: &Array1<f64>,
    split: &CVSplit,
) -> Result<FoldMetrics> {
    let raw_train = gather_rows(x, &split.train_indices);
    let stats = NormalizationStats::compute(&raw_train)?;
    let x_train = stats.normalize_matrix(&raw_train)?;
    let x_test = stats.normalize_matrix(&gather_rows(x, &split.test_indices))?;
    let y_train = gather(y, &split.train_indices);
    let y_test = gather(y, &split.test_indices);
    score_fold(trainer, split, &x_train, &y_train, &x_test, &y_test)
}

fn score_fold(
    trainer: &RbfTrainer,
    split: &CVSplit,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    x_test: &Array2<f64>,
    y_test: &Array1<f64>,
) -> Result<FoldMetrics> {
    let network = trainer.fit(x_train, y_train)?;
    let scores = network.forward_batch(x_test)?;
    let metrics = ClassificationMetrics::evaluate(
        &scores.to_vec(),
        &y_test.to_vec(),
        DEFAULT_THRESHOLD,
    )?;
    debug!(
        fold = split.fold_idx,
        hidden_neurons = trainer.config().hidden_neurons,
        accuracy = metrics.accuracy,
        "fold evaluated"
    );
    Ok(FoldMetrics {
        fold_idx: split.fold_idx,
        n_train: split.train_indices.len(),
        n_test: split.test_indices.len(),
        metrics,
    })
}

/// Grid search on row vectors.
pub fn grid_search(
    data: &[Vec<f64>],
    targets: &[f64],
    config: &GridSearchConfig,
) -> Result<GridSearchReport> {
    let x = rows_to_array(data)?;
    let y = Array1::from_vec(targets.to_vec());
    CrossValidator::new(config.clone()).grid_search(&x, &y)
}
