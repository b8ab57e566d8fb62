//! Model training module
//!
//! Provides the RBF network and everything needed to fit and assess it:
//! - K-Means centroid placement
//! - Nearest-neighbour kernel widths
//! - Online momentum gradient descent for the output layer
//! - Classification and regression metrics
//! - K-fold grid search over hidden-neuron counts

mod config;
mod trainer;
pub mod clustering;
pub mod cross_validation;
pub mod metrics;
pub mod rbf_network;
pub mod widths;

pub use config::{FoldShuffle, GridSearchConfig, NormalizationScope, TrainerConfig};
pub use trainer::{train, RbfTrainer};
pub use clustering::KMeans;
pub use cross_validation::{
    fold_windows, grid_search, kfold_splits, kfold_splits_with_rng, CVSplit, ConfigurationSummary,
    CrossValidator, FoldMetrics, GridSearchReport,
};
pub use metrics::{
    calculate_regression_metrics, roc_auc, sweep_thresholds, ClassificationMetrics,
    ConfusionMatrix, MetricSummary, RegressionMetrics, ThresholdSweep, DEFAULT_THRESHOLD,
};
pub use rbf_network::{sigmoid, RbfNetwork};
pub use widths::{estimate_widths, KnnWidthEstimator};
