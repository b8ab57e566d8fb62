//! rbf_insight - RBF network classification with exact explanations
//!
//! This crate provides a small, reproducible machine-learning core:
//! - Z-score normalization
//! - RBF network training (K-Means centroids, nearest-neighbour widths,
//!   online momentum gradient descent)
//! - Exact Shapley attribution by coalition enumeration
//! - K-fold grid search over hidden-neuron counts
//! - Model persistence as flat numeric records
//!
//! # Modules
//!
//! - [`preprocessing`] - Normalization statistics and array codecs
//! - [`training`] - Network, trainer, metrics and cross-validation
//! - [`inference`] - Trained classifier on raw feature rows
//! - [`explainability`] - Shapley values and global importance
//! - [`export`] - Model records and stores
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use rbf_insight::prelude::*;
//! use ndarray::array;
//!
//! let x = array![[0.1, 5.0], [0.2, 4.0], [0.9, 1.0], [1.0, 0.5]];
//! let y = array![0.0, 0.0, 1.0, 1.0];
//!
//! let model = RbfClassifier::fit(&x, &y, TrainerConfig::new(2, 50, 0.05))?;
//! let explanation = model.explainer()?.explain_instance(&x.row(3))?;
//! println!("{:?}", explanation.ranked());
//! # Ok::<(), rbf_insight::RbfError>(())
//! ```

// Core error handling
pub mod error;

// Core ML modules
pub mod preprocessing;
pub mod training;
pub mod inference;
pub mod explainability;

// Persistence
pub mod export;

// Utilities
pub mod utils;

// Services
pub mod cli;

pub use error::{RbfError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{RbfError, Result};

    // Preprocessing
    pub use crate::preprocessing::NormalizationStats;

    // Training
    pub use crate::training::{
        train, ClassificationMetrics, CrossValidator, GridSearchConfig, GridSearchReport,
        NormalizationScope, RbfNetwork, RbfTrainer, RegressionMetrics, TrainerConfig,
    };

    // Inference
    pub use crate::inference::RbfClassifier;

    // Explainability
    pub use crate::explainability::{GlobalImportance, Predictor, ShapleyExplainer, ShapleyExplanation};

    // Export
    pub use crate::export::{InMemoryStore, LocalStore, ModelRecord, ModelStore};
}
