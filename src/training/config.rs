//! Training and grid-search configuration

use crate::error::{RbfError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Hyperparameters for a single RBF training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Number of RBF hidden units (K-Means clusters)
    pub hidden_neurons: usize,
    /// Passes over the training set
    pub epochs: usize,
    /// Initial learning rate
    pub learning_rate: f64,
    /// Momentum coefficient for weight and bias velocities
    pub momentum: f64,
    /// Decay factor in `lr / (1 + decay * epoch)`
    pub lr_decay: f64,
    /// Neighbours averaged by the width heuristic
    pub sigma_neighbors: usize,
    /// Iteration cap for centroid clustering
    pub max_cluster_iter: usize,
    /// Seed for clustering and weight initialization
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            hidden_neurons: 25,
            epochs: 100,
            learning_rate: 0.01,
            momentum: 0.9,
            lr_decay: 0.01,
            sigma_neighbors: 2,
            max_cluster_iter: 100,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    pub fn new(hidden_neurons: usize, epochs: usize, learning_rate: f64) -> Self {
        Self {
            hidden_neurons,
            epochs,
            learning_rate,
            ..Default::default()
        }
    }

    pub fn with_hidden_neurons(mut self, hidden_neurons: usize) -> Self {
        self.hidden_neurons = hidden_neurons;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if self.hidden_neurons == 0 {
            return Err(RbfError::invalid("hidden_neurons", 0, "must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(RbfError::invalid("epochs", 0, "must be at least 1"));
        }
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(RbfError::invalid(
                "learning_rate",
                self.learning_rate,
                "must be a positive finite number",
            ));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(RbfError::invalid("momentum", self.momentum, "must lie in [0, 1)"));
        }
        if !(self.lr_decay >= 0.0) {
            return Err(RbfError::invalid("lr_decay", self.lr_decay, "must be non-negative"));
        }
        if self.sigma_neighbors == 0 {
            return Err(RbfError::invalid("sigma_neighbors", 0, "must be at least 1"));
        }
        if self.max_cluster_iter == 0 {
            return Err(RbfError::invalid("max_cluster_iter", 0, "must be at least 1"));
        }
        Ok(())
    }

    /// Load from a JSON file; missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

/// How fold permutations relate across the configurations of a grid search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FoldShuffle {
    /// Reseed for every configuration, so all neuron counts share the same folds
    #[default]
    Fixed,
    /// One generator advanced across configurations; each gets a fresh permutation
    Continuous,
}

/// Where normalization statistics come from during cross-validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum NormalizationScope {
    /// One set of statistics over the whole dataset, shared by all folds
    #[default]
    Global,
    /// Statistics refit on each fold's training partition only
    PerFold,
}

/// Grid search over hidden-neuron counts with k-fold cross-validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSearchConfig {
    pub k_folds: usize,
    pub start_neurons: usize,
    pub end_neurons: usize,
    pub step: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    /// Seed for fold shuffling and for every fold's trainer
    pub seed: u64,
    pub normalization: NormalizationScope,
    pub fold_shuffle: FoldShuffle,
    /// Train the folds of a configuration on the rayon pool
    pub parallel: bool,
}

impl Default for GridSearchConfig {
    fn default() -> Self {
        Self {
            k_folds: 5,
            start_neurons: 5,
            end_neurons: 25,
            step: 5,
            epochs: 100,
            learning_rate: 0.01,
            seed: 42,
            normalization: NormalizationScope::Global,
            fold_shuffle: FoldShuffle::Fixed,
            parallel: true,
        }
    }
}

impl GridSearchConfig {
    pub fn new(k_folds: usize, start_neurons: usize, end_neurons: usize, step: usize) -> Self {
        Self {
            k_folds,
            start_neurons,
            end_neurons,
            step,
            ..Default::default()
        }
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_normalization(mut self, normalization: NormalizationScope) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_fold_shuffle(mut self, fold_shuffle: FoldShuffle) -> Self {
        self.fold_shuffle = fold_shuffle;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Neuron counts visited by the search, in scan order.
    pub fn neuron_counts(&self) -> Vec<usize> {
        (self.start_neurons..=self.end_neurons)
            .step_by(self.step.max(1))
            .collect()
    }

    /// Trainer settings for one configuration of the grid.
    pub fn trainer_config(&self, hidden_neurons: usize) -> TrainerConfig {
        TrainerConfig::new(hidden_neurons, self.epochs, self.learning_rate).with_seed(self.seed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k_folds < 2 {
            return Err(RbfError::invalid("k_folds", self.k_folds, "must be at least 2"));
        }
        if self.start_neurons < 1 {
            return Err(RbfError::invalid("start_neurons", self.start_neurons, "must be at least 1"));
        }
        if self.end_neurons < self.start_neurons {
            return Err(RbfError::invalid(
                "end_neurons",
                self.end_neurons,
                "must not be below start_neurons",
            ));
        }
        if self.step < 1 {
            return Err(RbfError::invalid("step", self.step, "must be at least 1"));
        }
        self.trainer_config(self.start_neurons).validate()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_trainer_defaults_are_valid() {
        let config = TrainerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.momentum, 0.9);
        assert_eq!(config.sigma_neighbors, 2);
    }

    #[test]
    fn test_trainer_validation() {
        assert!(TrainerConfig::new(0, 10, 0.1).validate().is_err());
        assert!(TrainerConfig::new(3, 0, 0.1).validate().is_err());
        assert!(TrainerConfig::new(3, 10, 0.0).validate().is_err());
        assert!(TrainerConfig::new(3, 10, f64::NAN).validate().is_err());
    }

    #[test]
    fn test_grid_validation() {
        assert!(GridSearchConfig::new(1, 5, 5, 1).validate().is_err());
        assert!(GridSearchConfig::new(5, 0, 5, 1).validate().is_err());
        assert!(GridSearchConfig::new(5, 6, 5, 1).validate().is_err());
        assert!(GridSearchConfig::new(5, 5, 5, 0).validate().is_err());
        assert!(GridSearchConfig::new(5, 5, 5, 1).validate().is_ok());
    }

    #[test]
    fn test_neuron_counts() {
        assert_eq!(GridSearchConfig::new(5, 5, 20, 5).neuron_counts(), vec![5, 10, 15, 20]);
        assert_eq!(GridSearchConfig::new(5, 5, 22, 5).neuron_counts(), vec![5, 10, 15, 20]);
        assert_eq!(GridSearchConfig::new(5, 5, 5, 3).neuron_counts(), vec![5]);
    }

    #[test]
    fn test_config_from_json_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"hidden_neurons": 8, "epochs": 20}}"#).unwrap();
        let config = TrainerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.hidden_neurons, 8);
        assert_eq!(config.epochs, 20);
        assert_eq!(config.learning_rate, 0.01);
    }
}
