//! Inference module
//!
//! [`RbfClassifier`] bundles a trained network with the normalization
//! statistics fitted on its training data, so callers score raw feature rows
//! directly. It is the unit that gets persisted and explained.

mod classifier;

pub use classifier::RbfClassifier;
