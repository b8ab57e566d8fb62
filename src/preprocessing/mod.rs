//! Data preprocessing module
//!
//! Provides Z-score standardization for the RBF trainer:
//! - Column statistics computed once from a designated background dataset
//! - Forward and inverse transforms replaying those statistics
//! - A delimited text codec for storing the statistics next to a model

mod scaler;

pub use scaler::{decode_array, encode_array, NormalizationStats, MIN_STD_DEV};
