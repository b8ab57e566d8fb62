//! Model explainability module
//!
//! Feature attribution for any [`Predictor`]:
//! - Exact Shapley values by coalition enumeration (local)
//! - Mean absolute Shapley values over a dataset (global)
//! - One-at-a-time value replacement, a cheap approximation of both

mod shapley;

pub use shapley::{
    explain_global, explain_instance, GlobalImportance, Predictor, ShapleyExplainer,
    ShapleyExplanation, MAX_EXACT_FEATURES,
};
