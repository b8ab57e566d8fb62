//! Exact Shapley values by coalition enumeration
//!
//! Attribution is interventional: a feature that is "absent" from a coalition
//! takes its background value (normally the training mean). Each instance
//! costs `n * 2^n` model evaluations, so exact enumeration is refused beyond
//! [`MAX_EXACT_FEATURES`] features.

use crate::error::{RbfError, Result};
use crate::training::RbfNetwork;
use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Largest feature count accepted by exact enumeration.
pub const MAX_EXACT_FEATURES: usize = 20;

/// A scalar-output model that can be evaluated one feature vector at a time.
///
/// Must be safe to call from several threads at once.
pub trait Predictor: Sync {
    fn predict_one(&self, features: &[f64]) -> Result<f64>;
}

impl<F> Predictor for F
where
    F: Fn(&[f64]) -> Result<f64> + Sync,
{
    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        self(features)
    }
}

impl Predictor for RbfNetwork {
    fn predict_one(&self, features: &[f64]) -> Result<f64> {
        self.forward(&ArrayView1::from(features))
    }
}

/// Attribution of one prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapleyExplanation {
    /// Model output at the background vector
    pub base_value: f64,
    /// Model output at the explained instance
    pub prediction: f64,
    /// One value per feature
    pub values: Array1<f64>,
}

impl ShapleyExplanation {
    pub fn total(&self) -> f64 {
        self.values.sum()
    }

    /// `(feature_index, value)` pairs by descending magnitude.
    pub fn ranked(&self) -> Vec<(usize, f64)> {
        rank_by_magnitude(&self.values)
    }
}

/// Mean absolute attribution over a dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalImportance {
    pub mean_abs: Array1<f64>,
    pub n_rows: usize,
}

impl GlobalImportance {
    pub fn ranked(&self) -> Vec<(usize, f64)> {
        rank_by_magnitude(&self.mean_abs)
    }
}

fn rank_by_magnitude(values: &Array1<f64>) -> Vec<(usize, f64)> {
    let mut ranked: Vec<(usize, f64)> = values.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    ranked
}

/// Shapley explainer over a borrowed model and a fixed background vector
pub struct ShapleyExplainer<'a, P: ?Sized> {
    model: &'a P,
    background: Vec<f64>,
    /// `factorials[i] = i!` for `i` in `0..=n_features`
    factorials: Vec<f64>,
}

impl<'a, P: Predictor + ?Sized> ShapleyExplainer<'a, P> {
    /// Fails if the background is empty or wider than [`MAX_EXACT_FEATURES`].
    pub fn new(model: &'a P, background: Array1<f64>) -> Result<Self> {
        let n = background.len();
        if n == 0 {
            return Err(RbfError::DataError("background vector is empty".to_string()));
        }
        if n > MAX_EXACT_FEATURES {
            return Err(RbfError::invalid(
                "n_features",
                n,
                "exact Shapley enumeration supports at most 20 features",
            ));
        }

        let mut factorials = vec![1.0; n + 1];
        for i in 1..=n {
            factorials[i] = factorials[i - 1] * i as f64;
        }

        Ok(Self {
            model,
            background: background.to_vec(),
            factorials,
        })
    }

    pub fn n_features(&self) -> usize {
        self.background.len()
    }

    pub fn background(&self) -> &[f64] {
        &self.background
    }

    pub fn model(&self) -> &'a P {
        self.model
    }

    /// Exact Shapley values plus the base value and prediction.
    pub fn explain_instance(&self, instance: &ArrayView1<f64>) -> Result<ShapleyExplanation> {
        let values = self.shapley_values(instance)?;
        let base_value = self.model.predict_one(&self.background)?;
        let prediction = self.model.predict_one(&instance.to_vec())?;
        Ok(ShapleyExplanation {
            base_value,
            prediction,
            values,
        })
    }

    /// Exact Shapley values for one instance.
    ///
    /// For each feature `j`, every subset `S` of the other features is
    /// visited and `j`'s marginal effect on `S` is weighted by
    /// `|S|! (n - |S| - 1)! / n!`.
    pub fn shapley_values(&self, instance: &ArrayView1<f64>) -> Result<Array1<f64>> {
        let n = self.check_width(instance.len())?;
        let instance = instance.to_vec();
        let mut shap = Array1::<f64>::zeros(n);

        for j in 0..n {
            let others: Vec<usize> = (0..n).filter(|&i| i != j).collect();
            let mut total = 0.0;

            for mask in 0usize..(1usize << others.len()) {
                let mut absent = self.background.clone();
                for (bit, &feature) in others.iter().enumerate() {
                    if mask & (1 << bit) != 0 {
                        absent[feature] = instance[feature];
                    }
                }
                let mut present = absent.clone();
                present[j] = instance[j];

                let size = mask.count_ones() as usize;
                let weight =
                    self.factorials[size] * self.factorials[n - size - 1] / self.factorials[n];
                total += weight
                    * (self.model.predict_one(&present)? - self.model.predict_one(&absent)?);
            }

            shap[j] = total;
        }

        Ok(shap)
    }

    /// Mean absolute Shapley value per feature over every row of `data`.
    ///
    /// Rows are explained in parallel; each worker accumulates its own
    /// partial sum and the partials are added at the end.
    pub fn explain_global(&self, data: &Array2<f64>) -> Result<GlobalImportance> {
        self.mean_abs_over_rows(data, |row| self.shapley_values(row))
    }

    /// `f(x) - f(x with feature i at its background value)` for each `i`.
    ///
    /// A one-at-a-time approximation: cheap, but ignores interactions.
    pub fn replacement_attribution(&self, instance: &ArrayView1<f64>) -> Result<Array1<f64>> {
        let n = self.check_width(instance.len())?;
        let instance = instance.to_vec();
        let full = self.model.predict_one(&instance)?;

        let mut values = Array1::<f64>::zeros(n);
        let mut replaced = instance.clone();
        for i in 0..n {
            replaced[i] = self.background[i];
            values[i] = full - self.model.predict_one(&replaced)?;
            replaced[i] = instance[i];
        }
        Ok(values)
    }

    /// Mean absolute [`replacement_attribution`](Self::replacement_attribution)
    /// over every row of `data`.
    pub fn replacement_importance(&self, data: &Array2<f64>) -> Result<GlobalImportance> {
        self.mean_abs_over_rows(data, |row| self.replacement_attribution(row))
    }

    fn mean_abs_over_rows<A>(&self, data: &Array2<f64>, attribute: A) -> Result<GlobalImportance>
    where
        A: Fn(&ArrayView1<f64>) -> Result<Array1<f64>> + Sync,
    {
        let n = self.check_width(data.ncols())?;
        let n_rows = data.nrows();
        if n_rows == 0 {
            return Err(RbfError::DataError("no rows to explain".to_string()));
        }

        let sums = data
            .axis_iter(Axis(0))
            .into_par_iter()
            .try_fold(
                || Array1::<f64>::zeros(n),
                |mut acc, row| {
                    let values = attribute(&row)?;
                    acc.zip_mut_with(&values, |a, v| *a += v.abs());
                    Ok::<_, RbfError>(acc)
                },
            )
            .try_reduce(|| Array1::<f64>::zeros(n), |a, b| Ok(a + b))?;

        debug!(n_rows, n_features = n, "global attribution complete");

        Ok(GlobalImportance {
            mean_abs: sums / n_rows as f64,
            n_rows,
        })
    }

    fn check_width(&self, len: usize) -> Result<usize> {
        if len != self.background.len() {
            return Err(RbfError::shape(
                format!("{} features", self.background.len()),
                format!("{} features", len),
            ));
        }
        Ok(len)
    }
}

/// Exact Shapley values of `instance` under `model`, against `background`.
pub fn explain_instance<P: Predictor + ?Sized>(
    model: &P,
    instance: &ArrayView1<f64>,
    background: &Array1<f64>,
) -> Result<Array1<f64>> {
    ShapleyExplainer::new(model, background.clone())?.shapley_values(instance)
}

/// Mean absolute exact Shapley values over `data`; all entries are non-negative.
pub fn explain_global<P: Predictor + ?Sized>(
    model: &P,
    data: &Array2<f64>,
    background: &Array1<f64>,
) -> Result<Array1<f64>> {
    Ok(ShapleyExplainer::new(model, background.clone())?
        .explain_global(data)?
        .mean_abs)
}
