//! Radial basis function network (inference side)
//!
//! A trained network holds fixed centroids and widths plus the output weights
//! and bias learned by [`RbfTrainer`](super::RbfTrainer). Inference is a pure
//! function of those parameters, so a network can be shared across threads.

use crate::error::{RbfError, Result};
use crate::utils::euclidean_sq;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

/// Logistic squashing function.
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Single-output RBF network with Gaussian hidden units and a logistic output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RbfNetwork {
    /// Hidden unit centers (hidden_count × input_dim)
    centroids: Array2<f64>,
    /// Gaussian width per hidden unit
    sigmas: Array1<f64>,
    /// Hidden-to-output weights
    weights: Array1<f64>,
    bias: f64,
}

impl RbfNetwork {
    /// Assemble a network, checking that every part agrees on the hidden
    /// count and that all widths are positive.
    pub fn from_parts(
        centroids: Array2<f64>,
        sigmas: Array1<f64>,
        weights: Array1<f64>,
        bias: f64,
    ) -> Result<Self> {
        let hidden = centroids.nrows();
        if hidden == 0 || centroids.ncols() == 0 {
            return Err(RbfError::DataError(format!(
                "network needs at least one hidden unit and one input, got {}x{}",
                hidden,
                centroids.ncols()
            )));
        }
        if sigmas.len() != hidden {
            return Err(RbfError::shape(format!("{} sigmas", hidden), sigmas.len()));
        }
        if weights.len() != hidden {
            return Err(RbfError::shape(format!("{} weights", hidden), weights.len()));
        }
        if let Some(bad) = sigmas.iter().find(|s| !(**s > 0.0) || !s.is_finite()) {
            return Err(RbfError::invalid("sigma", bad, "widths must be positive and finite"));
        }
        if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(RbfError::invalid("weights", bias, "weights and bias must be finite"));
        }
        Ok(Self {
            centroids,
            sigmas,
            weights,
            bias,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.centroids.ncols()
    }

    pub fn hidden_count(&self) -> usize {
        self.centroids.nrows()
    }

    pub fn centroids(&self) -> &Array2<f64> {
        &self.centroids
    }

    pub fn sigmas(&self) -> &Array1<f64> {
        &self.sigmas
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Score one input. Output lies in (0, 1).
    pub fn forward(&self, input: &ArrayView1<f64>) -> Result<f64> {
        self.check_input(input.len())?;
        let activations = self.hidden_activations(input);
        Ok(self.output(&activations))
    }

    /// Score every row of a matrix.
    pub fn forward_batch(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        self.check_input(x.ncols())?;
        Ok(x.rows()
            .into_iter()
            .map(|row| self.output(&self.hidden_activations(&row)))
            .collect())
    }

    /// Gaussian response of each hidden unit: `exp(-||x - c||² / (2σ²))`.
    ///
    /// The caller guarantees `input.len() == input_dim()`.
    pub(crate) fn hidden_activations(&self, input: &ArrayView1<f64>) -> Array1<f64> {
        self.centroids
            .rows()
            .into_iter()
            .zip(self.sigmas.iter())
            .map(|(c, &sigma)| (-euclidean_sq(input, &c) / (2.0 * sigma * sigma)).exp())
            .collect()
    }

    /// Logistic output from precomputed hidden activations.
    pub(crate) fn output(&self, activations: &Array1<f64>) -> f64 {
        sigmoid(self.bias + activations.dot(&self.weights))
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Array1<f64> {
        &mut self.weights
    }

    pub(crate) fn bias_mut(&mut self) -> &mut f64 {
        &mut self.bias
    }

    fn check_input(&self, len: usize) -> Result<()> {
        if len != self.input_dim() {
            return Err(RbfError::shape(
                format!("{} inputs", self.input_dim()),
                format!("{} inputs", len),
            ));
        }
        Ok(())
    }
}
