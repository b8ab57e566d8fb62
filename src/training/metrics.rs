//! Classification and regression metrics

use crate::error::{RbfError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default decision threshold for a probability score.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Targets above this value count as the positive class.
#[inline]
fn is_positive(label: f64) -> bool {
    label > 0.5
}

/// Binary confusion matrix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// A score at or above `threshold` is predicted positive.
    pub fn from_scores(scores: &[f64], labels: &[f64], threshold: f64) -> Result<Self> {
        check_lengths(scores.len(), labels.len())?;
        let mut cm = Self::default();
        for (&score, &label) in scores.iter().zip(labels.iter()) {
            match (score >= threshold, is_positive(label)) {
                (true, true) => cm.tp += 1,
                (true, false) => cm.fp += 1,
                (false, false) => cm.tn += 1,
                (false, true) => cm.fn_ += 1,
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    pub fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r > 0.0 {
            2.0 * p * r / (p + r)
        } else {
            0.0
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den > 0 {
        num as f64 / den as f64
    } else {
        0.0
    }
}

fn check_lengths(predictions: usize, actuals: usize) -> Result<()> {
    if predictions != actuals {
        return Err(RbfError::shape(
            format!("{} actual values", predictions),
            format!("{} actual values", actuals),
        ));
    }
    Ok(())
}

/// Area under the ROC curve by the trapezoidal rule.
///
/// Pairs are swept in descending score order. Returns exactly 0.5 when the
/// labels contain only one class.
pub fn roc_auc(scores: &[f64], labels: &[f64]) -> Result<f64> {
    check_lengths(scores.len(), labels.len())?;

    let mut pairs: Vec<(f64, bool)> = scores
        .iter()
        .zip(labels.iter())
        .map(|(&s, &l)| (s, is_positive(l)))
        .collect();
    // stable sort keeps input order among equal scores
    pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

    let n_pos = pairs.iter().filter(|(_, p)| *p).count();
    let n_neg = pairs.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return Ok(0.5);
    }

    let (mut auc, mut prev_tpr, mut prev_fpr) = (0.0, 0.0, 0.0);
    let (mut pos_seen, mut neg_seen) = (0usize, 0usize);
    for (_, positive) in pairs {
        if positive {
            pos_seen += 1;
        } else {
            neg_seen += 1;
        }
        let tpr = pos_seen as f64 / n_pos as f64;
        let fpr = neg_seen as f64 / n_neg as f64;
        auc += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
        prev_tpr = tpr;
        prev_fpr = fpr;
    }
    Ok(auc)
}

/// Metrics for one evaluation of a binary classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub auc: f64,
    pub confusion: ConfusionMatrix,
}

impl ClassificationMetrics {
    pub fn evaluate(scores: &[f64], labels: &[f64], threshold: f64) -> Result<Self> {
        let confusion = ConfusionMatrix::from_scores(scores, labels, threshold)?;
        Ok(Self {
            accuracy: confusion.accuracy(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            auc: roc_auc(scores, labels)?,
            confusion,
        })
    }
}

impl fmt::Display for ClassificationMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy:  {:.2}%", self.accuracy * 100.0)?;
        writeln!(f, "Precision: {:.2}%", self.precision * 100.0)?;
        writeln!(f, "Recall:    {:.2}%", self.recall * 100.0)?;
        writeln!(f, "F1:        {:.2}%", self.f1 * 100.0)?;
        writeln!(f, "AUC-ROC:   {:.4}", self.auc)?;
        write!(
            f,
            "TP={} FP={} TN={} FN={}",
            self.confusion.tp, self.confusion.fp, self.confusion.tn, self.confusion.fn_
        )
    }
}

/// Best decision threshold found by [`sweep_thresholds`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSweep {
    pub threshold: f64,
    pub metrics: ClassificationMetrics,
}

/// Try thresholds 0.05, 0.10, ... 0.90 and keep the one with the highest
/// accuracy (first wins on ties). Falls back to 0.5 if no threshold scores
/// above zero.
pub fn sweep_thresholds(scores: &[f64], labels: &[f64]) -> Result<ThresholdSweep> {
    let mut best = ThresholdSweep {
        threshold: DEFAULT_THRESHOLD,
        metrics: ClassificationMetrics::evaluate(scores, labels, DEFAULT_THRESHOLD)?,
    };
    let mut best_accuracy = 0.0;

    for step in 1..=18 {
        let threshold = step as f64 * 0.05;
        let metrics = ClassificationMetrics::evaluate(scores, labels, threshold)?;
        if metrics.accuracy > best_accuracy {
            best_accuracy = metrics.accuracy;
            best = ThresholdSweep { threshold, metrics };
        }
    }
    Ok(best)
}

/// Mean and sample standard deviation of a metric over folds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std_dev: f64,
}

impl MetricSummary {
    /// Uses the unbiased (n - 1) estimator. One sample has zero spread; no
    /// samples give a zero summary.
    pub fn from_samples(samples: &[f64]) -> Self {
        match samples.len() {
            0 => Self::default(),
            1 => Self {
                mean: samples[0],
                std_dev: 0.0,
            },
            n => {
                let mean = samples.iter().sum::<f64>() / n as f64;
                let sum_sq: f64 = samples.iter().map(|v| (v - mean).powi(2)).sum();
                Self {
                    mean,
                    std_dev: (sum_sq / (n - 1) as f64).sqrt(),
                }
            }
        }
    }
}

impl fmt::Display for MetricSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} ± {:.4}", self.mean, self.std_dev)
    }
}

/// Error metrics for continuous predictions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub rmse: f64,
    /// RMSE divided by the range of the actual values
    pub nrmse: f64,
    pub r2: f64,
}

impl RegressionMetrics {
    pub fn compute(predictions: &[f64], actuals: &[f64]) -> Result<Self> {
        check_lengths(predictions.len(), actuals.len())?;
        if predictions.is_empty() {
            return Err(RbfError::DataError(
                "predictions and actuals must be non-empty".to_string(),
            ));
        }

        let n = predictions.len() as f64;
        let mut sum_abs = 0.0;
        let mut sum_sq = 0.0;
        let mut min_actual = f64::MAX;
        let mut max_actual = f64::MIN;
        for (&p, &a) in predictions.iter().zip(actuals.iter()) {
            let err = p - a;
            sum_abs += err.abs();
            sum_sq += err * err;
            min_actual = min_actual.min(a);
            max_actual = max_actual.max(a);
        }

        let rmse = (sum_sq / n).sqrt();
        let range = max_actual - min_actual;
        let mean_actual = actuals.iter().sum::<f64>() / n;
        let ss_tot: f64 = actuals.iter().map(|a| (a - mean_actual).powi(2)).sum();

        Ok(Self {
            mae: sum_abs / n,
            rmse,
            nrmse: if range > 0.0 { rmse / range } else { 0.0 },
            r2: if ss_tot > 0.0 { 1.0 - sum_sq / ss_tot } else { 0.0 },
        })
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MAE:   {:.4}", self.mae)?;
        writeln!(f, "RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "NRMSE: {:.2}%", self.nrmse * 100.0)?;
        write!(f, "R2:    {:.4}", self.r2)
    }
}

/// Regression metrics for parallel prediction/actual lists.
pub fn calculate_regression_metrics(predictions: &[f64], actuals: &[f64]) -> Result<RegressionMetrics> {
    RegressionMetrics::compute(predictions, actuals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_confusion_counts() {
        let scores = [0.9, 0.6, 0.4, 0.2, 0.5];
        let labels = [1.0, 0.0, 1.0, 0.0, 1.0];
        let cm = ConfusionMatrix::from_scores(&scores, &labels, 0.5).unwrap();
        assert_eq!(cm, ConfusionMatrix { tp: 2, fp: 1, tn: 1, fn_: 1 });
        assert_abs_diff_eq!(cm.accuracy(), 0.6);
        assert_abs_diff_eq!(cm.precision(), 2.0 / 3.0);
        assert_abs_diff_eq!(cm.recall(), 2.0 / 3.0);
        assert_abs_diff_eq!(cm.f1(), 2.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_denominators() {
        let cm = ConfusionMatrix::from_scores(&[0.1, 0.2], &[0.0, 0.0], 0.5).unwrap();
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
        assert_eq!(cm.accuracy(), 1.0);
        assert_eq!(ConfusionMatrix::default().accuracy(), 0.0);
    }

    #[test]
    fn test_auc_single_class_is_half() {
        assert_eq!(roc_auc(&[0.1, 0.9, 0.4], &[1.0, 1.0, 1.0]).unwrap(), 0.5);
        assert_eq!(roc_auc(&[0.3, 0.2], &[0.0, 0.0]).unwrap(), 0.5);
        assert_eq!(roc_auc(&[], &[]).unwrap(), 0.5);
    }

    #[test]
    fn test_auc_perfect_separation() {
        let scores = [0.9, 0.8, 0.7, 0.3, 0.2];
        let labels = [1.0, 1.0, 1.0, 0.0, 0.0];
        assert_eq!(roc_auc(&scores, &labels).unwrap(), 1.0);
    }

    #[test]
    fn test_auc_inverted_and_mixed() {
        let scores = [0.1, 0.2, 0.8, 0.9];
        let labels = [1.0, 1.0, 0.0, 0.0];
        assert_eq!(roc_auc(&scores, &labels).unwrap(), 0.0);

        // one inversion out of four positive/negative pairs
        let scores = [0.9, 0.6, 0.5, 0.1];
        let labels = [1.0, 0.0, 1.0, 0.0];
        assert_abs_diff_eq!(roc_auc(&scores, &labels).unwrap(), 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            roc_auc(&[0.1], &[1.0, 0.0]),
            Err(RbfError::ShapeError { .. })
        ));
        assert!(RegressionMetrics::compute(&[1.0], &[]).is_err());
    }

    #[test]
    fn test_summary_of_identical_values() {
        let s = MetricSummary::from_samples(&[0.83; 5]);
        assert_eq!(s.std_dev, 0.0);
        assert_abs_diff_eq!(s.mean, 0.83, epsilon = 1e-12);
    }

    #[test]
    fn test_summary_uses_sample_std() {
        let s = MetricSummary::from_samples(&[1.0, 2.0, 3.0, 4.0]);
        assert_abs_diff_eq!(s.mean, 2.5);
        assert_abs_diff_eq!(s.std_dev, (5.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_eq!(MetricSummary::from_samples(&[0.7]).std_dev, 0.0);
    }

    #[test]
    fn test_regression_metrics() {
        let predictions = [2.0, 4.0, 6.0];
        let actuals = [1.0, 4.0, 7.0];
        let m = calculate_regression_metrics(&predictions, &actuals).unwrap();
        assert_abs_diff_eq!(m.mae, 2.0 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.rmse, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(m.nrmse, (2.0f64 / 3.0).sqrt() / 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m.r2, 1.0 - 2.0 / 18.0, epsilon = 1e-12);
    }

    #[test]
    fn test_regression_degenerate_targets() {
        let m = RegressionMetrics::compute(&[1.0, 3.0], &[2.0, 2.0]).unwrap();
        assert_eq!(m.nrmse, 0.0);
        assert_eq!(m.r2, 0.0);
    }

    #[test]
    fn test_threshold_sweep() {
        // positives score around 0.3, negatives around 0.1: 0.5 misses them all
        let scores = [0.3, 0.32, 0.35, 0.1, 0.05, 0.12];
        let labels = [1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let sweep = sweep_thresholds(&scores, &labels).unwrap();
        assert_eq!(sweep.metrics.accuracy, 1.0);
        assert!(sweep.threshold > 0.12 && sweep.threshold <= 0.3);
        // 0.15 is the first threshold separating both groups
        assert_abs_diff_eq!(sweep.threshold, 0.15, epsilon = 1e-12);
    }
}
