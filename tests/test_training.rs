//! Integration test: normalization, clustering and network training

use approx::assert_abs_diff_eq;
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rbf_insight::preprocessing::NormalizationStats;
use rbf_insight::training::{train, KMeans, RbfTrainer, TrainerConfig};
use rbf_insight::inference::RbfClassifier;
use rbf_insight::RbfError;

/// Two noisy blobs in 3 features, on very different scales.
fn blobs(n_per_class: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for class in 0..2 {
        let c = class as f64;
        for _ in 0..n_per_class {
            rows.push(vec![
                c * 2.0 + rng.gen_range(-0.6..0.6),
                100.0 + c * 80.0 + rng.gen_range(-25.0..25.0),
                0.01 * c + rng.gen_range(-0.002..0.002),
            ]);
            labels.push(c);
        }
    }
    (rows, labels)
}

fn to_array(rows: &[Vec<f64>]) -> Array2<f64> {
    rbf_insight::utils::rows_to_array(rows).unwrap()
}

fn accuracy(scores: &Array1<f64>, labels: &[f64]) -> f64 {
    let correct = scores
        .iter()
        .zip(labels.iter())
        .filter(|(&s, &t)| (s >= 0.5) == (t > 0.5))
        .count();
    correct as f64 / labels.len() as f64
}

#[test]
fn test_normalization_properties() {
    let (rows, _) = blobs(30, 1);
    let mut x = to_array(&rows);
    // add a constant column
    x.column_mut(2).fill(7.0);

    let stats = NormalizationStats::compute(&x).unwrap();
    assert!(stats.std_dev().iter().all(|&s| s > 0.0));
    assert_eq!(stats.std_dev()[2], 1.0);

    let z = stats.normalize_matrix(&x).unwrap();
    for (raw, norm) in x.rows().into_iter().zip(z.rows()) {
        let back = stats.denormalize(&norm).unwrap();
        for (a, b) in raw.iter().zip(back.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }
}

#[test]
fn test_kmeans_assignments_are_nearest() {
    let (rows, _) = blobs(25, 2);
    let x = to_array(&rows);
    let x = NormalizationStats::compute(&x).unwrap().normalize_matrix(&x).unwrap();

    let mut kmeans = KMeans::new(4).with_random_state(9);
    kmeans.fit(&x).unwrap();
    assert!(kmeans.converged);

    let centroids = kmeans.centroids().unwrap();
    let labels = kmeans.labels().unwrap();
    for (i, row) in x.rows().into_iter().enumerate() {
        let dist = |c: usize| -> f64 {
            row.iter()
                .zip(centroids.row(c).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum()
        };
        let assigned = dist(labels[i]);
        for c in 0..centroids.nrows() {
            assert!(assigned <= dist(c));
        }
    }
}

#[test]
fn test_train_on_normalized_blobs() {
    let (rows, labels) = blobs(40, 3);
    let x = to_array(&rows);
    let stats = NormalizationStats::compute(&x).unwrap();
    let z = stats.normalize_matrix(&x).unwrap();
    let z_rows: Vec<Vec<f64>> = z.rows().into_iter().map(|r| r.to_vec()).collect();

    let network = train(&z_rows, &labels, 6, 80, 0.05, 42).unwrap();
    assert_eq!(network.input_dim(), 3);
    assert_eq!(network.hidden_count(), 6);

    let scores = network.forward_batch(&z).unwrap();
    assert!(scores.iter().all(|&s| s > 0.0 && s < 1.0));
    assert!(accuracy(&scores, &labels) > 0.9);
}

#[test]
fn test_training_is_reproducible() {
    let (rows, labels) = blobs(20, 4);
    let a = train(&rows, &labels, 5, 10, 0.01, 7).unwrap();
    let b = train(&rows, &labels, 5, 10, 0.01, 7).unwrap();
    let c = train(&rows, &labels, 5, 10, 0.01, 8).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_more_hidden_units_than_rows() {
    let rows = vec![vec![0.0, 0.0], vec![1.0, 1.0], vec![2.0, 0.5]];
    let labels = vec![0.0, 1.0, 1.0];
    let network = train(&rows, &labels, 6, 5, 0.01, 0).unwrap();
    assert_eq!(network.hidden_count(), 6);
    assert!(network.sigmas().iter().all(|&s| (0.1..=3.0).contains(&s)));
}

#[test]
fn test_train_input_errors() {
    assert!(matches!(
        train(&[], &[], 3, 10, 0.01, 0),
        Err(RbfError::DataError(_))
    ));
    assert!(matches!(
        train(&[vec![1.0, 2.0], vec![3.0]], &[0.0, 1.0], 3, 10, 0.01, 0),
        Err(RbfError::DataError(_))
    ));
    assert!(matches!(
        train(&[vec![1.0, 2.0]], &[0.0, 1.0], 3, 10, 0.01, 0),
        Err(RbfError::ShapeError { .. })
    ));
    assert!(matches!(
        train(&[vec![1.0, 2.0]], &[0.0], 0, 10, 0.01, 0),
        Err(RbfError::InvalidParameter { .. })
    ));
}

#[test]
fn test_classifier_on_raw_features() {
    let (rows, labels) = blobs(40, 5);
    let x = to_array(&rows);
    let y = Array1::from_vec(labels.clone());

    let config = TrainerConfig::new(6, 80, 0.05).with_seed(1);
    let model = RbfClassifier::fit(&x, &y, config.clone()).unwrap();
    let scores = model.predict_batch(&x).unwrap();
    assert!(accuracy(&scores, &labels) > 0.9);

    // same as training a network by hand on normalized data
    let stats = NormalizationStats::compute(&x).unwrap();
    let network = RbfTrainer::new(config)
        .fit(&stats.normalize_matrix(&x).unwrap(), &y)
        .unwrap();
    assert_eq!(model.network(), &network);
}
