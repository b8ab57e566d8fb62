//! Integration test: model records and stores

use ndarray::{array, Array1, Array2};
use rbf_insight::export::{InMemoryStore, LocalStore, ModelRecord, ModelStore};
use rbf_insight::inference::RbfClassifier;
use rbf_insight::training::TrainerConfig;
use rbf_insight::RbfError;

fn trained(seed: u64) -> (RbfClassifier, Array2<f64>) {
    let x = array![
        [12.0, 0.4, 3.1],
        [11.5, 0.5, 2.9],
        [13.1, 0.3, 3.3],
        [25.0, 1.9, 0.2],
        [24.2, 2.1, 0.4],
        [26.3, 1.8, 0.1],
        [12.4, 0.6, 3.0],
        [25.5, 2.0, 0.3]
    ];
    let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 1.0];
    let model = RbfClassifier::fit(&x, &y, TrainerConfig::new(3, 40, 0.05).with_seed(seed)).unwrap();
    (model, x)
}

fn predictions(model: &RbfClassifier, x: &Array2<f64>) -> Array1<f64> {
    model.predict_batch(x).unwrap()
}

#[test]
fn test_local_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let (model, x) = trained(1);

    let store = LocalStore::open(dir.path()).unwrap();
    store.save("FoodClassifier_V1", &model).unwrap();

    // a fresh handle on the same directory sees the saved model
    let reopened = LocalStore::open(dir.path()).unwrap();
    let restored = reopened.load("FoodClassifier_V1").unwrap();
    assert_eq!(restored, model);
    assert_eq!(predictions(&restored, &x), predictions(&model, &x));
    assert_eq!(reopened.names().unwrap(), vec!["FoodClassifier_V1"]);
}

#[test]
fn test_latest_version_wins() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let (first, _) = trained(1);
    let (second, _) = trained(2);

    store.save("m", &first).unwrap();
    store.save("m", &second).unwrap();

    let history = store.history("m").unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].created_at <= history[1].created_at);
    assert_eq!(store.load("m").unwrap(), second);
}

#[test]
fn test_file_holds_delimited_arrays() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let (model, _) = trained(3);
    store.save("m", &model).unwrap();

    let text = std::fs::read_to_string(dir.path().join("m.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&text).unwrap();
    let record = &json[0];
    assert_eq!(record["hidden_count"], 3);
    assert_eq!(record["input_dim"], 3);
    let centroids = record["centroids"].as_str().unwrap();
    assert_eq!(centroids.split('|').count(), 3);
    assert!(centroids.split('|').all(|row| row.split(',').count() == 3));
    assert_eq!(record["sigmas"].as_str().unwrap().split(';').count(), 3);
}

#[test]
fn test_clear_then_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    let (model, _) = trained(4);
    store.save("a", &model).unwrap();
    store.save("b", &model).unwrap();
    assert_eq!(store.names().unwrap(), vec!["a", "b"]);

    store.clear().unwrap();
    assert!(store.names().unwrap().is_empty());
    assert!(matches!(store.load("a"), Err(RbfError::ModelNotFound(_))));
}

#[test]
fn test_corrupt_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let store = LocalStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.load("broken"),
        Err(RbfError::SerializationError(_))
    ));
}

#[test]
fn test_memory_store_matches_local_semantics() {
    let store = InMemoryStore::new();
    let (model, x) = trained(5);
    store.save("m", &model).unwrap();
    let restored = store.load("m").unwrap();
    assert_eq!(predictions(&restored, &x), predictions(&model, &x));
    assert!(matches!(store.load("other"), Err(RbfError::ModelNotFound(_))));
}

#[test]
fn test_record_validates_invariants() {
    let (model, _) = trained(6);
    let mut record = ModelRecord::new("m", &model);
    record.sigmas[0] = -1.0;
    assert!(record.to_classifier().is_err());

    let mut record = ModelRecord::new("m", &model);
    record.means.pop();
    assert!(matches!(
        RbfClassifier::try_from(record),
        Err(RbfError::ShapeError { .. })
    ));
}
