//! Flat, text-friendly model records
//!
//! A record stores every parameter of an [`RbfClassifier`] as plain numbers.
//! In JSON the vectors are written as `;`-joined strings and the centroid
//! block as `,`-joined rows separated by `|`.

use crate::error::{RbfError, Result};
use crate::inference::RbfClassifier;
use crate::preprocessing::{decode_array, encode_array, NormalizationStats};
use crate::training::RbfNetwork;
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// One saved version of a named model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub name: String,
    pub input_dim: usize,
    pub hidden_count: usize,
    pub bias: f64,
    #[serde(with = "delimited")]
    pub weights: Vec<f64>,
    #[serde(with = "delimited")]
    pub sigmas: Vec<f64>,
    /// hidden_count × input_dim
    #[serde(with = "centroid_block")]
    pub centroids: Array2<f64>,
    #[serde(with = "delimited")]
    pub means: Vec<f64>,
    #[serde(with = "delimited")]
    pub std_devs: Vec<f64>,
    pub created_at: DateTime<Utc>,
}

impl ModelRecord {
    /// Snapshot a classifier under `name`, stamped with the current time.
    pub fn new(name: impl Into<String>, model: &RbfClassifier) -> Self {
        let network = model.network();
        Self {
            name: name.into(),
            input_dim: network.input_dim(),
            hidden_count: network.hidden_count(),
            bias: network.bias(),
            weights: network.weights().to_vec(),
            sigmas: network.sigmas().to_vec(),
            centroids: network.centroids().clone(),
            means: model.stats().mean().to_vec(),
            std_devs: model.stats().std_dev().to_vec(),
            created_at: Utc::now(),
        }
    }

    /// Rebuild the classifier, checking every dimension against the header.
    pub fn to_classifier(&self) -> Result<RbfClassifier> {
        if self.centroids.dim() != (self.hidden_count, self.input_dim) {
            return Err(RbfError::shape(
                format!("{}x{} centroids", self.hidden_count, self.input_dim),
                format!("{}x{} centroids", self.centroids.nrows(), self.centroids.ncols()),
            ));
        }
        if self.means.len() != self.input_dim {
            return Err(RbfError::shape(
                format!("{} means", self.input_dim),
                self.means.len(),
            ));
        }
        let network = RbfNetwork::from_parts(
            self.centroids.clone(),
            Array1::from_vec(self.sigmas.clone()),
            Array1::from_vec(self.weights.clone()),
            self.bias,
        )?;
        let stats = NormalizationStats::from_parts(
            Array1::from_vec(self.means.clone()),
            Array1::from_vec(self.std_devs.clone()),
        )?;
        RbfClassifier::new(network, stats)
    }
}

impl TryFrom<ModelRecord> for RbfClassifier {
    type Error = RbfError;

    fn try_from(record: ModelRecord) -> Result<Self> {
        record.to_classifier()
    }
}

/// Join each centroid's coordinates with `,` and the rows with `|`.
pub fn encode_centroids(centroids: &Array2<f64>) -> String {
    centroids
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Parse a centroid block written by [`encode_centroids`].
pub fn decode_centroids(data: &str) -> Result<Array2<f64>> {
    if data.trim().is_empty() {
        return Err(RbfError::SerializationError("centroid block is empty".to_string()));
    }
    let rows = data
        .split('|')
        .map(|row| {
            row.split(',')
                .map(|s| {
                    s.trim().parse::<f64>().map_err(|e| {
                        RbfError::SerializationError(format!("invalid number '{}': {}", s, e))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<_>>>()?;

    let width = rows[0].len();
    if rows.iter().any(|r| r.len() != width) {
        return Err(RbfError::SerializationError(
            "centroid rows have different lengths".to_string(),
        ));
    }
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Ok(Array2::from_shape_vec((flat.len() / width, width), flat)?)
}

mod delimited {
    use super::{decode_array, encode_array};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[f64], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_array(values))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode_array(&text).map_err(serde::de::Error::custom)
    }
}

mod centroid_block {
    use super::{decode_centroids, encode_centroids};
    use ndarray::Array2;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        centroids: &Array2<f64>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode_centroids(centroids))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Array2<f64>, D::Error> {
        let text = String::deserialize(deserializer)?;
        decode_centroids(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn classifier() -> RbfClassifier {
        let network = RbfNetwork::from_parts(
            array![[0.5, -1.25], [2.0, 0.1]],
            array![0.75, 1.5],
            array![0.3, -0.2],
            0.05,
        )
        .unwrap();
        let stats = NormalizationStats::from_parts(array![10.0, 3.5], array![2.0, 0.25]).unwrap();
        RbfClassifier::new(network, stats).unwrap()
    }

    #[test]
    fn test_centroid_block_format() {
        let block = encode_centroids(&array![[1.0, 2.5], [-3.0, 0.125]]);
        assert_eq!(block, "1,2.5|-3,0.125");
        assert_eq!(decode_centroids(&block).unwrap(), array![[1.0, 2.5], [-3.0, 0.125]]);
    }

    #[test]
    fn test_centroid_block_errors() {
        assert!(decode_centroids("").is_err());
        assert!(decode_centroids("1,2|3").is_err());
        assert!(decode_centroids("1,x").is_err());
    }

    #[test]
    fn test_record_rebuilds_classifier() {
        let clf = classifier();
        let record = ModelRecord::new("FoodClassifier_V1", &clf);
        assert_eq!(record.hidden_count, 2);
        assert_eq!(record.input_dim, 2);
        let restored = RbfClassifier::try_from(record).unwrap();
        assert_eq!(restored, clf);
    }

    #[test]
    fn test_json_uses_delimited_text() {
        let record = ModelRecord::new("m", &classifier());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["weights"], "0.3;-0.2");
        assert_eq!(json["centroids"], "0.5,-1.25|2,0.1");
        assert_eq!(json["std_devs"], "2;0.25");

        let back: ModelRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_inconsistent_record_rejected() {
        let mut record = ModelRecord::new("m", &classifier());
        record.hidden_count = 3;
        assert!(matches!(record.to_classifier(), Err(RbfError::ShapeError { .. })));

        let mut record = ModelRecord::new("m", &classifier());
        record.sigmas = vec![0.75];
        assert!(record.to_classifier().is_err());

        let mut record = ModelRecord::new("m", &classifier());
        record.std_devs = vec![2.0, 0.0];
        assert!(record.to_classifier().is_err());
    }
}
