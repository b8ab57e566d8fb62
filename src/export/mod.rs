//! Model persistence module
//!
//! Trained classifiers are flattened into [`ModelRecord`]s (plain numeric
//! arrays plus normalization statistics) and kept in a [`ModelStore`]:
//! - [`InMemoryStore`] for tests and embedding
//! - [`LocalStore`] for one JSON history file per model name

mod record;
mod store;

pub use record::{decode_centroids, encode_centroids, ModelRecord};
pub use store::{InMemoryStore, LocalStore, ModelStore};
