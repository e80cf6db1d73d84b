//! Vector index records.
//!
//! Reference rows (fire stations, CCTV feeds) are stored as embeddings with a
//! flat string metadata map and retrieved by nearest-neighbour similarity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Dimensionality of every embedding written to or queried from the index.
pub const EMBEDDING_DIMENSION: usize = 1024;

/// Records per write call when loading an index.
pub const PUT_BATCH_SIZE: usize = 50;

/// Names one index inside a vector bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRef {
    pub bucket: String,
    pub index: String,
}

impl IndexRef {
    pub fn new(bucket: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            index: index.into(),
        }
    }
}

/// A record written to the vector index. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// `<source>_<row-index>`, see [`record_key`].
    pub key: String,
    pub embedding: Vec<f32>,
    pub metadata: BTreeMap<String, String>,
}

/// Build the record key for row `row` of `source`.
pub fn record_key(source: &str, row: usize) -> String {
    format!("{source}_{row}")
}

/// A nearest-neighbour hit, in the index's ranking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorMatch {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl VectorMatch {
    /// Metadata value for `name`, or the empty string.
    pub fn field(&self, name: &str) -> &str {
        self.metadata.get(name).map(String::as_str).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_format() {
        assert_eq!(record_key("firestation", 0), "firestation_0");
        assert_eq!(record_key("cctv", 129), "cctv_129");
    }

    #[test]
    fn test_missing_metadata_field_is_empty() {
        let m = VectorMatch {
            key: "firestation_3".to_string(),
            distance: Some(0.12),
            metadata: BTreeMap::from([("name".to_string(), "서초소방서".to_string())]),
        };
        assert_eq!(m.field("name"), "서초소방서");
        assert_eq!(m.field("phone"), "");
    }
}
