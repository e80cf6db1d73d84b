//! Amazon S3 Vectors index client.
//!
//! Implements `VectorIndex` from `firecmd-core` over the S3 Vectors JSON
//! API (`QueryVectors`, `PutVectors`). Ranking and key uniqueness are the
//! service's; results are returned in the order received.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use firecmd_core::vector::index::VectorIndex;
use firecmd_types::error::StoreError;
use firecmd_types::vector::{IndexRef, VectorMatch, VectorRecord};

use crate::aws::{AwsClient, store_upstream};

const SIGNING_SERVICE: &str = "s3vectors";

#[derive(Debug, Serialize)]
struct VectorData<'a> {
    float32: &'a [f32],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryVectorsRequest<'a> {
    vector_bucket_name: &'a str,
    index_name: &'a str,
    query_vector: VectorData<'a>,
    top_k: usize,
    return_metadata: bool,
    return_distance: bool,
}

#[derive(Debug, Deserialize)]
struct QueryVectorsResponse {
    #[serde(default)]
    vectors: Vec<QueryHit>,
}

#[derive(Debug, Deserialize)]
struct QueryHit {
    key: String,
    distance: Option<f32>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PutVectorsRequest<'a> {
    vector_bucket_name: &'a str,
    index_name: &'a str,
    vectors: Vec<PutVector<'a>>,
}

#[derive(Debug, Serialize)]
struct PutVector<'a> {
    key: &'a str,
    data: VectorData<'a>,
    metadata: &'a BTreeMap<String, String>,
}

/// Metadata values come back as arbitrary JSON; strings are kept as-is.
fn metadata_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl From<QueryHit> for VectorMatch {
    fn from(hit: QueryHit) -> Self {
        VectorMatch {
            key: hit.key,
            distance: hit.distance,
            metadata: hit
                .metadata
                .into_iter()
                .map(|(k, v)| (k, metadata_string(v)))
                .collect(),
        }
    }
}

/// S3 Vectors client for one region.
pub struct S3VectorIndex {
    aws: AwsClient,
    base_url: String,
}

impl S3VectorIndex {
    pub fn new(aws: AwsClient) -> Self {
        let base_url = aws.endpoint("s3vectors", "api.aws");
        Self { aws, base_url }
    }

    async fn post<T: Serialize>(&self, operation: &str, body: &T) -> Result<reqwest::Response, StoreError> {
        let url = format!("{}/{operation}", self.base_url);
        let response = self
            .aws
            .post_json(SIGNING_SERVICE, &url, body, &[])?
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(store_upstream(response).await);
        }
        Ok(response)
    }
}

impl VectorIndex for S3VectorIndex {
    async fn query(
        &self,
        index: &IndexRef,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, StoreError> {
        let body = QueryVectorsRequest {
            vector_bucket_name: &index.bucket,
            index_name: &index.index,
            query_vector: VectorData { float32: embedding },
            top_k,
            return_metadata: true,
            return_distance: true,
        };
        let response = self.post("QueryVectors", &body).await?;
        let parsed: QueryVectorsResponse = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(format!("QueryVectors: {e}")))?;

        debug!(index = %index.index, hits = parsed.vectors.len(), "vector query");
        Ok(parsed.vectors.into_iter().map(VectorMatch::from).collect())
    }

    async fn put(&self, index: &IndexRef, records: &[VectorRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        let body = PutVectorsRequest {
            vector_bucket_name: &index.bucket,
            index_name: &index.index,
            vectors: records
                .iter()
                .map(|r| PutVector {
                    key: &r.key,
                    data: VectorData { float32: &r.embedding },
                    metadata: &r.metadata,
                })
                .collect(),
        };
        self.post("PutVectors", &body).await?;
        debug!(index = %index.index, count = records.len(), "vectors written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_request_shape() {
        let body = QueryVectorsRequest {
            vector_bucket_name: "firecmd-vectors",
            index_name: "firestation",
            query_vector: VectorData { float32: &[0.5, 0.25] },
            top_k: 5,
            return_metadata: true,
            return_distance: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "vectorBucketName": "firecmd-vectors",
                "indexName": "firestation",
                "queryVector": {"float32": [0.5, 0.25]},
                "topK": 5,
                "returnMetadata": true,
                "returnDistance": true
            })
        );
    }

    #[test]
    fn test_query_response_keeps_order_and_stringifies_metadata() {
        let parsed: QueryVectorsResponse = serde_json::from_value(json!({
            "vectors": [
                {"key": "firestation_7", "distance": 0.1, "metadata": {"name": "서초소방서", "lat": 37.48}},
                {"key": "firestation_2", "distance": 0.3}
            ]
        }))
        .unwrap();
        let matches: Vec<VectorMatch> = parsed.vectors.into_iter().map(VectorMatch::from).collect();
        assert_eq!(matches[0].key, "firestation_7");
        assert_eq!(matches[0].field("name"), "서초소방서");
        assert_eq!(matches[0].field("lat"), "37.48");
        assert_eq!(matches[1].field("name"), "");
    }

    #[test]
    fn test_put_request_shape() {
        let record = VectorRecord {
            key: "cctv_0".to_string(),
            embedding: vec![1.0],
            metadata: BTreeMap::from([("cctvname".to_string(), "[경부선] 양재".to_string())]),
        };
        let body = PutVectorsRequest {
            vector_bucket_name: "b",
            index_name: "cctv",
            vectors: vec![PutVector {
                key: &record.key,
                data: VectorData { float32: &record.embedding },
                metadata: &record.metadata,
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["vectors"][0]["key"], "cctv_0");
        assert_eq!(value["vectors"][0]["data"]["float32"], json!([1.0]));
        assert_eq!(value["vectors"][0]["metadata"]["cctvname"], "[경부선] 양재");
    }

    #[test]
    fn test_empty_response_has_no_hits() {
        let parsed: QueryVectorsResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.vectors.is_empty());
    }
}
