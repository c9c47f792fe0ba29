use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::rest_url::rest_url;
use crate::application::VectorIndex;
use crate::domain::{
    CollectionInfo, CollectionSpec, Distance, DomainError, Point, PointId, ScoredPoint,
};

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";

/// Wire shape of a point in Qdrant's upsert payload.
#[derive(Serialize)]
struct QdrantPoint<'a> {
    id: &'a PointId,
    vector: &'a [f32],
    payload: &'a serde_json::Map<String, Value>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    points: Vec<QdrantPoint<'a>>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionDescription {
    config: CollectionConfig,
}

#[derive(Deserialize)]
struct CollectionConfig {
    params: CollectionParams,
}

#[derive(Deserialize)]
struct CollectionParams {
    #[serde(default)]
    vectors: Value,
}

/// Vector index backed by the Qdrant REST API.
pub struct QdrantVectorIndex {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantVectorIndex {
    pub fn new(base_url: impl AsRef<str>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.as_ref().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, DomainError> {
        let url = rest_url(&self.base_url, segments)?;
        let builder = self.client.request(method, url);
        Ok(match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        })
    }

    async fn send(&self, builder: RequestBuilder, action: &str) -> Result<reqwest::Response, DomainError> {
        let response = builder
            .send()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Qdrant returned {} while trying to {}: {}", status, action, body);
            return Err(DomainError::storage(format!(
                "Failed to {}: Qdrant returned {}",
                action, status
            )));
        }

        Ok(response)
    }

    fn vectors_config(spec: &CollectionSpec) -> Value {
        json!({
            "vectors": {
                "size": spec.dimension(),
                "distance": qdrant_distance(spec.distance()),
            }
        })
    }
}

fn qdrant_distance(distance: Distance) -> &'static str {
    match distance {
        Distance::Cosine => "Cosine",
        Distance::Euclid => "Euclid",
        Distance::Dot => "Dot",
    }
}

fn parse_distance(value: &str) -> Option<Distance> {
    match value {
        "Cosine" => Some(Distance::Cosine),
        "Euclid" => Some(Distance::Euclid),
        "Dot" => Some(Distance::Dot),
        _ => None,
    }
}

/// Reads the unnamed vector configuration. Named-vector layouts yield `None`.
fn collection_info(name: &str, vectors: &Value) -> CollectionInfo {
    CollectionInfo {
        name: name.to_string(),
        dimension: vectors
            .get("size")
            .and_then(Value::as_u64)
            .map(|size| size as usize),
        distance: vectors
            .get("distance")
            .and_then(Value::as_str)
            .and_then(parse_distance),
    }
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn get_collection(&self, name: &str) -> Result<Option<CollectionInfo>, DomainError> {
        let response = self
            .request(Method::GET, &["collections", name])?
            .send()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get collection: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DomainError::storage(format!(
                "Failed to get collection '{}': Qdrant returned {}",
                name,
                response.status()
            )));
        }

        let description: ApiResponse<CollectionDescription> = response
            .json()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to parse collection info: {}", e)))?;

        Ok(Some(collection_info(
            name,
            &description.result.config.params.vectors,
        )))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError> {
        let builder = self
            .request(Method::PUT, &["collections", spec.name()])?
            .json(&Self::vectors_config(spec));
        self.send(builder, "create collection").await?;
        debug!("Created Qdrant collection {}", spec.name());
        Ok(())
    }

    async fn recreate_collection(&self, spec: &CollectionSpec) -> Result<(), DomainError> {
        let response = self
            .request(Method::DELETE, &["collections", spec.name()])?
            .send()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete collection: {}", e)))?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(DomainError::storage(format!(
                "Failed to delete collection '{}': Qdrant returned {}",
                spec.name(),
                response.status()
            )));
        }

        self.create_collection(spec).await
    }

    async fn upsert(&self, collection: &str, points: &[Point]) -> Result<(), DomainError> {
        if points.is_empty() {
            return Ok(());
        }

        let request = UpsertRequest {
            points: points
                .iter()
                .map(|point| QdrantPoint {
                    id: point.id(),
                    vector: point.vector(),
                    payload: point.payload(),
                })
                .collect(),
        };

        let builder = self
            .request(Method::PUT, &["collections", collection, "points"])?
            .query(&[("wait", "true")])
            .json(&request);
        self.send(builder, "upsert points").await?;

        debug!("Saved {} points to Qdrant collection {}", points.len(), collection);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredPoint>, DomainError> {
        let request = SearchRequest {
            vector,
            limit,
            with_payload: true,
        };

        let builder = self
            .request(Method::POST, &["collections", collection, "points", "search"])?
            .json(&request);
        let response = self.send(builder, "search points").await?;

        let parsed: ApiResponse<Vec<ScoredPoint>> = response
            .json()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to parse search results: {}", e)))?;

        Ok(parsed.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn reads_unnamed_vector_config() {
        let info = collection_info("companies", &json!({"size": 384, "distance": "Cosine"}));
        assert_eq!(info.dimension, Some(384));
        assert_eq!(info.distance, Some(Distance::Cosine));
    }

    #[test]
    fn named_vectors_have_no_readable_dimension() {
        let info = collection_info(
            "companies",
            &json!({"text": {"size": 384, "distance": "Cosine"}}),
        );
        assert_eq!(info.dimension, None);
    }

    #[test]
    fn create_payload_uses_qdrant_distance_names() {
        let config = QdrantVectorIndex::vectors_config(&CollectionSpec::cosine("c", 8));
        assert_eq!(config, json!({"vectors": {"size": 8, "distance": "Cosine"}}));
    }

    #[tokio::test]
    async fn missing_collection_is_none() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/collections/companies")
            .with_status(404)
            .with_body(r#"{"status": {"error": "Not found"}}"#)
            .create_async()
            .await;

        let index = QdrantVectorIndex::new(server.url(), None);
        assert!(index.get_collection("companies").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_collection_reads_vector_size() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/collections/companies")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"result": {"status": "green", "config": {"params": {"vectors": {"size": 768, "distance": "Cosine"}}}}, "status": "ok"}"#,
            )
            .create_async()
            .await;

        let index = QdrantVectorIndex::new(server.url(), None);
        let info = index.get_collection("companies").await.unwrap().unwrap();

        assert_eq!(info.dimension, Some(768));
    }

    #[tokio::test]
    async fn upsert_waits_and_sends_api_key() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/collections/companies/points")
            .match_query(Matcher::UrlEncoded("wait".into(), "true".into()))
            .match_header("api-key", "secret")
            .match_body(Matcher::PartialJsonString(
                r#"{"points": [{"id": 7, "vector": [0.5, 0.5], "payload": {"name": "Acme"}}]}"#
                    .to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"result": {"operation_id": 1, "status": "completed"}, "status": "ok"}"#)
            .create_async()
            .await;

        let index = QdrantVectorIndex::new(server.url(), Some("secret".to_string()));
        let mut payload = serde_json::Map::new();
        payload.insert("name".to_string(), json!("Acme"));
        let point = Point::new(PointId::Integer(7), vec![0.5, 0.5], payload);

        index.upsert("companies", &[point]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn search_parses_scored_points() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/collections/companies/points/search")
            .match_body(Matcher::PartialJsonString(
                r#"{"limit": 5, "with_payload": true}"#.to_string(),
            ))
            .with_status(200)
            .with_body(
                r#"{"result": [{"id": 1, "version": 0, "score": 0.92, "payload": {"name": "FPT Software"}}], "status": "ok"}"#,
            )
            .create_async()
            .await;

        let index = QdrantVectorIndex::new(server.url(), None);
        let results = index.search("companies", &[0.1, 0.2], 5).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), &PointId::Integer(1));
        assert_eq!(results[0].payload()["name"], json!("FPT Software"));
    }

    #[tokio::test]
    async fn collection_names_cannot_escape_their_path_segment() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let index = QdrantVectorIndex::new(server.url(), None);
        let err = index
            .recreate_collection(&CollectionSpec::cosine("companies/points", 4))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::InvalidInput(_)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_become_storage_errors() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("PUT", "/collections/companies")
            .with_status(500)
            .create_async()
            .await;

        let index = QdrantVectorIndex::new(server.url(), None);
        let err = index
            .create_collection(&CollectionSpec::cosine("companies", 4))
            .await
            .unwrap_err();

        assert!(err.is_storage_error());
    }
}
