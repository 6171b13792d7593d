//! # Vector Store Module
//!
//! ## Purpose
//! Qdrant-backed vector index collaborator: stores embedded chunks with their
//! legal metadata payloads and serves filtered similarity search.
//!
//! ## Input/Output Specification
//! - **Input**: Embeddings + texts + metadata triples, query vectors, filters
//! - **Output**: Point ids on insert (order preserving), ranked scored points
//!   on search
//! - **Payload shape**: `{text, created_at, document_id, chunk_index,
//!   total_chunks, document_type, ...legal metadata}`
//!
//! ## Key Features
//! - Collection bootstrap with cosine distance
//! - Metadata filters: exact match, value lists, `{gte, lte}` ranges
//! - Deletion of every chunk belonging to a document

use crate::config::VectorStoreConfig;
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

/// One retrieved chunk with its similarity score
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScoredPoint {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub metadata: Map<String, Value>,
}

/// Interface to the vector index collaborator
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist
    async fn ensure_collection(&self) -> Result<()>;

    /// Store embedded chunks; returns one id per input triple, in order
    async fn add_documents(
        &self,
        embeddings: Vec<Vec<f32>>,
        texts: Vec<String>,
        metadatas: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>>;

    /// Similarity search with optional metadata filters and score threshold
    async fn search(
        &self,
        query_embedding: Vec<f32>,
        top_k: usize,
        filters: Option<&Map<String, Value>>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>>;

    /// Remove every chunk belonging to the given document
    async fn delete_by_document(&self, document_id: &str) -> Result<()>;

    /// Number of points stored in the collection
    async fn count(&self) -> Result<u64>;
}

/// Qdrant REST client
pub struct QdrantStore {
    config: VectorStoreConfig,
    dimension: usize,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<RawPoint>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    id: Value,
    score: f32,
    #[serde(default)]
    payload: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    result: CountResult,
}

#[derive(Debug, Deserialize)]
struct CountResult {
    count: u64,
}

impl QdrantStore {
    /// Create a new store client
    pub fn new(config: VectorStoreConfig, dimension: usize) -> Result<Self> {
        let client = reqwest::Client::new();
        Ok(Self {
            config,
            dimension,
            client,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.url.trim_end_matches('/'), path);
        let mut builder = self.client.request(method, url);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.header("api-key", api_key);
        }
        builder
    }

    async fn check(&self, response: reqwest::Response, operation: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let details = response.text().await.unwrap_or_default();
            Err(RagError::VectorStore {
                details: format!("{} failed with status {}: {}", operation, status, details),
            })
        }
    }

    fn collection_path(&self, suffix: &str) -> String {
        format!("/collections/{}{}", self.config.collection_name, suffix)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self) -> Result<()> {
        let response = self
            .request(reqwest::Method::GET, &self.collection_path(""))
            .send()
            .await
            .map_err(|e| RagError::VectorStore {
                details: e.to_string(),
            })?;

        if response.status().is_success() {
            tracing::info!("Collection already exists: {}", self.config.collection_name);
            return Ok(());
        }

        let body = json!({
            "vectors": {
                "size": self.dimension,
                "distance": "Cosine",
            }
        });

        let response = self
            .request(reqwest::Method::PUT, &self.collection_path(""))
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::VectorStore {
                details: e.to_string(),
            })?;
        self.check(response, "create collection").await?;

        tracing::info!("Created collection: {}", self.config.collection_name);
        Ok(())
    }

    async fn add_documents(
        &self,
        embeddings: Vec<Vec<f32>>,
        texts: Vec<String>,
        metadatas: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>> {
        if embeddings.len() != texts.len() || texts.len() != metadatas.len() {
            return Err(RagError::VectorStore {
                details: format!(
                    "mismatched insert lengths: {} embeddings, {} texts, {} metadatas",
                    embeddings.len(),
                    texts.len(),
                    metadatas.len()
                ),
            });
        }

        let ids: Vec<String> = (0..embeddings.len())
            .map(|_| Uuid::new_v4().to_string())
            .collect();
        let created_at = Utc::now().to_rfc3339();

        let points: Vec<Value> = embeddings
            .into_iter()
            .zip(texts)
            .zip(metadatas)
            .zip(&ids)
            .map(|(((vector, text), metadata), id)| {
                let mut payload = Map::new();
                payload.insert("text".to_string(), Value::String(text));
                payload.insert("created_at".to_string(), Value::String(created_at.clone()));
                for (key, value) in metadata {
                    payload.insert(key, value);
                }
                json!({ "id": id, "vector": vector, "payload": payload })
            })
            .collect();

        tracing::info!("Uploading {} points to vector store", points.len());

        let response = self
            .request(
                reqwest::Method::PUT,
                &format!("{}?wait=true", self.collection_path("/points")),
            )
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|e| RagError::VectorStore {
                details: e.to_string(),
            })?;
        self.check(response, "upsert points").await?;

        Ok(ids)
    }

    async fn search(
        &self,
        query_embedding: Vec<f32>,
        top_k: usize,
        filters: Option<&Map<String, Value>>,
        score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        let mut body = json!({
            "vector": query_embedding,
            "limit": top_k,
            "with_payload": true,
        });

        if let Some(filters) = filters {
            if let Some(filter) = build_filter(filters) {
                body["filter"] = filter;
            }
        }
        if let Some(threshold) = score_threshold {
            body["score_threshold"] = json!(threshold);
        }

        let response = self
            .request(reqwest::Method::POST, &self.collection_path("/points/search"))
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::VectorStore {
                details: e.to_string(),
            })?;
        let response = self.check(response, "search").await?;

        let parsed: SearchResponse = response.json().await.map_err(|e| RagError::VectorStore {
            details: e.to_string(),
        })?;

        let results = parsed
            .result
            .into_iter()
            .map(|point| {
                let mut payload = point.payload;
                let text = payload
                    .remove("text")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                let id = match point.id {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                ScoredPoint {
                    id,
                    score: point.score,
                    text,
                    metadata: payload,
                }
            })
            .collect();

        Ok(results)
    }

    async fn delete_by_document(&self, document_id: &str) -> Result<()> {
        let body = json!({
            "filter": {
                "must": [
                    { "key": "document_id", "match": { "value": document_id } }
                ]
            }
        });

        let response = self
            .request(
                reqwest::Method::POST,
                &format!("{}?wait=true", self.collection_path("/points/delete")),
            )
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::VectorStore {
                details: e.to_string(),
            })?;
        self.check(response, "delete points").await?;

        tracing::info!("Deleted vector entries for document {}", document_id);
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        let response = self
            .request(reqwest::Method::POST, &self.collection_path("/points/count"))
            .json(&json!({ "exact": true }))
            .send()
            .await
            .map_err(|e| RagError::VectorStore {
                details: e.to_string(),
            })?;
        let response = self.check(response, "count").await?;

        let parsed: CountResponse = response.json().await.map_err(|e| RagError::VectorStore {
            details: e.to_string(),
        })?;
        Ok(parsed.result.count)
    }
}

/// Translate a flat filter map into a Qdrant filter.
///
/// Supported value shapes: scalar (exact match), list (match any) and
/// `{"gte": .., "lte": ..}` objects (range).
pub fn build_filter(filters: &Map<String, Value>) -> Option<Value> {
    let mut must: Vec<Value> = Vec::new();

    for (key, value) in filters {
        match value {
            Value::Object(range) if range.contains_key("gte") || range.contains_key("lte") => {
                let mut bounds = Map::new();
                if let Some(gte) = range.get("gte") {
                    bounds.insert("gte".to_string(), gte.clone());
                }
                if let Some(lte) = range.get("lte") {
                    bounds.insert("lte".to_string(), lte.clone());
                }
                must.push(json!({ "key": key, "range": bounds }));
            }
            Value::Array(values) => {
                must.push(json!({ "key": key, "match": { "any": values } }));
            }
            other => {
                must.push(json!({ "key": key, "match": { "value": other } }));
            }
        }
    }

    if must.is_empty() {
        None
    } else {
        Some(json!({ "must": must }))
    }
}
