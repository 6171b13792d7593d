//! # Embedding Module
//!
//! ## Purpose
//! Client for the embedding-model collaborator that turns chunk and query
//! text into dense vectors for indexing and retrieval.
//!
//! ## Input/Output Specification
//! - **Input**: Texts to embed (single query or chunk batches)
//! - **Output**: One vector per input text, order preserving, fixed dimension
//! - **Model**: Served over HTTP by a text-embeddings inference service
//!
//! ## Key Features
//! - Batched embedding generation with configurable batch size
//! - Dimension verification against the configured model output
//! - Concurrent query-embedding cache with bounded size

use crate::config::EmbeddingConfig;
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use std::time::Duration;

/// Maximum cached query embeddings
const QUERY_CACHE_CAPACITY: usize = 1024;

/// Interface to the embedding collaborator
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts; the result preserves input order
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text (typically a search query)
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Vector dimension produced by this embedder
    fn dimension(&self) -> usize;
}

/// HTTP client for a text-embeddings inference service
pub struct HttpEmbedder {
    config: EmbeddingConfig,
    client: reqwest::Client,
    query_cache: DashMap<String, Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse(Vec<Vec<f32>>);

impl HttpEmbedder {
    /// Create a new embedder client
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            client,
            query_cache: DashMap::new(),
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = serde_json::json!({
            "inputs": batch,
            "model": self.config.model,
        });

        let response = self
            .client
            .post(format!(
                "{}/embed",
                self.config.api_url.trim_end_matches('/')
            ))
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::EmbeddingFailed {
                details: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(RagError::EmbeddingFailed {
                details: format!("status {}: {}", status, details),
            });
        }

        let EmbedResponse(vectors) = response.json().await.map_err(|e| RagError::EmbeddingFailed {
            details: e.to_string(),
        })?;

        if vectors.len() != batch.len() {
            return Err(RagError::EmbeddingFailed {
                details: format!(
                    "expected {} vectors, service returned {}",
                    batch.len(),
                    vectors.len()
                ),
            });
        }

        for vector in &vectors {
            if vector.len() != self.config.dimension {
                return Err(RagError::EmbeddingFailed {
                    details: format!(
                        "expected dimension {}, service returned {}",
                        self.config.dimension,
                        vector.len()
                    ),
                });
            }
        }

        Ok(vectors)
    }

    fn cache_insert(&self, key: String, vector: Vec<f32>) {
        if self.query_cache.len() >= QUERY_CACHE_CAPACITY {
            // Simple eviction: remove one arbitrary entry
            if let Some(evict) = self.query_cache.iter().next().map(|e| e.key().clone()) {
                self.query_cache.remove(&evict);
            }
        }
        self.query_cache.insert(key, vector);
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size.max(1)) {
            vectors.extend(self.embed_batch(batch).await?);
        }

        tracing::debug!("Generated {} embeddings", vectors.len());
        Ok(vectors)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cached) = self.query_cache.get(text) {
            return Ok(cached.clone());
        }

        let vectors = self.embed_batch(&[text.to_string()]).await?;
        let vector = vectors.into_iter().next().ok_or_else(|| RagError::EmbeddingFailed {
            details: "service returned no vector".to_string(),
        })?;

        self.cache_insert(text.to_string(), vector.clone());
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// Cosine similarity between two vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_of_identical_vectors_is_one() {
        let v = vec![0.5, -0.25, 1.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_of_orthogonal_vectors_is_zero() {
        assert!((cosine_similarity(&[1.0, 0.0], &[0.0, 1.0])).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_handles_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }
}
