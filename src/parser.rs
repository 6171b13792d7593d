//! # External Parser Collaborator Module
//!
//! ## Purpose
//! Client for the external document-parser service used on the primary
//! processing path: the service parses uploaded files, chunks them and indexes
//! them into a collection, returning the chunk contents and any generic
//! metadata it derived.
//!
//! ## Input/Output Specification
//! - **Input**: Document file, target collection, caller-supplied metadata
//! - **Output**: Parsed chunks and parser metadata
//! - **Failure mode**: Every error from this collaborator is recoverable;
//!   the hybrid processor catches it and falls back to local processing
//!
//! ## Key Features
//! - Multipart document upload
//! - Collection bootstrap with embedder configuration
//! - Health checking for startup diagnostics

use crate::config::{EmbeddingConfig, ParserConfig};
use crate::errors::{RagError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::time::Duration;

/// A chunk as returned by the parser service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedChunk {
    #[serde(default)]
    pub content: String,
}

/// Parser service response for an uploaded document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedDocument {
    #[serde(default)]
    pub chunks: Vec<ParsedChunk>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Interface to the external document parser
#[async_trait]
pub trait DocumentParser: Send + Sync {
    /// Upload a document for parsing, chunking and indexing
    async fn upload_document(
        &self,
        file_path: &Path,
        collection_name: &str,
        metadata: &Map<String, Value>,
    ) -> Result<ParsedDocument>;

    /// Create a collection on the parser service
    async fn create_collection(&self, collection_name: &str) -> Result<()>;

    /// Check whether the parser service is reachable
    async fn health_check(&self) -> Result<()>;
}

/// HTTP client for the parser service
pub struct HttpParserClient {
    base_url: String,
    embedding_model: String,
    embedding_dimension: usize,
    client: reqwest::Client,
}

impl HttpParserClient {
    /// Create a new parser client
    pub fn new(config: &ParserConfig, embedding: &EmbeddingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            embedding_model: embedding.model.clone(),
            embedding_dimension: embedding.dimension,
            client,
        })
    }

    fn unavailable(err: reqwest::Error) -> RagError {
        RagError::ParserUnavailable {
            details: err.to_string(),
        }
    }
}

#[async_trait]
impl DocumentParser for HttpParserClient {
    async fn upload_document(
        &self,
        file_path: &Path,
        collection_name: &str,
        metadata: &Map<String, Value>,
    ) -> Result<ParsedDocument> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        tracing::info!("Uploading to parser service: {}", file_name);

        let bytes = tokio::fs::read(file_path)
            .await
            .map_err(|e| RagError::ParserUnavailable {
                details: format!("Failed to read {} for upload: {}", file_path.display(), e),
            })?;

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes)
                    .file_name(file_name.clone())
                    .mime_str("application/octet-stream")
                    .map_err(|e| RagError::ParserUnavailable {
                        details: e.to_string(),
                    })?,
            )
            .text("collection_name", collection_name.to_string())
            .text("metadata", Value::Object(metadata.clone()).to_string());

        let response = self
            .client
            .post(format!(
                "{}/v1/collections/{}/documents",
                self.base_url, collection_name
            ))
            .multipart(form)
            .send()
            .await
            .map_err(Self::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::ParserResponse {
                status: status.as_u16(),
                details: body,
            });
        }

        let parsed: ParsedDocument = response.json().await.map_err(Self::unavailable)?;
        tracing::info!("Parser service returned {} chunks for {}", parsed.chunks.len(), file_name);

        Ok(parsed)
    }

    async fn create_collection(&self, collection_name: &str) -> Result<()> {
        let body = serde_json::json!({
            "name": collection_name,
            "description": format!("Legal documents collection: {}", collection_name),
            "embedder_config": {
                "provider": "sentence-transformers",
                "model": self.embedding_model,
                "embedding_dims": self.embedding_dimension,
            },
        });

        let response = self
            .client
            .post(format!("{}/v1/collections", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(Self::unavailable)?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_default();
            return Err(RagError::ParserResponse {
                status: status.as_u16(),
                details,
            });
        }

        tracing::info!("Created parser collection: {}", collection_name);
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(Self::unavailable)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(RagError::ParserResponse {
                status: response.status().as_u16(),
                details: "health check failed".to_string(),
            })
        }
    }
}
