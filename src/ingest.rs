//! # Ingestion Orchestration Module
//!
//! ## Purpose
//! Accepts ingestion requests, validates them synchronously, then runs the
//! full processing pipeline as an independent background task per document:
//! hybrid processing → embedding → vector indexing → registry update.
//!
//! ## Input/Output Specification
//! - **Input**: Document path, declared type, target collection
//! - **Output**: Document id immediately; final state via the registry
//! - **Workflow**: validate → record pending → spawn → processing →
//!   completed/failed
//!
//! ## Key Features
//! - Synchronous validation (extension allow-list, size cap) so callers get
//!   immediate rejections
//! - One unsynchronized task per document; a failure marks that document
//!   failed without affecting others
//! - Indexing is the last pipeline step, so a failed document leaves no
//!   partial index entries behind

use crate::config::Config;
use crate::embedding::Embedder;
use crate::errors::{RagError, Result};
use crate::processor::{HybridProcessor, ProcessedDocument};
use crate::storage::{DocumentRecord, DocumentStore, IngestionStatus};
use crate::utils::Timer;
use crate::vector_store::VectorStore;
use crate::{DocumentId, DocumentType};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Coordinates background document ingestion
#[derive(Clone)]
pub struct IngestionService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    config: Arc<Config>,
    processor: Arc<HybridProcessor>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    registry: Arc<DocumentStore>,
}

impl IngestionService {
    pub fn new(
        config: Arc<Config>,
        processor: Arc<HybridProcessor>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
        registry: Arc<DocumentStore>,
    ) -> Self {
        Self {
            inner: Arc::new(ServiceInner {
                config,
                processor,
                embedder,
                vector_store,
                registry,
            }),
        }
    }

    /// Validate and accept a document for background processing.
    ///
    /// Returns the new document id immediately; processing happens
    /// out-of-band and its outcome is observable through the registry.
    pub fn submit(
        &self,
        file_path: PathBuf,
        document_type: DocumentType,
        collection_name: Option<String>,
    ) -> Result<DocumentId> {
        self.inner.validate_source(&file_path)?;

        let collection = collection_name
            .unwrap_or_else(|| self.inner.config.vector_store.collection_name.clone());
        let document_id = Uuid::new_v4();
        let title = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| document_id.to_string());

        let record = DocumentRecord::pending(
            document_id,
            title,
            document_type,
            collection.clone(),
            file_path.display().to_string(),
        );
        self.inner.registry.put_record(&record)?;

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            if let Err(e) = inner
                .run_pipeline(document_id, &file_path, document_type, &collection)
                .await
            {
                tracing::error!(
                    "Ingestion failed for document {} ({}): {}",
                    document_id,
                    file_path.display(),
                    e
                );
                if let Err(status_err) = inner.registry.set_status(
                    &document_id,
                    IngestionStatus::Failed { error: e.to_string() },
                ) {
                    tracing::error!(
                        "Failed to record failure for document {}: {}",
                        document_id,
                        status_err
                    );
                }
            }
        });

        Ok(document_id)
    }

    /// Remove a document from the registry and the vector store
    pub async fn delete(&self, document_id: &DocumentId) -> Result<()> {
        self.inner.registry.require_record(document_id)?;
        self.inner
            .vector_store
            .delete_by_document(&document_id.to_string())
            .await?;
        self.inner.registry.delete_record(document_id)
    }
}

impl ServiceInner {
    /// Reject unsupported or oversized sources before any work is queued
    fn validate_source(&self, path: &Path) -> Result<()> {
        let extension = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        if !self.config.server.allowed_extensions.contains(&extension) {
            return Err(RagError::UnsupportedFileType { extension });
        }

        let metadata = std::fs::metadata(path).map_err(|e| RagError::ValidationFailed {
            field: "file_path".to_string(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        let size_mb = metadata.len() / (1024 * 1024);
        if size_mb > self.config.server.max_upload_size_mb {
            return Err(RagError::PayloadTooLarge {
                size_mb,
                limit_mb: self.config.server.max_upload_size_mb,
            });
        }

        Ok(())
    }

    /// The full background pipeline for one document.
    ///
    /// Any error propagates to the caller, which marks the document failed;
    /// no partial index entries survive a processing failure because indexing
    /// is the last step.
    async fn run_pipeline(
        &self,
        document_id: DocumentId,
        file_path: &Path,
        document_type: DocumentType,
        collection: &str,
    ) -> Result<()> {
        tracing::info!("Processing document {}: {}", document_id, file_path.display());
        self.registry
            .set_status(&document_id, IngestionStatus::Processing)?;
        let timer = Timer::new(format!("ingest {}", document_id));

        let processed = self
            .processor
            .process(file_path, collection, document_type)
            .await?;

        self.registry
            .store_full_text(&document_id, &processed.full_text)?;
        self.update_record_metadata(&document_id, &processed)?;

        let chunk_texts: Vec<String> = processed
            .chunks
            .iter()
            .map(|c| c.content.clone())
            .collect();
        if chunk_texts.is_empty() {
            return Err(RagError::Chunking {
                details: format!("no chunks produced for {}", file_path.display()),
            });
        }

        let embeddings = self.embedder.embed_many(&chunk_texts).await?;

        let metadatas: Vec<Map<String, Value>> = (0..chunk_texts.len())
            .map(|i| {
                let mut metadata = processed.metadata.clone();
                metadata.insert(
                    "document_id".to_string(),
                    Value::String(document_id.to_string()),
                );
                metadata.insert("chunk_index".to_string(), Value::from(i));
                metadata.insert("total_chunks".to_string(), Value::from(chunk_texts.len()));
                metadata
            })
            .collect();

        let chunk_ids = self
            .vector_store
            .add_documents(embeddings, chunk_texts, metadatas)
            .await?;

        self.registry
            .set_status(&document_id, IngestionStatus::Completed)?;

        tracing::info!(
            "Document {} processed: citation={}, chunks indexed={}, precedents={}",
            document_id,
            processed
                .metadata
                .get("citation")
                .and_then(|v| v.as_str())
                .unwrap_or("n/a"),
            chunk_ids.len(),
            processed.num_precedents
        );
        timer.stop();

        Ok(())
    }

    /// Copy selected legal fields from the processed metadata onto the record
    fn update_record_metadata(
        &self,
        document_id: &DocumentId,
        processed: &ProcessedDocument,
    ) -> Result<()> {
        let mut record = self.registry.require_record(document_id)?;

        let get_str = |key: &str| {
            processed
                .metadata
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };

        record.citation = get_str("citation");
        record.court_name = get_str("court_name");
        record.court_level = get_str("court_level");
        record.decision_date = get_str("decision_date");
        record.judges = processed
            .metadata
            .get("judges")
            .and_then(|v| v.as_array())
            .map(|judges| {
                judges
                    .iter()
                    .filter_map(|j| j.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        record.num_chunks = Some(processed.num_chunks);
        record.num_precedents = Some(processed.num_precedents);
        record.updated_at = chrono::Utc::now();

        self.registry.put_record(&record)
    }
}
