//! # Legal RAG Service
//!
//! ## Overview
//! This library implements a retrieval-augmented question-answering service for
//! Indian legal documents. Judgments and statutes are ingested, enriched with
//! domain-specific metadata (citations, courts, judges, statutory references,
//! precedents), chunked, embedded and indexed; user queries are answered from
//! the retrieved context.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `extraction`: Pattern-driven legal metadata extraction and judgment segmentation
//! - `chunking`: Bounded sliding-window fallback chunker
//! - `processor`: Hybrid processing pipeline combining an external parser with local extraction
//! - `parser`: External document-parser collaborator (HTTP)
//! - `text_extract`: Local text extraction from PDF and plain-text files
//! - `embedding`: Embedding-model collaborator (HTTP)
//! - `vector_store`: Qdrant-backed vector index collaborator
//! - `llm`: Answer-generation collaborator with legal-specific prompting
//! - `storage`: Local document registry and ingestion status tracking
//! - `ingest`: Background ingestion orchestration
//! - `api`: REST API endpoints
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Legal documents (PDF/TXT), search queries (text)
//! - **Output**: Indexed document chunks with legal metadata, ranked search
//!   results, grounded answers with citations
//! - **Processing**: Asynchronous per-document ingestion, deterministic extraction
//!
//! ## Usage
//! ```rust,no_run
//! use legal_rag::extraction::LegalMetadataExtractor;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = LegalMetadataExtractor::new()?;
//!     let extracted = extractor.extract_all("AIR 2020 SC 123 ...");
//!     println!("citation: {:?}", extracted.metadata.citation);
//!     Ok(())
//! }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod extraction;
pub mod chunking;
pub mod processor;
pub mod parser;
pub mod text_extract;
pub mod embedding;
pub mod vector_store;
pub mod llm;
pub mod storage;
pub mod ingest;
pub mod api;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{RagError, Result};
pub use processor::{HybridProcessor, ProcessedDocument, ProcessingMethod};

// Core types used throughout the system
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Unique identifier for ingested documents
pub type DocumentId = Uuid;

/// Kind of legal document being ingested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Judgment,
    Statute,
    Contract,
    Precedent,
}

impl Default for DocumentType {
    fn default() -> Self {
        DocumentType::Judgment
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentType::Judgment => "judgment",
            DocumentType::Statute => "statute",
            DocumentType::Contract => "contract",
            DocumentType::Precedent => "precedent",
        };
        f.write_str(s)
    }
}

/// A bounded contiguous slice of document text sized for embedding.
///
/// Both the external-parser path and the fallback chunker produce this same
/// type, so downstream code never inspects chunk representations at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk text
    pub content: String,
    /// Zero-based position within the document
    pub index: usize,
    /// Total number of chunks in the document
    pub total: usize,
}

/// Application state shared across API handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub ingestion: Arc<ingest::IngestionService>,
    pub registry: Arc<storage::DocumentStore>,
    pub embedder: Arc<dyn embedding::Embedder>,
    pub vector_store: Arc<dyn vector_store::VectorStore>,
    pub answerer: Arc<dyn llm::AnswerGenerator>,
}
