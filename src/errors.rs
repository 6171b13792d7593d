//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the legal RAG service, providing error types
//! and conversion utilities for all system components.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from various system components
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Validation, Processing, Collaborators, Storage, API
//!
//! ## Key Features
//! - Explicit recoverable/fatal split: external-parser failures are
//!   recoverable (the hybrid processor falls back to local processing),
//!   local-processing failures are fatal to the ingestion call
//! - Automatic error conversion and chaining
//! - Error categories for logging and metrics
//!
//! ## Usage
//! ```rust
//! use legal_rag::errors::{Result, RagError};
//!
//! fn extract_operation() -> Result<String> {
//!     Err(RagError::TextExtraction {
//!         path: "missing.pdf".to_string(),
//!         details: "file not found".to_string(),
//!     })
//! }
//! ```

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, RagError>;

/// Error types for the legal RAG service
#[derive(Debug, Error)]
pub enum RagError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    /// Unsupported document format at ingestion
    #[error("File type '{extension}' is not supported")]
    UnsupportedFileType { extension: String },

    /// Oversized upload rejected before processing
    #[error("File too large: {size_mb}MB exceeds limit of {limit_mb}MB")]
    PayloadTooLarge { size_mb: u64, limit_mb: u64 },

    /// Unknown document id
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    // External parser collaborator (recoverable: triggers local fallback)
    #[error("Parser service unavailable: {details}")]
    ParserUnavailable { details: String },

    #[error("Parser service returned status {status}: {details}")]
    ParserResponse { status: u16, details: String },

    // Local processing (fatal to the ingestion call)
    #[error("Text extraction failed for {path}: {details}")]
    TextExtraction { path: String, details: String },

    #[error("Metadata extraction failed: {details}")]
    Extraction { details: String },

    #[error("Chunking failed: {details}")]
    Chunking { details: String },

    // Embedding/index collaborators
    #[error("Embedding generation failed: {details}")]
    EmbeddingFailed { details: String },

    #[error("Vector store error: {details}")]
    VectorStore { details: String },

    #[error("Answer generation failed: {details}")]
    AnswerGeneration { details: String },

    // Infrastructure
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal system errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Check if the error is recoverable by falling back to local processing.
    ///
    /// Only external-parser failures qualify; everything local to the
    /// ingestion pipeline is fatal to the call.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RagError::ParserUnavailable { .. }
                | RagError::ParserResponse { .. }
                | RagError::Http(_)
        )
    }

    /// Get error category for metrics and logging
    pub fn category(&self) -> &'static str {
        match self {
            RagError::Config { .. } => "configuration",
            RagError::ValidationFailed { .. }
            | RagError::UnsupportedFileType { .. }
            | RagError::PayloadTooLarge { .. }
            | RagError::DocumentNotFound { .. } => "validation",
            RagError::ParserUnavailable { .. } | RagError::ParserResponse { .. } => "parser",
            RagError::TextExtraction { .. }
            | RagError::Extraction { .. }
            | RagError::Chunking { .. } => "processing",
            RagError::EmbeddingFailed { .. } => "embedding",
            RagError::VectorStore { .. } => "vector_store",
            RagError::AnswerGeneration { .. } => "llm",
            RagError::Database(_) | RagError::Serialization(_) => "storage",
            RagError::Http(_) | RagError::Json(_) => "network",
            RagError::Toml(_) | RagError::Io(_) | RagError::Internal { .. } => "system",
        }
    }
}

// Helper macro for common error patterns
#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::RagError::Internal {
            message: $msg.to_string(),
        }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::RagError::Internal {
            message: format!($fmt, $($arg)*),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_failures_are_recoverable() {
        let err = RagError::ParserUnavailable {
            details: "connection refused".to_string(),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.category(), "parser");
    }

    #[test]
    fn local_processing_failures_are_fatal() {
        let err = RagError::TextExtraction {
            path: "a.pdf".to_string(),
            details: "corrupt xref".to_string(),
        };
        assert!(!err.is_recoverable());
        assert_eq!(err.category(), "processing");

        let err = RagError::Extraction {
            details: "bad pattern".to_string(),
        };
        assert!(!err.is_recoverable());
    }
}
