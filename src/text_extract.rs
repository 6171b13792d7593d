//! # Text Extraction Module
//!
//! ## Purpose
//! Local text extraction used on the fallback processing path when the
//! external parser is unavailable. Supports PDF and plain-text documents and
//! normalizes the result for downstream extraction.
//!
//! ## Input/Output Specification
//! - **Input**: Path to a document file
//! - **Output**: Normalized full text (NFC, control characters stripped, line
//!   structure preserved)
//! - **Failure mode**: Fatal. Unreadable, corrupt or unsupported input
//!   propagates to the caller; there is no further fallback
//!
//! ## Key Features
//! - PDF extraction off the async runtime via a blocking worker
//! - Unicode NFC normalization with line breaks preserved for segmentation

use crate::errors::{RagError, Result};
use async_trait::async_trait;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// Interface to the local text-extraction collaborator
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract the full text of the document at `path`
    async fn extract(&self, path: &Path) -> Result<String>;
}

/// Extension-dispatched file text extractor
pub struct FileTextExtractor;

impl FileTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for FileTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let raw = match extension.as_str() {
            "txt" => tokio::fs::read_to_string(path)
                .await
                .map_err(|e| RagError::TextExtraction {
                    path: path.display().to_string(),
                    details: e.to_string(),
                })?,
            "pdf" => {
                let owned = path.to_path_buf();
                // pdf parsing is CPU-bound, keep it off the async runtime
                tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
                    .await
                    .map_err(|e| RagError::Internal {
                        message: format!("PDF extraction task failed: {}", e),
                    })?
                    .map_err(|e| RagError::TextExtraction {
                        path: path.display().to_string(),
                        details: e.to_string(),
                    })?
            }
            other => {
                return Err(RagError::UnsupportedFileType {
                    extension: format!(".{}", other),
                })
            }
        };

        tracing::debug!("Extracted {} chars from {}", raw.len(), path.display());
        Ok(normalize_text(&raw))
    }
}

/// Normalize extracted text: NFC composition, control characters stripped,
/// line breaks and tabs preserved so segmentation and party extraction keep
/// their line structure.
pub fn normalize_text(text: &str) -> String {
    text.nfc()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn extracts_plain_text_files() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "SUPREME COURT OF INDIA").unwrap();
        writeln!(file, "Petitioner vs Respondent").unwrap();

        let extractor = FileTextExtractor::new();
        let text = extractor.extract(file.path()).await.unwrap();
        assert!(text.starts_with("SUPREME COURT OF INDIA"));
        assert!(text.contains('\n'));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let extractor = FileTextExtractor::new();
        let err = extractor.extract(Path::new("evidence.docx")).await.unwrap_err();
        assert!(matches!(err, RagError::UnsupportedFileType { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_fatal() {
        let extractor = FileTextExtractor::new();
        let err = extractor
            .extract(Path::new("/nonexistent/judgment.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::TextExtraction { .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn normalization_strips_control_chars_but_keeps_lines() {
        let text = "line one\u{0}\u{7}\nline\ttwo";
        assert_eq!(normalize_text(text), "line one\nline\ttwo");
    }
}
