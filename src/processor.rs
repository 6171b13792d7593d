//! # Hybrid Processing Module
//!
//! ## Purpose
//! Orchestrates document processing by combining the external parser's output
//! with local legal metadata extraction into a unified document record.
//!
//! ## Input/Output Specification
//! - **Input**: Document path, target collection, declared document type
//! - **Output**: [`ProcessedDocument`] with full text, chunks, merged
//!   metadata, segments and counters
//! - **Workflow**: parse (external, recoverable) | extract + chunk (local,
//!   fatal) → extract legal metadata → merge
//!
//! ## Key Features
//! - External parser failures are logged and recovered by falling back to
//!   local text extraction plus the sliding-window chunker
//! - Legal metadata always overrides parser metadata on key collision
//! - Collaborators are injected at construction, never resolved globally

use crate::chunking::FallbackChunker;
use crate::errors::Result;
use crate::extraction::{LegalMetadataExtractor, Segments};
use crate::parser::DocumentParser;
use crate::text_extract::TextExtractor;
use crate::{Chunk, DocumentType};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// How a document was processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    /// External parser supplied text and chunks, local extraction supplied
    /// the legal metadata
    Hybrid,
    /// Local text extraction and fallback chunking
    Manual,
}

impl fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMethod::Hybrid => f.write_str("hybrid"),
            ProcessingMethod::Manual => f.write_str("manual"),
        }
    }
}

/// Fully processed document, constructed fresh per ingestion call and handed
/// to the embedding/indexing stage
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub full_text: String,
    pub chunks: Vec<Chunk>,
    /// Parser metadata overlaid with extracted legal metadata, plus
    /// document_type, file_path and processing_method
    pub metadata: Map<String, Value>,
    pub segments: Segments,
    pub num_chunks: usize,
    pub num_precedents: usize,
}

/// Hybrid document processor.
///
/// Uses the external parser for parsing and chunking when one is configured,
/// and local extraction for the Indian-legal context the parser does not
/// understand.
pub struct HybridProcessor {
    parser: Option<Arc<dyn DocumentParser>>,
    text_extractor: Arc<dyn TextExtractor>,
    extractor: LegalMetadataExtractor,
    chunker: FallbackChunker,
}

impl HybridProcessor {
    pub fn new(
        parser: Option<Arc<dyn DocumentParser>>,
        text_extractor: Arc<dyn TextExtractor>,
        chunker: FallbackChunker,
    ) -> Result<Self> {
        Ok(Self {
            parser,
            text_extractor,
            extractor: LegalMetadataExtractor::new()?,
            chunker,
        })
    }

    /// Process a document end to end.
    ///
    /// Parser failures are recoverable and trigger the local fallback path;
    /// failures of the fallback path itself (text extraction, chunking,
    /// metadata extraction) are fatal and propagate to the caller.
    pub async fn process(
        &self,
        file_path: &Path,
        collection_name: &str,
        document_type: DocumentType,
    ) -> Result<ProcessedDocument> {
        tracing::info!("Processing document (hybrid mode): {}", file_path.display());

        let (full_text, chunks, parser_metadata, method) = match &self.parser {
            Some(parser) => {
                let mut upload_metadata = Map::new();
                upload_metadata.insert(
                    "document_type".to_string(),
                    Value::String(document_type.to_string()),
                );

                match parser
                    .upload_document(file_path, collection_name, &upload_metadata)
                    .await
                {
                    Ok(parsed) => {
                        let full_text = parsed
                            .chunks
                            .iter()
                            .map(|c| c.content.as_str())
                            .collect::<Vec<_>>()
                            .join("\n");
                        let total = parsed.chunks.len();
                        let chunks = parsed
                            .chunks
                            .into_iter()
                            .enumerate()
                            .map(|(index, c)| Chunk {
                                content: c.content,
                                index,
                                total,
                            })
                            .collect::<Vec<_>>();

                        tracing::info!("Parser service processed {} chunks", total);
                        (full_text, chunks, parsed.metadata, ProcessingMethod::Hybrid)
                    }
                    Err(e) => {
                        tracing::error!("Parser service processing failed: {}", e);
                        tracing::info!("Falling back to manual processing");
                        let (full_text, chunks) = self.process_locally(file_path).await?;
                        (full_text, chunks, Map::new(), ProcessingMethod::Manual)
                    }
                }
            }
            None => {
                let (full_text, chunks) = self.process_locally(file_path).await?;
                (full_text, chunks, Map::new(), ProcessingMethod::Manual)
            }
        };

        // Legal metadata is extracted from the full text regardless of which
        // path produced it.
        let extracted = self.extractor.extract_all(&full_text);
        let num_precedents = extracted.metadata.precedents_cited.len();
        tracing::info!(
            "Extracted legal metadata: {}",
            extracted.metadata.citation.as_deref().unwrap_or("no citation")
        );

        let metadata = merge_metadata(
            parser_metadata,
            &extracted.metadata,
            document_type,
            file_path,
            method,
        )?;

        let num_chunks = chunks.len();
        tracing::info!(
            "Processing complete: {} chunks, {} segments",
            num_chunks,
            extracted.segments.len()
        );

        Ok(ProcessedDocument {
            full_text,
            chunks,
            metadata,
            segments: extracted.segments,
            num_chunks,
            num_precedents,
        })
    }

    /// Fallback path: local text extraction plus sliding-window chunking.
    async fn process_locally(&self, file_path: &Path) -> Result<(String, Vec<Chunk>)> {
        let full_text = self.text_extractor.extract(file_path).await.map_err(|e| {
            tracing::error!("Text extraction failed for {}: {}", file_path.display(), e);
            e
        })?;

        let pieces = self.chunker.chunk(&full_text);
        let total = pieces.len();
        let chunks = pieces
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                content,
                index,
                total,
            })
            .collect();

        Ok((full_text, chunks))
    }
}

/// Merge parser metadata with extracted legal metadata.
///
/// Legal fields win on key collision; document_type, file_path and
/// processing_method are appended last.
fn merge_metadata(
    parser_metadata: Map<String, Value>,
    legal: &crate::extraction::ExtractedMetadata,
    document_type: DocumentType,
    file_path: &Path,
    method: ProcessingMethod,
) -> Result<Map<String, Value>> {
    let mut merged = parser_metadata;

    // ExtractedMetadata serializes with absent fields omitted, so the overlay
    // never clobbers a parser value with an empty placeholder.
    if let Value::Object(legal_map) = serde_json::to_value(legal)? {
        for (key, value) in legal_map {
            merged.insert(key, value);
        }
    }

    merged.insert(
        "document_type".to_string(),
        Value::String(document_type.to_string()),
    );
    merged.insert(
        "file_path".to_string(),
        Value::String(file_path.display().to_string()),
    );
    merged.insert(
        "processing_method".to_string(),
        Value::String(method.to_string()),
    );

    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RagError;
    use crate::parser::{ParsedChunk, ParsedDocument};
    use async_trait::async_trait;

    struct StubParser {
        fail: bool,
    }

    #[async_trait]
    impl DocumentParser for StubParser {
        async fn upload_document(
            &self,
            _file_path: &Path,
            _collection_name: &str,
            _metadata: &Map<String, Value>,
        ) -> Result<ParsedDocument> {
            if self.fail {
                return Err(RagError::ParserUnavailable {
                    details: "connection refused".to_string(),
                });
            }
            let mut metadata = Map::new();
            metadata.insert("page_count".to_string(), Value::from(3));
            metadata.insert("citation".to_string(), Value::String("parser-guess".to_string()));
            Ok(ParsedDocument {
                chunks: vec![
                    ParsedChunk {
                        content: "AIR 2020 SC 123".to_string(),
                    },
                    ParsedChunk {
                        content: "FACTS: something happened. HELD: resolved.".to_string(),
                    },
                ],
                metadata,
            })
        }

        async fn create_collection(&self, _collection_name: &str) -> Result<()> {
            Ok(())
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    struct StubExtractor {
        text: Option<String>,
    }

    #[async_trait]
    impl TextExtractor for StubExtractor {
        async fn extract(&self, path: &Path) -> Result<String> {
            self.text.clone().ok_or_else(|| RagError::TextExtraction {
                path: path.display().to_string(),
                details: "corrupt file".to_string(),
            })
        }
    }

    fn processor(
        parser: Option<Arc<dyn DocumentParser>>,
        text: Option<String>,
    ) -> HybridProcessor {
        HybridProcessor::new(
            parser,
            Arc::new(StubExtractor { text }),
            FallbackChunker::new(1000, 200),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn parser_path_merges_metadata_with_legal_fields_winning() {
        let p = processor(Some(Arc::new(StubParser { fail: false })), None);
        let doc = p
            .process(Path::new("case.pdf"), "legal_documents", DocumentType::Judgment)
            .await
            .unwrap();

        assert_eq!(doc.num_chunks, 2);
        assert_eq!(doc.chunks[0].index, 0);
        assert_eq!(doc.chunks[1].total, 2);
        assert!(doc.full_text.contains("AIR 2020 SC 123"));

        // Parser-only keys survive, colliding keys are overridden by extraction
        assert_eq!(doc.metadata.get("page_count"), Some(&Value::from(3)));
        assert_eq!(
            doc.metadata.get("citation"),
            Some(&Value::String("AIR 2020 SC 123".to_string()))
        );
        assert_eq!(
            doc.metadata.get("processing_method"),
            Some(&Value::String("hybrid".to_string()))
        );
        assert_eq!(
            doc.metadata.get("document_type"),
            Some(&Value::String("judgment".to_string()))
        );
    }

    #[tokio::test]
    async fn parser_failure_falls_back_to_manual_processing() {
        let text = "AIR 1999 SC 5\nFACTS: a dispute arose. HELD: dismissed.";
        let p = processor(
            Some(Arc::new(StubParser { fail: true })),
            Some(text.to_string()),
        );
        let doc = p
            .process(Path::new("case.pdf"), "legal_documents", DocumentType::Judgment)
            .await
            .unwrap();

        assert_eq!(
            doc.metadata.get("processing_method"),
            Some(&Value::String("manual".to_string()))
        );
        assert!(!doc.chunks.is_empty());
        assert_eq!(
            doc.metadata.get("citation"),
            Some(&Value::String("AIR 1999 SC 5".to_string()))
        );
    }

    #[tokio::test]
    async fn fallback_extraction_failure_is_fatal() {
        let p = processor(Some(Arc::new(StubParser { fail: true })), None);
        let err = p
            .process(Path::new("corrupt.pdf"), "legal_documents", DocumentType::Judgment)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::TextExtraction { .. }));
    }

    #[tokio::test]
    async fn no_parser_configured_uses_manual_path() {
        let p = processor(None, Some("a plain statute text".to_string()));
        let doc = p
            .process(Path::new("statute.txt"), "legal_documents", DocumentType::Statute)
            .await
            .unwrap();

        assert_eq!(
            doc.metadata.get("processing_method"),
            Some(&Value::String("manual".to_string()))
        );
        assert_eq!(doc.num_chunks, 1);
        assert_eq!(doc.num_precedents, 0);
        // No citation pattern matched: the key must be absent, not null
        assert!(!doc.metadata.contains_key("citation"));
    }

    #[tokio::test]
    async fn num_precedents_counts_extracted_citations() {
        let text = "cites AIR 2020 SC 123 and (2019) 4 SCC 17 and AIR 2020 SC 123";
        let p = processor(None, Some(text.to_string()));
        let doc = p
            .process(Path::new("case.txt"), "legal_documents", DocumentType::Judgment)
            .await
            .unwrap();
        assert_eq!(doc.num_precedents, 2);
    }
}
