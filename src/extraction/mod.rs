//! # Legal Metadata Extraction Module
//!
//! ## Purpose
//! Pattern-driven extraction of Indian legal metadata from raw judgment text:
//! citations, courts, judges, dates, parties, statutory references and cited
//! precedents, plus positional segmentation of judgments into their logical
//! sections.
//!
//! ## Input/Output Specification
//! - **Input**: Raw document text (any encoding artifacts tolerated)
//! - **Output**: Metadata record with absent fields omitted, judgment segments
//! - **Guarantee**: Pure and deterministic; absence of a pattern is encoded as
//!   omission, never as an error
//!
//! ## Key Features
//! - Ordered rule lists with explicit first-match-wins priority
//! - Joint court name + level classification
//! - CORAM-based judge and bench-strength extraction
//! - Insertion-ordered deduplication for acts, sections and precedents
//! - Keyword-offset judgment segmentation with full-text fallback

pub mod metadata;
pub mod segments;

pub use metadata::{CourtLevel, ExtractedDocument, ExtractedMetadata, LegalMetadataExtractor};
pub use segments::{JudgmentSegmenter, SegmentKind, Segments};
