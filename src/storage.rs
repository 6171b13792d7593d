//! # Document Registry Module
//!
//! ## Purpose
//! Persistent registry of ingested documents: records, ingestion status and
//! compressed full text, backed by an embedded database. This is what the
//! status-check and document-listing endpoints read, since ingestion is
//! asynchronous and failures surface only here.
//!
//! ## Input/Output Specification
//! - **Input**: Document records, status transitions, full text
//! - **Output**: Paginated/filtered listings, per-document lookups
//! - **Storage**: Sled embedded database, gzip compression for full text
//!
//! ## Key Features
//! - Separate trees for records and full text
//! - Status transitions pending → processing → completed/failed
//! - Listing with pagination and legal-metadata filters

use crate::config::StorageConfig;
use crate::errors::{RagError, Result};
use crate::internal_error;
use crate::{DocumentId, DocumentType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lifecycle of an ingestion job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestionStatus {
    Pending,
    Processing,
    Completed,
    Failed { error: String },
}

/// Registry record for one ingested document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    /// Display title, derived from the source file name
    pub title: String,
    pub document_type: DocumentType,
    pub collection_name: String,
    pub file_path: String,
    pub citation: Option<String>,
    pub court_name: Option<String>,
    pub court_level: Option<String>,
    pub judges: Vec<String>,
    pub decision_date: Option<String>,
    pub num_chunks: Option<usize>,
    pub num_precedents: Option<usize>,
    pub status: IngestionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentRecord {
    /// Create a fresh pending record at submission time
    pub fn pending(
        id: DocumentId,
        title: String,
        document_type: DocumentType,
        collection_name: String,
        file_path: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            title,
            document_type,
            collection_name,
            file_path,
            citation: None,
            court_name: None,
            court_level: None,
            judges: Vec::new(),
            decision_date: None,
            num_chunks: None,
            num_precedents: None,
            status: IngestionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Filters for document listing
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub document_type: Option<DocumentType>,
    pub court_level: Option<String>,
    pub year: Option<i32>,
}

/// Registry statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStats {
    pub total_documents: usize,
    pub database_size_bytes: u64,
}

/// Persistent document registry
pub struct DocumentStore {
    config: StorageConfig,
    db: Arc<sled::Db>,
    records_tree: Arc<sled::Tree>,
    text_tree: Arc<sled::Tree>,
}

impl DocumentStore {
    /// Open (or create) the registry database
    pub fn open(config: StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(&config.db_path)?;
        let records_tree = db.open_tree("document_records")?;
        let text_tree = db.open_tree("document_text")?;

        let store = Self {
            config,
            db: Arc::new(db),
            records_tree: Arc::new(records_tree),
            text_tree: Arc::new(text_tree),
        };

        tracing::info!(
            "Document registry opened with {} records",
            store.records_tree.len()
        );
        Ok(store)
    }

    /// Insert or replace a record
    pub fn put_record(&self, record: &DocumentRecord) -> Result<()> {
        let key = record.id.to_string();
        let value = bincode::serialize(record)?;
        self.records_tree.insert(key.as_bytes(), value)?;
        tracing::debug!("Stored record for document {}", record.id);
        Ok(())
    }

    /// Fetch a record by id
    pub fn get_record(&self, id: &DocumentId) -> Result<Option<DocumentRecord>> {
        let key = id.to_string();
        match self.records_tree.get(key.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Fetch a record or fail with a not-found error
    pub fn require_record(&self, id: &DocumentId) -> Result<DocumentRecord> {
        self.get_record(id)?.ok_or_else(|| RagError::DocumentNotFound {
            id: id.to_string(),
        })
    }

    /// Transition a record's ingestion status
    pub fn set_status(&self, id: &DocumentId, status: IngestionStatus) -> Result<()> {
        let mut record = self.require_record(id)?;
        record.status = status;
        record.updated_at = Utc::now();
        self.put_record(&record)
    }

    /// List records, newest first, with pagination and filters
    pub fn list_records(
        &self,
        skip: usize,
        limit: usize,
        filter: &DocumentFilter,
    ) -> Result<Vec<DocumentRecord>> {
        let mut records = Vec::new();

        for entry in self.records_tree.iter() {
            let (_, value) = entry?;
            let record: DocumentRecord = bincode::deserialize(&value)?;

            if let Some(doc_type) = filter.document_type {
                if record.document_type != doc_type {
                    continue;
                }
            }
            if let Some(level) = &filter.court_level {
                if record.court_level.as_deref() != Some(level.as_str()) {
                    continue;
                }
            }
            if let Some(year) = filter.year {
                let matches_year = record
                    .decision_date
                    .as_deref()
                    .and_then(|d| d.split('-').next())
                    .and_then(|y| y.parse::<i32>().ok())
                    .map(|y| y == year)
                    .unwrap_or(false);
                if !matches_year {
                    continue;
                }
            }

            records.push(record);
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records.into_iter().skip(skip).take(limit).collect())
    }

    /// Delete a record and its stored text
    pub fn delete_record(&self, id: &DocumentId) -> Result<()> {
        let key = id.to_string();
        let removed = self.records_tree.remove(key.as_bytes())?;
        self.text_tree.remove(key.as_bytes())?;

        if removed.is_none() {
            return Err(RagError::DocumentNotFound { id: key });
        }
        tracing::info!("Deleted document {}", id);
        Ok(())
    }

    /// Store a document's full text, compressed when enabled
    pub fn store_full_text(&self, id: &DocumentId, text: &str) -> Result<()> {
        let key = id.to_string();
        let data = if self.config.enable_compression {
            compress_text(text)?
        } else {
            text.as_bytes().to_vec()
        };
        self.text_tree.insert(key.as_bytes(), data)?;
        tracing::debug!("Stored text for document {} ({} bytes)", id, text.len());
        Ok(())
    }

    /// Retrieve a document's full text
    pub fn get_full_text(&self, id: &DocumentId) -> Result<Option<String>> {
        let key = id.to_string();
        match self.text_tree.get(key.as_bytes())? {
            Some(data) => {
                let text = if self.config.enable_compression {
                    decompress_text(&data)?
                } else {
                    String::from_utf8(data.to_vec())
                        .map_err(|e| internal_error!("Stored text is not valid UTF-8: {}", e))?
                };
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    /// Registry statistics
    pub fn stats(&self) -> Result<RegistryStats> {
        Ok(RegistryStats {
            total_documents: self.records_tree.len(),
            database_size_bytes: self.db.size_on_disk()?,
        })
    }

    /// Health check via a probe write/read/remove cycle
    pub fn health_check(&self) -> Result<()> {
        let probe_key = b"__health_probe";
        self.records_tree.insert(probe_key, b"ok".as_ref())?;
        let read = self.records_tree.get(probe_key)?;
        self.records_tree.remove(probe_key)?;

        if read.is_none() {
            return Err(internal_error!("Registry health probe value not found"));
        }
        Ok(())
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db.flush_async().await?;
        Ok(())
    }
}

fn compress_text(text: &str) -> Result<Vec<u8>> {
    use std::io::Write;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(text.as_bytes())?;
    Ok(encoder.finish()?)
}

fn decompress_text(data: &[u8]) -> Result<String> {
    use std::io::Read;

    let mut decoder = flate2::read::GzDecoder::new(data);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn open_store() -> (DocumentStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(StorageConfig {
            db_path: dir.path().join("registry.db"),
            enable_compression: true,
        })
        .unwrap();
        (store, dir)
    }

    fn record(id: DocumentId) -> DocumentRecord {
        DocumentRecord::pending(
            id,
            "case.pdf".to_string(),
            DocumentType::Judgment,
            "legal_documents".to_string(),
            "/tmp/case.pdf".to_string(),
        )
    }

    #[test]
    fn record_round_trip() {
        let (store, _dir) = open_store();
        let id = Uuid::new_v4();
        store.put_record(&record(id)).unwrap();

        let loaded = store.get_record(&id).unwrap().unwrap();
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.status, IngestionStatus::Pending);
    }

    #[test]
    fn status_transitions_update_timestamp() {
        let (store, _dir) = open_store();
        let id = Uuid::new_v4();
        store.put_record(&record(id)).unwrap();

        store
            .set_status(&id, IngestionStatus::Failed { error: "corrupt file".to_string() })
            .unwrap();
        let loaded = store.get_record(&id).unwrap().unwrap();
        assert_eq!(
            loaded.status,
            IngestionStatus::Failed { error: "corrupt file".to_string() }
        );
        assert!(loaded.updated_at >= loaded.created_at);
    }

    #[test]
    fn unknown_document_is_not_found() {
        let (store, _dir) = open_store();
        let err = store.require_record(&Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, RagError::DocumentNotFound { .. }));
    }

    #[test]
    fn listing_filters_by_type_and_year() {
        let (store, _dir) = open_store();

        let mut judgment = record(Uuid::new_v4());
        judgment.decision_date = Some("2020-06-05".to_string());
        store.put_record(&judgment).unwrap();

        let mut statute = record(Uuid::new_v4());
        statute.document_type = DocumentType::Statute;
        store.put_record(&statute).unwrap();

        let filter = DocumentFilter {
            document_type: Some(DocumentType::Judgment),
            year: Some(2020),
            ..Default::default()
        };
        let listed = store.list_records(0, 10, &filter).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, judgment.id);
    }

    #[test]
    fn full_text_round_trips_through_compression() {
        let (store, _dir) = open_store();
        let id = Uuid::new_v4();
        let text = "FACTS: the appellant... HELD: appeal allowed.".repeat(50);

        store.store_full_text(&id, &text).unwrap();
        assert_eq!(store.get_full_text(&id).unwrap().unwrap(), text);
    }

    #[test]
    fn delete_removes_record_and_text() {
        let (store, _dir) = open_store();
        let id = Uuid::new_v4();
        store.put_record(&record(id)).unwrap();
        store.store_full_text(&id, "body").unwrap();

        store.delete_record(&id).unwrap();
        assert!(store.get_record(&id).unwrap().is_none());
        assert!(store.get_full_text(&id).unwrap().is_none());
        assert!(matches!(
            store.delete_record(&id).unwrap_err(),
            RagError::DocumentNotFound { .. }
        ));
    }

    #[test]
    fn health_check_passes_on_open_store() {
        let (store, _dir) = open_store();
        assert!(store.health_check().is_ok());
    }
}
