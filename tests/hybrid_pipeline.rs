//! End-to-end tests for the hybrid processing pipeline: parser fallback,
//! metadata merging and failure isolation during background ingestion.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use legal_rag::chunking::FallbackChunker;
use legal_rag::config::{Config, EmbeddingConfig, ParserConfig, StorageConfig};
use legal_rag::embedding::Embedder;
use legal_rag::errors::{RagError, Result};
use legal_rag::ingest::IngestionService;
use legal_rag::parser::HttpParserClient;
use legal_rag::processor::HybridProcessor;
use legal_rag::storage::{DocumentStore, IngestionStatus};
use legal_rag::text_extract::FileTextExtractor;
use legal_rag::vector_store::{ScoredPoint, VectorStore};
use legal_rag::DocumentType;

const JUDGMENT_TEXT: &str = "AIR 2020 SC 123\nSUPREME COURT OF INDIA\nCORAM: J. SMITH, J. DOE\nDATED: 05-06-2020 JUDGMENT\nPetitioner vs Respondent\nFACTS: the appeal arises from a conviction\nHELD: the appeal is allowed";

fn parser_config(base_url: String) -> ParserConfig {
    ParserConfig {
        enabled: true,
        api_url: base_url,
        timeout_seconds: 5,
    }
}

fn embedding_config() -> EmbeddingConfig {
    EmbeddingConfig {
        api_url: "http://localhost:9".to_string(),
        model: "test-model".to_string(),
        dimension: 4,
        batch_size: 8,
        timeout_seconds: 5,
    }
}

fn write_judgment(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let file_path = dir.path().join("judgment.txt");
    let mut file = std::fs::File::create(&file_path).unwrap();
    file.write_all(JUDGMENT_TEXT.as_bytes()).unwrap();
    file_path
}

fn processor_with_parser(server: &MockServer) -> HybridProcessor {
    let client =
        HttpParserClient::new(&parser_config(server.uri()), &embedding_config()).unwrap();
    HybridProcessor::new(
        Some(Arc::new(client)),
        Arc::new(FileTextExtractor::new()),
        FallbackChunker::new(1000, 200),
    )
    .unwrap()
}

#[tokio::test]
async fn parser_failure_falls_back_and_still_extracts_legal_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/collections/legal_documents/documents"))
        .respond_with(ResponseTemplate::new(500).set_body_string("parser exploded"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = write_judgment(&dir);
    let processor = processor_with_parser(&server);

    let doc = processor
        .process(&file_path, "legal_documents", DocumentType::Judgment)
        .await
        .expect("fallback path must succeed");

    assert_eq!(
        doc.metadata.get("processing_method"),
        Some(&Value::String("manual".to_string()))
    );
    assert_eq!(
        doc.metadata.get("citation"),
        Some(&Value::String("AIR 2020 SC 123".to_string()))
    );
    assert_eq!(
        doc.metadata.get("court_level"),
        Some(&Value::String("Supreme Court".to_string()))
    );
    assert_eq!(doc.metadata.get("bench_strength"), Some(&Value::from(2)));
    assert_eq!(
        doc.metadata.get("decision_date"),
        Some(&Value::String("2020-06-05".to_string()))
    );
    assert!(doc.num_chunks >= 1);
    assert!(doc.segments.len() >= 2);
}

#[tokio::test]
async fn parser_success_merges_metadata_with_legal_fields_winning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/collections/legal_documents/documents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chunks": [
                { "content": "AIR 2020 SC 123 SUPREME COURT OF INDIA" },
                { "content": "HELD: the appeal is allowed" },
            ],
            "metadata": {
                "page_count": 12,
                "citation": "parser-guessed-citation",
            },
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = write_judgment(&dir);
    let processor = processor_with_parser(&server);

    let doc = processor
        .process(&file_path, "legal_documents", DocumentType::Judgment)
        .await
        .unwrap();

    assert_eq!(
        doc.metadata.get("processing_method"),
        Some(&Value::String("hybrid".to_string()))
    );
    assert_eq!(doc.num_chunks, 2);
    // Parser-only metadata survives the merge
    assert_eq!(doc.metadata.get("page_count"), Some(&Value::from(12)));
    // Extracted legal metadata wins the collision
    assert_eq!(
        doc.metadata.get("citation"),
        Some(&Value::String("AIR 2020 SC 123".to_string()))
    );
}

struct StaticEmbedder {
    dimension: usize,
}

#[async_trait]
impl Embedder for StaticEmbedder {
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1; self.dimension]).collect())
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![0.1; self.dimension])
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Default)]
struct CountingVectorStore {
    points_added: AtomicUsize,
}

#[async_trait]
impl VectorStore for CountingVectorStore {
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn add_documents(
        &self,
        embeddings: Vec<Vec<f32>>,
        _texts: Vec<String>,
        _metadatas: Vec<Map<String, Value>>,
    ) -> Result<Vec<String>> {
        self.points_added.fetch_add(embeddings.len(), Ordering::SeqCst);
        Ok((0..embeddings.len()).map(|i| i.to_string()).collect())
    }

    async fn search(
        &self,
        _query_embedding: Vec<f32>,
        _top_k: usize,
        _filters: Option<&Map<String, Value>>,
        _score_threshold: Option<f32>,
    ) -> Result<Vec<ScoredPoint>> {
        Ok(Vec::new())
    }

    async fn delete_by_document(&self, _document_id: &str) -> Result<()> {
        Ok(())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.points_added.load(Ordering::SeqCst) as u64)
    }
}

fn ingestion_fixture(
    dir: &tempfile::TempDir,
) -> (Arc<IngestionService>, Arc<DocumentStore>, Arc<CountingVectorStore>) {
    let config = Arc::new(Config::default());
    let registry = Arc::new(
        DocumentStore::open(StorageConfig {
            db_path: dir.path().join("registry.db"),
            enable_compression: true,
        })
        .unwrap(),
    );
    let processor = Arc::new(
        HybridProcessor::new(
            None,
            Arc::new(FileTextExtractor::new()),
            FallbackChunker::new(1000, 200),
        )
        .unwrap(),
    );
    let vector_store = Arc::new(CountingVectorStore::default());
    let service = Arc::new(IngestionService::new(
        config,
        processor,
        Arc::new(StaticEmbedder { dimension: 4 }),
        vector_store.clone(),
        registry.clone(),
    ));
    (service, registry, vector_store)
}

async fn wait_for_terminal_status(
    registry: &DocumentStore,
    id: &legal_rag::DocumentId,
) -> IngestionStatus {
    for _ in 0..100 {
        let record = registry.get_record(id).unwrap().unwrap();
        match record.status {
            IngestionStatus::Pending | IngestionStatus::Processing => {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
            terminal => return terminal,
        }
    }
    panic!("ingestion did not reach a terminal status");
}

#[tokio::test]
async fn successful_ingestion_indexes_every_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = write_judgment(&dir);
    let (service, registry, vector_store) = ingestion_fixture(&dir);

    let id = service
        .submit(file_path, DocumentType::Judgment, None)
        .unwrap();

    let status = wait_for_terminal_status(&registry, &id).await;
    assert_eq!(status, IngestionStatus::Completed);

    let record = registry.get_record(&id).unwrap().unwrap();
    assert_eq!(record.citation.as_deref(), Some("AIR 2020 SC 123"));
    assert_eq!(record.num_chunks, Some(1));
    assert_eq!(
        vector_store.points_added.load(Ordering::SeqCst),
        record.num_chunks.unwrap()
    );
}

#[tokio::test]
async fn corrupt_file_fails_ingestion_without_indexing_anything() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("corrupt.pdf");
    std::fs::write(&file_path, b"this is not a pdf at all").unwrap();

    let (service, registry, vector_store) = ingestion_fixture(&dir);
    let id = service
        .submit(file_path, DocumentType::Judgment, None)
        .unwrap();

    let status = wait_for_terminal_status(&registry, &id).await;
    assert!(matches!(status, IngestionStatus::Failed { .. }));
    assert_eq!(vector_store.points_added.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unsupported_extension_is_rejected_synchronously() {
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("notes.docx");
    std::fs::write(&file_path, b"word document").unwrap();

    let (service, _registry, vector_store) = ingestion_fixture(&dir);
    let err = service
        .submit(file_path, DocumentType::Judgment, None)
        .unwrap_err();

    assert!(matches!(err, RagError::UnsupportedFileType { .. }));
    assert_eq!(vector_store.points_added.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn concurrent_ingestions_are_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_judgment(&dir);
    let bad = dir.path().join("corrupt.pdf");
    std::fs::write(&bad, b"garbage").unwrap();

    let (service, registry, _vector_store) = ingestion_fixture(&dir);
    let good_id = service.submit(good, DocumentType::Judgment, None).unwrap();
    let bad_id = service.submit(bad, DocumentType::Judgment, None).unwrap();

    assert_eq!(
        wait_for_terminal_status(&registry, &good_id).await,
        IngestionStatus::Completed
    );
    assert!(matches!(
        wait_for_terminal_status(&registry, &bad_id).await,
        IngestionStatus::Failed { .. }
    ));
}
