//! # API Server Module
//!
//! ## Purpose
//! REST API server exposing document ingestion, status tracking, listing and
//! retrieval-augmented search for the legal RAG service.
//!
//! ## Input/Output Specification
//! - **Input**: HTTP requests with document paths, search queries, filters
//! - **Output**: JSON responses with document records, search results,
//!   grounded answers, system status
//! - **Endpoints**: Documents (ingest/status/list/detail/delete), search,
//!   health, stats
//!
//! ## Key Features
//! - Ingestion is accepted immediately and processed out-of-band; failures
//!   surface through the status endpoint
//! - Validation failures map to 400, unknown documents to 404
//! - CORS support for web frontends

use crate::errors::RagError;
use crate::storage::DocumentFilter;
use crate::utils::{preview, Timer};
use crate::vector_store::ScoredPoint;
use crate::{AppState, DocumentId, DocumentType};
use actix_cors::Cors;
use actix_web::middleware::Condition;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// API server wrapper
pub struct ApiServer {
    app_state: AppState,
}

/// Ingestion request payload
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub file_path: String,
    #[serde(default)]
    pub document_type: DocumentType,
    pub collection_name: Option<String>,
}

/// Ingestion acceptance payload
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub document_id: DocumentId,
    pub status: String,
    pub message: String,
}

/// Batch ingestion request payload
#[derive(Debug, Deserialize)]
pub struct BatchIngestRequest {
    pub file_paths: Vec<String>,
    #[serde(default)]
    pub document_type: DocumentType,
    pub collection_name: Option<String>,
}

/// Search request payload
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub top_k: Option<usize>,
    pub filters: Option<Map<String, Value>>,
    #[serde(default = "default_include_answer")]
    pub include_answer: bool,
}

fn default_include_answer() -> bool {
    true
}

/// Search response payload
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ScoredPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<crate::llm::AnswerCitation>>,
    pub latency_ms: u64,
    pub num_results: usize,
}

/// Batch search request payload
#[derive(Debug, Deserialize)]
pub struct BatchSearchRequest {
    pub queries: Vec<String>,
    pub top_k: Option<usize>,
}

/// Document listing query parameters
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: usize,
    pub limit: Option<usize>,
    pub document_type: Option<DocumentType>,
    pub court_level: Option<String>,
    pub year: Option<i32>,
}

impl ApiServer {
    /// Create new API server
    pub fn new(app_state: AppState) -> Self {
        Self { app_state }
    }

    /// Run the API server
    pub async fn run(self) -> crate::Result<()> {
        let config = self.app_state.config.clone();
        let bind_addr = format!("{}:{}", config.server.host, config.server.port);
        let enable_cors = config.server.enable_cors;
        let app_state = self.app_state;

        tracing::info!("Starting API server on {}", bind_addr);

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(app_state.clone()))
                .wrap(Condition::new(enable_cors, Cors::permissive()))
                .route("/documents", web::post().to(ingest_handler))
                .route("/documents/batch", web::post().to(batch_ingest_handler))
                .route("/documents", web::get().to(list_documents_handler))
                .route("/documents/{id}", web::get().to(document_detail_handler))
                .route("/documents/{id}/status", web::get().to(document_status_handler))
                .route("/documents/{id}", web::delete().to(delete_document_handler))
                .route("/search", web::post().to(search_handler))
                .route("/search/batch", web::post().to(batch_search_handler))
                .route("/health", web::get().to(health_handler))
                .route("/stats", web::get().to(stats_handler))
                .route("/", web::get().to(index_handler))
        })
        .workers(config.server.workers)
        .bind(&bind_addr)
        .map_err(|e| RagError::Internal {
            message: format!("Failed to bind server to {}: {}", bind_addr, e),
        })?
        .run();

        server.await.map_err(|e| RagError::Internal {
            message: format!("Server error: {}", e),
        })?;

        Ok(())
    }
}

/// Map service errors onto HTTP responses
fn error_response(err: &RagError) -> HttpResponse {
    let body = serde_json::json!({
        "error": err.category(),
        "message": err.to_string(),
    });

    match err {
        RagError::ValidationFailed { .. }
        | RagError::UnsupportedFileType { .. }
        | RagError::PayloadTooLarge { .. } => HttpResponse::BadRequest().json(body),
        RagError::DocumentNotFound { .. } => HttpResponse::NotFound().json(body),
        _ => HttpResponse::InternalServerError().json(body),
    }
}

fn parse_document_id(raw: &str) -> Result<DocumentId, RagError> {
    uuid::Uuid::parse_str(raw).map_err(|_| RagError::ValidationFailed {
        field: "document_id".to_string(),
        reason: format!("'{}' is not a valid document id", raw),
    })
}

/// Accept a document for background ingestion
async fn ingest_handler(
    app_state: web::Data<AppState>,
    request: web::Json<IngestRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();

    match app_state.ingestion.submit(
        request.file_path.into(),
        request.document_type,
        request.collection_name,
    ) {
        Ok(document_id) => Ok(HttpResponse::Accepted().json(IngestResponse {
            document_id,
            status: "processing".to_string(),
            message: "Document accepted. Processing in background.".to_string(),
        })),
        Err(e) => {
            tracing::error!("Ingestion rejected: {}", e);
            Ok(error_response(&e))
        }
    }
}

/// Accept multiple documents at once
async fn batch_ingest_handler(
    app_state: web::Data<AppState>,
    request: web::Json<BatchIngestRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();
    let mut results = Vec::new();
    let mut successful = 0usize;

    for file_path in &request.file_paths {
        match app_state.ingestion.submit(
            file_path.into(),
            request.document_type,
            request.collection_name.clone(),
        ) {
            Ok(document_id) => {
                successful += 1;
                results.push(serde_json::json!({
                    "file_path": file_path,
                    "document_id": document_id,
                    "status": "processing",
                }));
            }
            Err(e) => {
                tracing::error!("Failed to accept {}: {}", file_path, e);
                results.push(serde_json::json!({
                    "file_path": file_path,
                    "status": "rejected",
                    "error": e.to_string(),
                }));
            }
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total_files": request.file_paths.len(),
        "successful": successful,
        "failed": request.file_paths.len() - successful,
        "results": results,
    })))
}

/// List documents with pagination and filters
async fn list_documents_handler(
    app_state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> ActixResult<HttpResponse> {
    let filter = DocumentFilter {
        document_type: query.document_type,
        court_level: query.court_level.clone(),
        year: query.year,
    };
    let limit = query.limit.unwrap_or(20).min(100);

    match app_state.registry.list_records(query.skip, limit, &filter) {
        Ok(records) => Ok(HttpResponse::Ok().json(records)),
        Err(e) => {
            tracing::error!("Document listing failed: {}", e);
            Ok(error_response(&e))
        }
    }
}

/// Fetch one document record
async fn document_detail_handler(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let result = parse_document_id(&path)
        .and_then(|id| app_state.registry.require_record(&id));

    match result {
        Ok(record) => Ok(HttpResponse::Ok().json(record)),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Fetch only the ingestion status of a document
async fn document_status_handler(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let result = parse_document_id(&path)
        .and_then(|id| app_state.registry.require_record(&id));

    match result {
        Ok(record) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "document_id": record.id,
            "status": record.status,
            "num_chunks": record.num_chunks,
            "updated_at": record.updated_at,
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

/// Delete a document from the registry and the vector store
async fn delete_document_handler(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = match parse_document_id(&path) {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match app_state.ingestion.delete(&id).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "document_id": id,
            "message": "Document deleted successfully",
        }))),
        Err(e) => {
            tracing::error!("Deletion failed for {}: {}", id, e);
            Ok(error_response(&e))
        }
    }
}

/// Search endpoint: embed the query, run filtered retrieval, optionally
/// generate a grounded answer
async fn search_handler(
    app_state: web::Data<AppState>,
    request: web::Json<SearchRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();
    let timer = Timer::new("search");

    if request.query.trim().is_empty() {
        return Ok(error_response(&RagError::ValidationFailed {
            field: "query".to_string(),
            reason: "Query must not be empty".to_string(),
        }));
    }

    let search_config = &app_state.config.search;
    let top_k = request
        .top_k
        .unwrap_or(search_config.default_top_k)
        .clamp(1, search_config.max_top_k);

    tracing::info!("Searching for: {}", preview(&request.query, 12));

    let query_embedding = match app_state.embedder.embed(&request.query).await {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("Query embedding failed: {}", e);
            return Ok(error_response(&e));
        }
    };

    let results = match app_state
        .vector_store
        .search(
            query_embedding,
            top_k,
            request.filters.as_ref(),
            Some(search_config.score_threshold),
        )
        .await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Vector search failed: {}", e);
            return Ok(error_response(&e));
        }
    };

    let (answer, citations) = if request.include_answer && !results.is_empty() {
        match app_state
            .answerer
            .generate_with_context(&request.query, &results)
            .await
        {
            Ok(rag) => (Some(rag.answer), Some(rag.citations)),
            Err(e) => {
                tracing::error!("Answer generation failed: {}", e);
                return Ok(error_response(&e));
            }
        }
    } else {
        (None, None)
    };

    let num_results = results.len();
    Ok(HttpResponse::Ok().json(SearchResponse {
        query: request.query,
        results,
        answer,
        citations,
        latency_ms: timer.stop(),
        num_results,
    }))
}

/// Batch search endpoint; skips answer generation
async fn batch_search_handler(
    app_state: web::Data<AppState>,
    request: web::Json<BatchSearchRequest>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();
    let top_k = request
        .top_k
        .unwrap_or(app_state.config.search.default_top_k)
        .clamp(1, app_state.config.search.max_top_k);
    let threshold = app_state.config.search.score_threshold;

    let outcomes = futures::future::join_all(request.queries.iter().map(|query| async {
        let embedding = app_state.embedder.embed(query).await?;
        app_state
            .vector_store
            .search(embedding, top_k, None, Some(threshold))
            .await
    }))
    .await;

    let mut results = Vec::new();
    let mut successful = 0usize;

    for (query, outcome) in request.queries.iter().zip(outcomes) {
        match outcome {
            Ok(points) => {
                successful += 1;
                results.push(serde_json::json!({
                    "query": query,
                    "num_results": points.len(),
                    "results": points,
                }));
            }
            Err(e) => {
                tracing::error!("Batch query '{}' failed: {}", preview(query, 8), e);
                results.push(serde_json::json!({
                    "query": query,
                    "error": e.to_string(),
                }));
            }
        }
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "total_queries": request.queries.len(),
        "successful": successful,
        "results": results,
    })))
}

/// Health check endpoint handler
async fn health_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let registry_status = match app_state.registry.health_check() {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };
    let vector_status = match app_state.vector_store.count().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let healthy = registry_status == "healthy" && vector_status == "healthy";
    let response = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "components": {
            "registry": registry_status,
            "vector_store": vector_status,
        },
    });

    Ok(HttpResponse::Ok().json(response))
}

/// Statistics endpoint handler
async fn stats_handler(app_state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let registry_stats = match app_state.registry.stats() {
        Ok(stats) => serde_json::to_value(stats).unwrap_or(Value::Null),
        Err(_) => Value::Null,
    };
    let indexed_chunks = app_state.vector_store.count().await.unwrap_or(0);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "registry": registry_stats,
        "indexed_chunks": indexed_chunks,
    })))
}

/// Index page handler
async fn index_handler() -> ActixResult<HttpResponse> {
    let html = r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Legal RAG Service</title>
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .header { color: #2c3e50; }
            .endpoint { margin: 20px 0; padding: 15px; background: #f8f9fa; border-radius: 5px; }
            .method { font-weight: bold; color: #27ae60; }
        </style>
    </head>
    <body>
        <h1 class="header">Legal RAG Service API</h1>
        <p>Retrieval-augmented question answering over Indian legal documents.</p>

        <h2>Available Endpoints</h2>

        <div class="endpoint">
            <span class="method">POST</span> /documents
            <p>Ingest a legal document; processing runs in the background.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /documents/{id}/status
            <p>Check the ingestion status of a document.</p>
        </div>

        <div class="endpoint">
            <span class="method">POST</span> /search
            <p>Search indexed documents and generate a grounded answer.</p>
        </div>

        <div class="endpoint">
            <span class="method">GET</span> /health
            <p>Check the health status of all system components.</p>
        </div>

        <h2>Example Search Request</h2>
        <pre>{
  "query": "What is the latest Supreme Court position on anticipatory bail?",
  "top_k": 5,
  "filters": {"court_level": "Supreme Court", "year": {"gte": 2020}}
}</pre>
    </body>
    </html>
    "#;

    Ok(HttpResponse::Ok().content_type("text/html").body(html))
}
