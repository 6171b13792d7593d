//! # Legal RAG Server Main Driver
//!
//! ## Purpose
//! Main entry point for the legal RAG service. Constructs every collaborator
//! once, wires them into the processing pipeline and starts the web server.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file, command line arguments, environment variables
//! - **Output**: Running web server with ingestion and search endpoints
//! - **Initialization**: Opens the registry, bootstraps collections, health checks
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Construct collaborators (registry, parser, embedder, vector store, LLM)
//! 4. Inject them into the hybrid processor and ingestion service
//! 5. Start the web API server
//! 6. Handle shutdown signals gracefully

use anyhow::Context;
use clap::{Arg, ArgAction, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use legal_rag::{
    api::ApiServer,
    chunking::FallbackChunker,
    config::Config,
    embedding::HttpEmbedder,
    ingest::IngestionService,
    llm::HttpLlmClient,
    parser::{DocumentParser, HttpParserClient},
    processor::HybridProcessor,
    storage::DocumentStore,
    text_extract::FileTextExtractor,
    vector_store::{QdrantStore, VectorStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("legal-rag-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Legal RAG Team")
        .about("Retrieval-augmented question answering over Indian legal documents")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Run startup checks and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = Config::from_file(config_path)
        .with_context(|| format!("loading configuration from {}", config_path))?;

    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);
    init_logging(&config)?;

    info!("Starting Legal RAG Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    let app_state = initialize_components(config.clone())
        .await
        .context("initializing components")?;

    if matches.get_flag("check-health") {
        return run_health_checks(&app_state).await;
    }

    let server = ApiServer::new(app_state.clone());
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Legal RAG Service started on {}:{}",
        config.server.host, config.server.port
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    app_state
        .registry
        .flush()
        .await
        .context("flushing registry on shutdown")?;
    info!("Legal RAG Service shut down successfully");

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.clone()));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(fmt_layer.json().with_filter(filter))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt_layer.with_filter(filter))
            .init();
    }

    Ok(())
}

/// Construct every collaborator once and wire the application state.
///
/// Collaborators are created here and injected by reference everywhere else;
/// nothing in the pipeline resolves them lazily.
async fn initialize_components(config: Arc<Config>) -> anyhow::Result<AppState> {
    info!("Initializing application components...");

    let registry = Arc::new(
        DocumentStore::open(config.storage.clone()).context("opening document registry")?,
    );

    let parser: Option<Arc<dyn DocumentParser>> = if config.parser.enabled {
        let client = HttpParserClient::new(&config.parser, &config.embedding)
            .context("building parser client")?;
        Some(Arc::new(client))
    } else {
        info!("External parser disabled; every document takes the local path");
        None
    };

    let chunker = FallbackChunker::new(
        config.processing.chunk_size,
        config.processing.chunk_overlap,
    );
    let processor = Arc::new(
        HybridProcessor::new(parser.clone(), Arc::new(FileTextExtractor::new()), chunker)
            .context("building hybrid processor")?,
    );

    let embedder = Arc::new(
        HttpEmbedder::new(config.embedding.clone()).context("building embedder client")?,
    );
    let vector_store = Arc::new(
        QdrantStore::new(config.vector_store.clone(), config.embedding.dimension)
            .context("building vector store client")?,
    );
    let answerer =
        Arc::new(HttpLlmClient::new(config.llm.clone()).context("building LLM client")?);

    bootstrap_collections(parser.as_deref(), vector_store.as_ref(), &config).await;

    let ingestion = Arc::new(IngestionService::new(
        config.clone(),
        processor,
        embedder.clone(),
        vector_store.clone(),
        registry.clone(),
    ));

    info!("All components initialized successfully");
    Ok(AppState {
        config,
        ingestion,
        registry,
        embedder,
        vector_store,
        answerer,
    })
}

/// Best-effort collection bootstrap on the vector store and parser service.
///
/// Failures are logged rather than fatal so the service can start while the
/// collaborators are still coming up.
async fn bootstrap_collections(
    parser: Option<&dyn DocumentParser>,
    vector_store: &dyn VectorStore,
    config: &Config,
) {
    if let Err(e) = vector_store.ensure_collection().await {
        warn!("Vector store collection bootstrap failed: {}", e);
    }

    if let Some(parser) = parser {
        if let Err(e) = parser
            .create_collection(&config.vector_store.collection_name)
            .await
        {
            warn!("Parser collection bootstrap failed: {}", e);
        }
    }
}

/// Verify component health and exit
async fn run_health_checks(app_state: &AppState) -> anyhow::Result<()> {
    info!("Running health checks...");

    app_state
        .registry
        .health_check()
        .context("registry health check")?;
    info!("Registry is healthy");

    match app_state.vector_store.count().await {
        Ok(count) => info!("Vector store is healthy ({} chunks indexed)", count),
        Err(e) => warn!("Vector store unreachable: {}", e),
    }

    info!("Health checks complete");
    Ok(())
}
