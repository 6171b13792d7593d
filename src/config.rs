//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the legal RAG service, supporting
//! multiple sources (files, environment variables, command line arguments) with
//! validation and type-safe access to all system settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables, CLI arguments
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking, range validation, dependency verification
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables
//! 3. Configuration files
//! 4. Default values (lowest priority)
//!
//! ## Usage
//! ```rust,no_run
//! use legal_rag::config::Config;
//!
//! let config = Config::from_file("config.toml").unwrap();
//! println!("Server port: {}", config.server.port);
//! ```

use crate::errors::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// External document-parser service
    pub parser: ParserConfig,
    /// Chunking and processing parameters
    pub processing: ProcessingConfig,
    /// Embedding model collaborator
    pub embedding: EmbeddingConfig,
    /// Vector store (Qdrant) collaborator
    pub vector_store: VectorStoreConfig,
    /// Answer-generation collaborator
    pub llm: LlmConfig,
    /// Retrieval behavior
    pub search: SearchConfig,
    /// Document registry settings
    pub storage: StorageConfig,
    /// Logging and monitoring
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Maximum accepted document size in MB
    pub max_upload_size_mb: u64,
    /// File extensions accepted for ingestion (lowercase, with dot)
    pub allowed_extensions: Vec<String>,
    /// Enable CORS
    pub enable_cors: bool,
    /// Number of worker threads for the HTTP server
    pub workers: usize,
}

/// External parser service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Use the external parser for parsing/chunking; when false, every
    /// document takes the local extraction path
    pub enabled: bool,
    /// Parser API base URL
    pub api_url: String,
    /// Request timeout in seconds (parsing large documents is slow)
    pub timeout_seconds: u64,
}

/// Chunking and processing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Sliding-window chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

/// Embedding model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding service base URL
    pub api_url: String,
    /// Model identifier sent to the service
    pub model: String,
    /// Vector dimension (must match model output)
    pub dimension: usize,
    /// Batch size for embedding generation
    pub batch_size: usize,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    /// Qdrant base URL
    pub url: String,
    /// Default collection name
    pub collection_name: String,
    /// API key for authentication (optional)
    pub api_key: Option<String>,
}

/// LLM client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions base URL
    pub api_url: String,
    /// API key for authentication (optional)
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

/// Retrieval behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of results
    pub default_top_k: usize,
    /// Maximum number of results a request may ask for
    pub max_top_k: usize,
    /// Minimum similarity score for retrieved chunks
    pub score_threshold: f32,
}

/// Document registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file path
    pub db_path: PathBuf,
    /// Compress stored full text
    pub enable_compression: bool,
}

/// Logging and monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable structured JSON logging
    pub json_format: bool,
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides()?;
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| RagError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| RagError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("LEGAL_RAG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("LEGAL_RAG_PORT") {
            self.server.port = port.parse().map_err(|_| RagError::Config {
                message: "Invalid port number in LEGAL_RAG_PORT".to_string(),
            })?;
        }
        if let Ok(url) = std::env::var("LEGAL_RAG_PARSER_URL") {
            self.parser.api_url = url;
        }
        if let Ok(url) = std::env::var("LEGAL_RAG_EMBEDDING_URL") {
            self.embedding.api_url = url;
        }
        if let Ok(url) = std::env::var("LEGAL_RAG_QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Ok(key) = std::env::var("LEGAL_RAG_QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("LEGAL_RAG_LLM_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(db_path) = std::env::var("LEGAL_RAG_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(RagError::ValidationFailed {
                field: "server.port".to_string(),
                reason: "Port cannot be zero".to_string(),
            });
        }

        if self.processing.chunk_size == 0 {
            return Err(RagError::ValidationFailed {
                field: "processing.chunk_size".to_string(),
                reason: "Chunk size must be greater than zero".to_string(),
            });
        }

        if self.embedding.dimension == 0 {
            return Err(RagError::ValidationFailed {
                field: "embedding.dimension".to_string(),
                reason: "Vector dimension must be greater than zero".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.search.score_threshold) {
            return Err(RagError::ValidationFailed {
                field: "search.score_threshold".to_string(),
                reason: "Score threshold must be within [0, 1]".to_string(),
            });
        }

        if self.search.default_top_k == 0 || self.search.default_top_k > self.search.max_top_k {
            return Err(RagError::ValidationFailed {
                field: "search.default_top_k".to_string(),
                reason: "default_top_k must be within [1, max_top_k]".to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RagError::Config {
            message: format!("Failed to serialize config to TOML: {}", e),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                max_upload_size_mb: 50,
                allowed_extensions: vec![".pdf".to_string(), ".txt".to_string()],
                enable_cors: true,
                workers: num_cpus::get(),
            },
            parser: ParserConfig {
                enabled: false,
                api_url: "http://localhost:8000".to_string(),
                timeout_seconds: 300,
            },
            processing: ProcessingConfig {
                chunk_size: 1000,
                chunk_overlap: 200,
            },
            embedding: EmbeddingConfig {
                api_url: "http://localhost:8081".to_string(),
                model: "nlpaueb/legal-bert-base-uncased".to_string(),
                dimension: 768,
                batch_size: 32,
                timeout_seconds: 60,
            },
            vector_store: VectorStoreConfig {
                url: "http://localhost:6333".to_string(),
                collection_name: "legal_documents".to_string(),
                api_key: None,
            },
            llm: LlmConfig {
                api_url: "https://api.groq.com/openai/v1".to_string(),
                api_key: None,
                model: "llama-3.1-70b-versatile".to_string(),
                temperature: 0.1,
                max_tokens: 2048,
                timeout_seconds: 120,
            },
            search: SearchConfig {
                default_top_k: 5,
                max_top_k: 50,
                score_threshold: 0.5,
            },
            storage: StorageConfig {
                db_path: PathBuf::from("./data/legal_rag.db"),
                enable_compression: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json_format: false,
            },
        }
    }
}
