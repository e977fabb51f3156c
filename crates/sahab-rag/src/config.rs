//! Configuration for the legal RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Statute corpus location
    pub corpus: CorpusConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Generative model configuration
    pub llm: LlmConfig,
    /// Persisted index configuration
    pub index: IndexConfig,
    /// Retrieval and prompt policy
    pub retrieval: RetrievalConfig,
    /// Conversation memory
    pub memory: MemoryConfig,
    /// Output translation
    pub translation: TranslationConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment
    /// overrides (a `.env` file in the working directory is honoured).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file; missing sections and fields take their defaults
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::config(format!("Invalid config: {}", e)))
    }

    /// Apply `GOOGLE_API_KEY` and `SAHAB_*` environment overrides
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
            if self.llm.api_key.is_none() {
                self.llm.api_key = Some(key.clone());
            }
            if self.embeddings.api_key.is_none() {
                self.embeddings.api_key = Some(key);
            }
        }
        if let Ok(path) = std::env::var("SAHAB_CORPUS_PATH") {
            self.corpus.path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("SAHAB_INDEX_PATH") {
            self.index.path = PathBuf::from(path);
        }
        if let Ok(host) = std::env::var("SAHAB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("SAHAB_PORT").ok().and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Ok(model) = std::env::var("SAHAB_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.llm.ollama_url = url.clone();
            self.embeddings.ollama_url = url;
        }
    }

    /// Reject settings the pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::config("chunking.chunk_size must be greater than zero"));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::config("retrieval.top_k must be greater than zero"));
        }
        if self.embeddings.dimensions == 0 {
            return Err(Error::config("embeddings.dimensions must be greater than zero"));
        }
        if self.embeddings.batch_size == 0 {
            return Err(Error::config("embeddings.batch_size must be greater than zero"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("llm.timeout_secs must be greater than zero"));
        }
        if self.llm.idle_timeout_secs == 0 {
            return Err(Error::config("llm.idle_timeout_secs must be greater than zero"));
        }
        if self.llm.stream_buffer == 0 {
            return Err(Error::config("llm.stream_buffer must be greater than zero"));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
        }
    }
}

/// Location of the statute text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Plain-text corpus, read once when the index is built
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data").join("ipc_law.txt"),
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive windows in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Google Generative Language API
    Gemini,
    /// Offline feature-hashing embedder
    Hashing,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which provider computes embeddings
    pub backend: EmbeddingBackend,
    /// Model name (recorded in the index manifest)
    pub model: String,
    /// Embedding dimensions (768 for nomic-embed-text and text-embedding-004)
    pub dimensions: usize,
    /// Texts embedded per batch while building the index
    pub batch_size: usize,
    /// Ollama base URL
    pub ollama_url: String,
    /// Google API key (falls back to `GOOGLE_API_KEY`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Ollama,
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 32,
            ollama_url: "http://localhost:11434".to_string(),
            api_key: None,
        }
    }
}

/// Generative model backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Google Gemini
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which provider generates answers
    pub backend: LlmBackend,
    /// Generation model name
    pub model: String,
    /// Ollama base URL
    pub ollama_url: String,
    /// Google API key (falls back to `GOOGLE_API_KEY`)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Temperature for generation
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_output_tokens: u32,
    /// Seconds to wait for the provider to accept the request
    pub timeout_secs: u64,
    /// Seconds to wait for each subsequent fragment
    pub idle_timeout_secs: u64,
    /// Retries for failed request initiation (never mid-stream)
    pub max_retries: u32,
    /// Fragments buffered between the provider task and the caller
    pub stream_buffer: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Gemini,
            model: "gemini-2.5-pro".to_string(),
            ollama_url: "http://localhost:11434".to_string(),
            api_key: None,
            temperature: 0.5,
            max_output_tokens: 1024,
            timeout_secs: 60,
            idle_timeout_secs: 30,
            max_retries: 2,
            stream_buffer: 64,
        }
    }
}

/// Persisted index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory holding `manifest.json` and `chunks.bin`
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sahab")
            .join("statute_index");

        Self { path }
    }
}

/// Retrieval and prompt policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages retrieved per question
    pub top_k: usize,
    /// Passages scoring below this cosine similarity are dropped (0.0 keeps all)
    pub similarity_threshold: f32,
    /// Refuse to answer beyond the corpus instead of falling back to
    /// general legal knowledge
    pub closed_book: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            similarity_threshold: 0.0,
            closed_book: false,
        }
    }
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Most recent turns rendered into the prompt (two exchanges by default)
    pub history_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { history_window: 4 }
    }
}

/// Translation backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TranslationBackend {
    /// Public Google Translate endpoint
    #[default]
    Google,
    /// Never translate; non-default languages receive the original text
    Disabled,
}

/// Output translation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    /// Which translator handles non-default languages
    pub backend: TranslationBackend,
    /// Language the model answers in; requests for it are never translated
    pub default_language: String,
    /// Translation endpoint
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackend::Google,
            default_language: "English".to_string(),
            base_url: "https://translate.googleapis.com/translate_a/single".to_string(),
            timeout_secs: 30,
        }
    }
}
