//! Error types for the legal RAG pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
///
/// Only `IndexBuild` and `IndexLoad` are fatal, and only during startup.
/// Everything raised while answering a query is degraded into a fragment
/// by the pipeline before it reaches the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Building the index from the corpus failed
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// Loading a persisted index failed or the index is incompatible
    #[error("Index load failed: {0}")]
    IndexLoad(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Retrieval error (embedding the question or querying the index)
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// Generative model error
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Translation provider error
    #[error("Translation failed: {0}")]
    Translation(String),

    /// Index not loaded yet
    #[error("System is initializing")]
    NotReady,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an index build error
    pub fn index_build(message: impl Into<String>) -> Self {
        Self::IndexBuild(message.into())
    }

    /// Create an index load error
    pub fn index_load(message: impl Into<String>) -> Self {
        Self::IndexLoad(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }

    /// Create a translation error
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error must stop the process from serving queries
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::IndexBuild(_) | Self::IndexLoad(_) | Self::Config(_))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::BAD_REQUEST, "config_error", msg.clone()),
            Error::IndexBuild(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "index_build_error", msg.clone())
            }
            Error::IndexLoad(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "index_load_error", msg.clone())
            }
            Error::Embedding(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error", msg.clone())
            }
            Error::Retrieval(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "retrieval_error", msg.clone())
            }
            Error::Generation(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "generation_error", msg.clone())
            }
            Error::Translation(msg) => {
                (StatusCode::BAD_GATEWAY, "translation_error", msg.clone())
            }
            Error::NotReady => (
                StatusCode::SERVICE_UNAVAILABLE,
                "not_ready",
                self.to_string(),
            ),
            Error::Io(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "io_error",
                err.to_string(),
            ),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
