//! sahab-rag: Legal question answering grounded in statute text
//!
//! The statute corpus is chunked and embedded into a persisted similarity
//! index. Each question retrieves the closest passages, which are merged
//! with recent conversation history into a fixed legal-assistant prompt.
//! The answer streams back fragment by fragment and is translated into the
//! requested language when that is not the default.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod memory;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use memory::{ConversationMemory, SessionStore};
pub use pipeline::{ChatStream, RagService, INITIALIZING_MESSAGE};
pub use types::{
    ChatMessage, ChatRequest, ChatResponse, Chunk, ChunkId, ConversationTurn, GenerationRequest,
    RetrievalResult, Role,
};
