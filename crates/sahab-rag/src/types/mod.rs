//! Core types for the legal RAG pipeline

pub mod chunk;
pub mod conversation;
pub mod request;

pub use chunk::{Chunk, ChunkId, RetrievalResult, ScoredChunk};
pub use conversation::{ChatMessage, ConversationTurn, Role};
pub use request::{ChatRequest, ChatResponse, GenerationRequest};
