//! Corpus ingestion: reading the statute text and cutting it into passages

mod chunker;
mod corpus;

pub use chunker::{chunk_text, TextChunker};
pub use corpus::load_corpus;
