//! Similarity index over statute passages and question retrieval

mod index;
mod search;
mod store;

pub use index::{IndexManifest, VectorIndex, FORMAT_VERSION};
pub use search::Retriever;
pub use store::{build_from_corpus, open_or_build};
