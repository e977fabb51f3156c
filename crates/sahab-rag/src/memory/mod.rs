//! Conversation memory and the per-session registry

mod conversation;
mod session;

pub use conversation::ConversationMemory;
pub use session::{SessionStore, SharedMemory};
