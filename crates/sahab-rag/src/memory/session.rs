//! Session registry: one conversation memory per session id

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use crate::types::ChatMessage;

use super::conversation::ConversationMemory;

/// Shared handle to one session's memory
///
/// The lock is only held for synchronous reads and writes, never across
/// an `.await`.
pub type SharedMemory = Arc<Mutex<ConversationMemory>>;

/// Independent conversation memories keyed by session
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SharedMemory>,
}

impl SessionStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory for `id`, created (seeded from `history`) on first use
    pub fn get_or_create(&self, id: Uuid, history: &[ChatMessage]) -> SharedMemory {
        self.sessions
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!("New session {}", id);
                Arc::new(Mutex::new(ConversationMemory::from_history(history)))
            })
            .clone()
    }

    /// Memory for `id` if the session exists
    pub fn get(&self, id: &Uuid) -> Option<SharedMemory> {
        self.sessions.get(id).map(|entry| Arc::clone(entry.value()))
    }

    /// Clear a session's turns; false if it does not exist
    pub fn reset(&self, id: &Uuid) -> bool {
        match self.get(id) {
            Some(memory) => {
                memory.lock().clear();
                true
            }
            None => false,
        }
    }

    /// Drop a session entirely
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether there are no sessions
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ConversationTurn;

    #[test]
    fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.get_or_create(a, &[]).lock().append(ConversationTurn::user("bail?"));
        assert_eq!(store.get_or_create(a, &[]).lock().len(), 1);
        assert!(store.get_or_create(b, &[]).lock().is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_history_only_seeds_new_sessions() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        let history = vec![ConversationTurn::user("first")];

        assert_eq!(store.get_or_create(id, &history).lock().len(), 1);
        assert_eq!(store.get_or_create(id, &history).lock().len(), 1);
    }

    #[test]
    fn test_reset_and_remove() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store.get_or_create(id, &[ConversationTurn::user("q")]);

        assert!(store.reset(&id));
        assert!(store.get(&id).unwrap().lock().is_empty());
        assert!(store.remove(&id));
        assert!(!store.reset(&id));
        assert!(store.is_empty());
    }
}
