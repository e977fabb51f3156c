//! Application state for the SAHAB server

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::memory::{ConversationMemory, SessionStore, SharedMemory};
use crate::pipeline::RagService;
use crate::types::ChatRequest;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Pipeline, present once the index is loaded
    service: RwLock<Option<Arc<RagService>>>,
    /// Per-session conversation memories
    sessions: SessionStore,
}

impl AppState {
    /// Create state that is not ready yet
    pub fn new(config: RagConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                service: RwLock::new(None),
                sessions: SessionStore::new(),
            }),
        }
    }

    /// Create state that is immediately ready
    pub fn with_service(config: RagConfig, service: RagService) -> Self {
        let state = Self::new(config);
        state.set_service(Arc::new(service));
        state
    }

    /// Get configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// Install the pipeline; the server is ready from now on
    pub fn set_service(&self, service: Arc<RagService>) {
        *self.inner.service.write() = Some(service);
    }

    /// The pipeline, if initialization has finished
    pub fn service(&self) -> Option<Arc<RagService>> {
        self.inner.service.read().clone()
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        self.inner.service.read().is_some()
    }

    /// Session registry
    pub fn sessions(&self) -> &SessionStore {
        &self.inner.sessions
    }

    /// Memory a request should use
    ///
    /// Requests with a session id share that session's memory; requests
    /// without one get a throwaway memory seeded from their own history.
    pub fn memory_for(&self, request: &ChatRequest) -> SharedMemory {
        match request.session_id {
            Some(id) => self.inner.sessions.get_or_create(id, &request.history),
            None => Arc::new(Mutex::new(ConversationMemory::from_history(
                &request.history,
            ))),
        }
    }
}
