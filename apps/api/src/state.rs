use std::sync::Arc;

use crate::llm_client::LlmBackend;
use crate::session::store::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generation backend. Production: `LlmClient`; tests use a scripted backend.
    pub llm: Arc<dyn LlmBackend>,
    pub sessions: SessionStore,
}
