use std::sync::Arc;

use crate::assistant::memory::ConversationMemory;
use crate::assistant::router::ConversationRouter;
use crate::matching::pipeline::MatchPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<MatchPipeline>,
    pub assistant: Arc<ConversationRouter>,
    /// Same store the assistant writes to; exposed for the history endpoints.
    pub memory: Arc<ConversationMemory>,
}
