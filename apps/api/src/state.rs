use std::sync::Arc;

use sqlx::PgPool;

use crate::counsellor::advisor::Advisor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Answers chat turns. `LlmAdvisor` when a usable Gemini key is configured,
    /// otherwise `RuleBasedAdvisor`.
    pub advisor: Arc<dyn Advisor>,
}
