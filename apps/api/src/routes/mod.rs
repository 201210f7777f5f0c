pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;

use crate::catalog;
use crate::counsellor::handlers as counsellor;
use crate::profile::handlers as profile;
use crate::state::AppState;
use crate::tracking::handlers as tracking;

/// Identifies the calling student on every per-user endpoint.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: i64,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Accounts and onboarding
        .route("/api/v1/users", post(profile::handle_create_user))
        .route("/api/v1/users/:id", get(profile::handle_get_user))
        .route(
            "/api/v1/profile",
            post(profile::handle_create_profile)
                .get(profile::handle_get_profile)
                .put(profile::handle_update_profile),
        )
        .route(
            "/api/v1/profile/analysis",
            get(profile::handle_profile_analysis),
        )
        // Catalog and recommendations
        .route(
            "/api/v1/universities",
            get(catalog::handle_list_universities),
        )
        .route(
            "/api/v1/universities/recommendations",
            get(counsellor::handle_recommendations),
        )
        // Shortlist
        .route(
            "/api/v1/shortlist",
            post(tracking::handle_add_shortlist).get(tracking::handle_list_shortlist),
        )
        .route(
            "/api/v1/shortlist/lock",
            post(tracking::handle_lock_shortlist),
        )
        .route(
            "/api/v1/shortlist/:id",
            delete(tracking::handle_delete_shortlist),
        )
        // Tasks
        .route(
            "/api/v1/tasks",
            get(tracking::handle_list_tasks).post(tracking::handle_create_task),
        )
        .route(
            "/api/v1/tasks/:id",
            put(tracking::handle_update_task).delete(tracking::handle_delete_task),
        )
        // Counsellor chat
        .route("/api/v1/chat", post(counsellor::handle_chat))
        .route("/api/v1/chat/history", get(counsellor::handle_chat_history))
        .route("/api/v1/dashboard", get(tracking::handle_dashboard))
        .with_state(state)
}
