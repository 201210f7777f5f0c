use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::catalog::list_universities;
use crate::counsellor::actions::ParsedAction;
use crate::counsellor::advisor::ChatTurn;
use crate::counsellor::context::{render_user_context, AdvisorContext, TOP_MATCHES};
use crate::counsellor::executor::{execute_actions, ActionOutcome, ActionStatus};
use crate::counsellor::fit_scoring::{recommend, Recommendation};
use crate::counsellor::history::{insert_message, list_messages, recent_messages};
use crate::counsellor::prompts::HISTORY_WINDOW;
use crate::errors::AppError;
use crate::models::chat::{ChatMessageRow, ROLE_ASSISTANT, ROLE_USER};
use crate::profile::handlers::{require_profile, require_user};
use crate::profile::store::fetch_profile;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::tracking::shortlist::shortlist_counts;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub actions: Vec<ParsedAction>,
    /// One entry per action, in order. Empty when the turn's transaction failed.
    pub action_results: Vec<ActionOutcome>,
    pub success: bool,
    pub is_mock: bool,
}

/// GET /api/v1/universities/recommendations
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<Recommendation>>, AppError> {
    let profile = require_profile(&state, params.user_id).await?;
    let universities = list_universities(&state.db, None).await?;
    Ok(Json(recommend(&profile, &universities)))
}

/// GET /api/v1/chat/history
pub async fn handle_chat_history(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ChatMessageRow>>, AppError> {
    Ok(Json(list_messages(&state.db, params.user_id).await?))
}

/// POST /api/v1/chat
/// One counsellor turn: store the message, ask the advisor, store the reply and
/// apply any actions it carries. Action failures never fail the turn.
pub async fn handle_chat(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(AppError::Validation("message must not be empty".to_string()));
    }

    let user = require_user(&state, params.user_id).await?;
    let profile = fetch_profile(&state.db, user.id)
        .await?
        .ok_or_else(|| AppError::Validation("Please complete onboarding first".to_string()))?;

    insert_message(&state.db, user.id, ROLE_USER, message).await?;

    let universities = list_universities(&state.db, None).await?;
    let mut matches = recommend(&profile, &universities);
    matches.truncate(TOP_MATCHES);
    let (shortlisted, locked) = shortlist_counts(&state.db, user.id).await?;

    let user_context = render_user_context(&AdvisorContext {
        user: &user,
        profile: &profile,
        shortlisted_count: usize::try_from(shortlisted).unwrap_or_default(),
        locked_count: usize::try_from(locked).unwrap_or_default(),
        top_matches: &matches,
    });

    // Window plus the message just stored.
    let history = recent_messages(&state.db, user.id, HISTORY_WINDOW as i64 + 1).await?;

    let reply = state
        .advisor
        .respond(&ChatTurn {
            message,
            user: &user,
            profile: &profile,
            history: &history,
            user_context: &user_context,
        })
        .await;

    insert_message(&state.db, user.id, ROLE_ASSISTANT, &reply.message).await?;

    let action_results = match execute_actions(&state.db, user.id, &reply.actions).await {
        Ok(outcomes) => {
            let failed = outcomes
                .iter()
                .filter(|o| o.status == ActionStatus::Failed)
                .count();
            if failed > 0 {
                warn!("{failed} advisor action(s) failed for user {}", user.id);
            }
            outcomes
        }
        Err(e) => {
            error!("Failed to apply advisor actions for user {}: {e}", user.id);
            Vec::new()
        }
    };

    Ok(Json(ChatResponse {
        message: reply.message,
        actions: reply.actions,
        action_results,
        success: true,
        is_mock: reply.is_mock,
    }))
}
