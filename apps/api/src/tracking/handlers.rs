use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::catalog::{fetch_universities_by_ids, fetch_university};
use crate::errors::AppError;
use crate::models::shortlist::{ShortlistEntry, ShortlistRow};
use crate::models::task::TaskRow;
use crate::models::user::UserStage;
use crate::profile::handlers::require_user;
use crate::profile::store::fetch_profile;
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::tracking::shortlist::{
    delete_shortlist, insert_shortlist, list_shortlist, set_lock, shortlist_counts, NewShortlist,
};
use crate::tracking::stage::{advance_stage, set_stage};
use crate::tracking::tasks::{
    delete_task, insert_task, list_open_tasks, list_tasks, update_task, NewTask, TaskUpdate,
};

/// Open tasks shown on the dashboard.
const DASHBOARD_TASKS: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub shortlist_id: i64,
    pub lock: bool,
}

#[derive(Debug, Serialize)]
pub struct StrengthSummary {
    pub academic: Option<String>,
    pub exam: Option<String>,
    pub sop: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub current_stage: String,
    pub onboarding_completed: bool,
    pub tasks: Vec<TaskRow>,
    pub shortlisted_count: i64,
    pub locked_count: i64,
    pub profile_strength: StrengthSummary,
}

// ────────────────────────────────────────────────────────────────────────────
// Tasks
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/tasks
pub async fn handle_list_tasks(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<TaskRow>>, AppError> {
    Ok(Json(list_tasks(&state.db, params.user_id).await?))
}

/// POST /api/v1/tasks
pub async fn handle_create_task(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(task): Json<NewTask>,
) -> Result<(StatusCode, Json<TaskRow>), AppError> {
    if task.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    require_user(&state, params.user_id).await?;
    let row = insert_task(&state.db, params.user_id, &task).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// PUT /api/v1/tasks/:id
pub async fn handle_update_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
    Json(update): Json<TaskUpdate>,
) -> Result<Json<TaskRow>, AppError> {
    update_task(&state.db, params.user_id, task_id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Task {task_id} not found")))
}

/// DELETE /api/v1/tasks/:id
pub async fn handle_delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    if !delete_task(&state.db, params.user_id, task_id).await? {
        return Err(AppError::NotFound(format!("Task {task_id} not found")));
    }
    Ok(Json(json!({ "success": true })))
}

// ────────────────────────────────────────────────────────────────────────────
// Shortlist
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/shortlist
pub async fn handle_add_shortlist(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(entry): Json<NewShortlist>,
) -> Result<(StatusCode, Json<ShortlistRow>), AppError> {
    require_user(&state, params.user_id).await?;
    if fetch_university(&state.db, entry.university_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "University {} not found",
            entry.university_id
        )));
    }

    let mut tx = state.db.begin().await?;
    let row = insert_shortlist(&mut *tx, params.user_id, &entry)
        .await?
        .ok_or_else(|| AppError::Conflict("University already shortlisted".to_string()))?;
    advance_stage(
        &mut *tx,
        params.user_id,
        UserStage::DiscoveringUniversities,
        UserStage::FinalizingUniversities,
    )
    .await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(row)))
}

/// GET /api/v1/shortlist
pub async fn handle_list_shortlist(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<ShortlistEntry>>, AppError> {
    let rows = list_shortlist(&state.db, params.user_id).await?;
    let ids: Vec<i64> = rows.iter().map(|r| r.university_id).collect();
    let mut universities: HashMap<i64, _> = fetch_universities_by_ids(&state.db, &ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let entries = rows
        .into_iter()
        .filter_map(|shortlist| {
            let university = universities.remove(&shortlist.university_id);
            if university.is_none() {
                warn!(
                    "Shortlist {} references missing university {}",
                    shortlist.id, shortlist.university_id
                );
            }
            university.map(|university| ShortlistEntry {
                shortlist,
                university,
            })
        })
        .collect();

    Ok(Json(entries))
}

/// POST /api/v1/shortlist/lock
pub async fn handle_lock_shortlist(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<LockRequest>,
) -> Result<Json<Value>, AppError> {
    let mut tx = state.db.begin().await?;
    set_lock(&mut *tx, params.user_id, req.shortlist_id, req.lock)
        .await?
        .ok_or_else(|| AppError::NotFound("Shortlisted university not found".to_string()))?;
    if req.lock {
        set_stage(&mut *tx, params.user_id, UserStage::PreparingApplications).await?;
    }
    tx.commit().await?;

    info!(
        "User {} {} shortlist entry {}",
        params.user_id,
        if req.lock { "locked" } else { "unlocked" },
        req.shortlist_id
    );
    Ok(Json(json!({ "success": true, "locked": req.lock })))
}

/// DELETE /api/v1/shortlist/:id
pub async fn handle_delete_shortlist(
    State(state): State<AppState>,
    Path(shortlist_id): Path<i64>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Value>, AppError> {
    if !delete_shortlist(&state.db, params.user_id, shortlist_id).await? {
        return Err(AppError::NotFound(
            "Shortlisted university not found".to_string(),
        ));
    }
    Ok(Json(json!({ "success": true })))
}

// ────────────────────────────────────────────────────────────────────────────
// Dashboard
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let user = require_user(&state, params.user_id).await?;
    let profile = fetch_profile(&state.db, user.id).await?;
    let tasks = list_open_tasks(&state.db, user.id, DASHBOARD_TASKS).await?;
    let (shortlisted_count, locked_count) = shortlist_counts(&state.db, user.id).await?;

    let profile_strength = match profile {
        Some(p) => StrengthSummary {
            academic: Some(p.academic_strength),
            exam: Some(p.exam_strength),
            sop: Some(p.sop_strength),
        },
        None => StrengthSummary {
            academic: None,
            exam: None,
            sop: None,
        },
    };

    Ok(Json(DashboardResponse {
        current_stage: user.current_stage,
        onboarding_completed: user.onboarding_completed,
        tasks,
        shortlisted_count,
        locked_count,
        profile_strength,
    }))
}
