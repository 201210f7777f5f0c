use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::profile::ProfileRow;
use crate::models::user::User;
use crate::profile::store::{
    complete_onboarding, fetch_profile, fetch_user, insert_profile, insert_user, save_profile,
};
use crate::profile::strength::{analyze_profile, derive_strengths, ProfileAnalysis};
use crate::routes::UserIdQuery;
use crate::state::AppState;
use crate::tracking::tasks::{initial_tasks, insert_task};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
}

/// Onboarding form. Every field the profile stores except the derived strengths.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileCreate {
    pub education_level: String,
    pub degree: String,
    pub major: String,
    pub graduation_year: i32,
    pub gpa: Option<f64>,
    pub age: Option<i32>,
    pub intended_degree: String,
    pub field_of_study: String,
    pub target_intake_year: i32,
    pub preferred_countries: String,
    #[serde(default)]
    pub budget_min: f64,
    #[serde(default)]
    pub budget_max: f64,
    pub funding_plan: String,
    pub ielts_score: Option<f64>,
    pub toefl_score: Option<i32>,
    pub gre_score: Option<i32>,
    pub gmat_score: Option<i32>,
    pub sop_status: String,
}

impl ProfileCreate {
    fn into_row(self, user_id: i64) -> ProfileRow {
        let mut row = ProfileRow {
            user_id,
            education_level: self.education_level,
            degree: self.degree,
            major: self.major,
            graduation_year: self.graduation_year,
            gpa: self.gpa,
            age: self.age,
            intended_degree: self.intended_degree,
            field_of_study: self.field_of_study,
            target_intake_year: self.target_intake_year,
            preferred_countries: self.preferred_countries,
            budget_min: self.budget_min,
            budget_max: self.budget_max,
            funding_plan: self.funding_plan,
            ielts_score: self.ielts_score,
            toefl_score: self.toefl_score,
            gre_score: self.gre_score,
            gmat_score: self.gmat_score,
            sop_status: self.sop_status,
            ..ProfileRow::default()
        };
        apply_strengths(&mut row);
        row
    }
}

/// Partial profile update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub education_level: Option<String>,
    pub degree: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub gpa: Option<f64>,
    pub age: Option<i32>,
    pub intended_degree: Option<String>,
    pub field_of_study: Option<String>,
    pub target_intake_year: Option<i32>,
    pub preferred_countries: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub funding_plan: Option<String>,
    pub ielts_score: Option<f64>,
    pub toefl_score: Option<i32>,
    pub gre_score: Option<i32>,
    pub gmat_score: Option<i32>,
    pub sop_status: Option<String>,
}

impl ProfileUpdate {
    /// Merges into `row` and re-derives the strength tiers.
    pub fn apply(self, row: &mut ProfileRow) {
        if let Some(v) = self.education_level {
            row.education_level = v;
        }
        if let Some(v) = self.degree {
            row.degree = v;
        }
        if let Some(v) = self.major {
            row.major = v;
        }
        if let Some(v) = self.graduation_year {
            row.graduation_year = v;
        }
        if let Some(v) = self.intended_degree {
            row.intended_degree = v;
        }
        if let Some(v) = self.field_of_study {
            row.field_of_study = v;
        }
        if let Some(v) = self.target_intake_year {
            row.target_intake_year = v;
        }
        if let Some(v) = self.preferred_countries {
            row.preferred_countries = v;
        }
        if let Some(v) = self.budget_min {
            row.budget_min = v;
        }
        if let Some(v) = self.budget_max {
            row.budget_max = v;
        }
        if let Some(v) = self.funding_plan {
            row.funding_plan = v;
        }
        if let Some(v) = self.sop_status {
            row.sop_status = v;
        }

        // Nullable scores: only overwritten when sent.
        row.gpa = self.gpa.or(row.gpa);
        row.age = self.age.or(row.age);
        row.ielts_score = self.ielts_score.or(row.ielts_score);
        row.toefl_score = self.toefl_score.or(row.toefl_score);
        row.gre_score = self.gre_score.or(row.gre_score);
        row.gmat_score = self.gmat_score.or(row.gmat_score);

        apply_strengths(row);
    }
}

fn apply_strengths(row: &mut ProfileRow) {
    let tiers = derive_strengths(row);
    row.academic_strength = tiers.academic.as_str().to_string();
    row.exam_strength = tiers.exam.as_str().to_string();
    row.sop_strength = tiers.sop.as_str().to_string();
}

fn validate_user_request(req: &CreateUserRequest) -> Result<(), AppError> {
    if req.full_name.trim().is_empty() {
        return Err(AppError::Validation("full_name must not be empty".to_string()));
    }
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(format!("'{email}' is not a valid email")));
    }
    Ok(())
}

fn validate_profile(row: &ProfileRow) -> Result<(), AppError> {
    if row.budget_min < 0.0 || row.budget_max < 0.0 {
        return Err(AppError::Validation("budget must not be negative".to_string()));
    }
    if row.gpa.is_some_and(|g| g < 0.0) || row.ielts_score.is_some_and(|s| s < 0.0) {
        return Err(AppError::Validation("scores must not be negative".to_string()));
    }
    Ok(())
}

/// Loads the caller or fails with 404. Shared by every per-user handler.
pub async fn require_user(state: &AppState, user_id: i64) -> Result<User, AppError> {
    fetch_user(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
}

pub async fn require_profile(state: &AppState, user_id: i64) -> Result<ProfileRow, AppError> {
    fetch_profile(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id} not found")))
}

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    validate_user_request(&req)?;
    let email = req.email.trim().to_lowercase();
    let user = insert_user(&state.db, &email, req.full_name.trim())
        .await?
        .ok_or_else(|| AppError::Conflict(format!("Email {email} is already registered")))?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>, AppError> {
    Ok(Json(require_user(&state, user_id).await?))
}

/// POST /api/v1/profile
/// Completes onboarding: stores the profile, moves the user to university
/// discovery and seeds the starter tasks, all in one transaction.
pub async fn handle_create_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(req): Json<ProfileCreate>,
) -> Result<(StatusCode, Json<ProfileRow>), AppError> {
    require_user(&state, params.user_id).await?;
    let row = req.into_row(params.user_id);
    validate_profile(&row)?;

    let mut tx = state.db.begin().await?;
    let profile = insert_profile(&mut *tx, &row)
        .await?
        .ok_or_else(|| AppError::Conflict("Profile already exists".to_string()))?;
    complete_onboarding(&mut *tx, params.user_id).await?;
    for task in initial_tasks() {
        insert_task(&mut *tx, params.user_id, &task).await?;
    }
    tx.commit().await?;

    info!(
        "Onboarding completed for user {} (academic={}, exam={}, sop={})",
        params.user_id, profile.academic_strength, profile.exam_strength, profile.sop_strength
    );
    Ok((StatusCode::CREATED, Json(profile)))
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileRow>, AppError> {
    Ok(Json(require_profile(&state, params.user_id).await?))
}

/// PUT /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileRow>, AppError> {
    let mut row = require_profile(&state, params.user_id).await?;
    update.apply(&mut row);
    validate_profile(&row)?;
    let saved = save_profile(&state.db, &row).await?;
    Ok(Json(saved))
}

/// GET /api/v1/profile/analysis
pub async fn handle_profile_analysis(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<ProfileAnalysis>, AppError> {
    let profile = require_profile(&state, params.user_id).await?;
    Ok(Json(analyze_profile(&profile)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn onboarding_form() -> ProfileCreate {
        serde_json::from_value(serde_json::json!({
            "education_level": "Bachelor's",
            "degree": "B.Tech",
            "major": "Computer Science",
            "graduation_year": 2025,
            "gpa": 3.6,
            "intended_degree": "Master's",
            "field_of_study": "Data Science",
            "target_intake_year": 2026,
            "preferred_countries": "Germany, Canada",
            "budget_min": 20000,
            "budget_max": 40000,
            "funding_plan": "Self-funded",
            "ielts_score": 6.5,
            "sop_status": "Draft"
        }))
        .unwrap()
    }

    #[test]
    fn test_create_derives_strengths() {
        let row = onboarding_form().into_row(3);
        assert_eq!(row.user_id, 3);
        assert_eq!(row.academic_strength, "strong");
        assert_eq!(row.exam_strength, "average");
        assert_eq!(row.sop_strength, "average");
        assert_eq!(row.toefl_score, None);
    }

    #[test]
    fn test_update_keeps_absent_fields_and_recomputes() {
        let mut row = onboarding_form().into_row(3);
        let update: ProfileUpdate = serde_json::from_value(serde_json::json!({
            "sop_status": "Ready",
            "toefl_score": 104
        }))
        .unwrap();
        update.apply(&mut row);

        assert_eq!(row.major, "Computer Science");
        assert_eq!(row.gpa, Some(3.6));
        assert_eq!(row.toefl_score, Some(104));
        assert_eq!(row.sop_strength, "strong");
        assert_eq!(row.exam_strength, "strong");
    }

    #[test]
    fn test_profile_validation() {
        let mut row = onboarding_form().into_row(1);
        assert!(validate_profile(&row).is_ok());

        // min above max is tolerated; only negatives are rejected.
        row.budget_min = 50000.0;
        assert!(validate_profile(&row).is_ok());

        row.budget_max = -1.0;
        assert!(matches!(validate_profile(&row), Err(AppError::Validation(_))));

        row.budget_max = 40000.0;
        row.gpa = Some(-0.5);
        assert!(matches!(validate_profile(&row), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_user_request_validation() {
        let ok = CreateUserRequest {
            email: "ana@example.com".to_string(),
            full_name: "Ana".to_string(),
        };
        assert!(validate_user_request(&ok).is_ok());

        let bad_email = CreateUserRequest {
            email: "ana".to_string(),
            full_name: "Ana".to_string(),
        };
        assert!(validate_user_request(&bad_email).is_err());

        let no_name = CreateUserRequest {
            email: "ana@example.com".to_string(),
            full_name: "  ".to_string(),
        };
        assert!(validate_user_request(&no_name).is_err());
    }
}
