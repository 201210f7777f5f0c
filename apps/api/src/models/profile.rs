use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A student's onboarding profile. One row per user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ProfileRow {
    pub id: i64,
    pub user_id: i64,

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

    pub budget_min: f64,
    pub budget_max: f64,
    pub funding_plan: String,

    pub ielts_score: Option<f64>,
    pub toefl_score: Option<i32>,
    pub gre_score: Option<i32>,
    pub gmat_score: Option<i32>,
    pub sop_status: String,

    pub academic_strength: String,
    pub exam_strength: String,
    pub sop_strength: String,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
