use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::university::UniversityRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShortlistRow {
    pub id: i64,
    pub user_id: i64,
    pub university_id: i64,
    pub category: String,
    pub is_locked: bool,
    pub fit_score: f64,
    pub risk_level: String,
    pub ai_reasoning: String,
    pub created_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
}

/// Shortlist entry with its university embedded, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ShortlistEntry {
    #[serde(flatten)]
    pub shortlist: ShortlistRow,
    pub university: UniversityRow,
}
