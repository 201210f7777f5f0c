use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A catalog entry. Read-only from the scorer's point of view.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct UniversityRow {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub city: Option<String>,
    pub ranking: Option<i32>,
    pub programs: Option<String>,

    pub min_gpa: Option<f64>,
    pub min_ielts: Option<f64>,
    pub min_toefl: Option<i32>,
    pub min_gre: Option<i32>,
    pub min_gmat: Option<i32>,

    pub tuition_fee_min: Option<f64>,
    pub tuition_fee_max: Option<f64>,
    pub living_cost_yearly: Option<f64>,

    pub acceptance_rate: Option<f64>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub scholarship_available: bool,
    pub scholarship_details: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
}

impl UniversityRow {
    /// Yearly tuition ceiling plus living cost; missing parts count as zero.
    pub fn total_annual_cost(&self) -> f64 {
        self.tuition_fee_max.unwrap_or(0.0) + self.living_cost_yearly.unwrap_or(0.0)
    }
}
