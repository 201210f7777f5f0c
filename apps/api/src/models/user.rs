use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub onboarding_completed: bool,
    pub current_stage: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Where a student is in the application journey. Stored as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStage {
    BuildingProfile,
    DiscoveringUniversities,
    FinalizingUniversities,
    PreparingApplications,
}

impl UserStage {
    pub const ALL: [UserStage; 4] = [
        UserStage::BuildingProfile,
        UserStage::DiscoveringUniversities,
        UserStage::FinalizingUniversities,
        UserStage::PreparingApplications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserStage::BuildingProfile => "building_profile",
            UserStage::DiscoveringUniversities => "discovering_universities",
            UserStage::FinalizingUniversities => "finalizing_universities",
            UserStage::PreparingApplications => "preparing_applications",
        }
    }
}

impl fmt::Display for UserStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_round_trips_through_str() {
        for stage in UserStage::ALL {
            assert_eq!(stage.as_str().parse::<UserStage>().unwrap(), stage);
        }
    }

    #[test]
    fn test_unknown_stage_is_rejected() {
        assert!("applying".parse::<UserStage>().is_err());
        assert!("".parse::<UserStage>().is_err());
    }

    #[test]
    fn test_stage_serde_is_snake_case() {
        let json = serde_json::to_string(&UserStage::FinalizingUniversities).unwrap();
        assert_eq!(json, r#""finalizing_universities""#);
    }
}
