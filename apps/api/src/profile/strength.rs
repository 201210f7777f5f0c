use serde::{Deserialize, Serialize};

use crate::models::profile::ProfileRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileStrength {
    Strong,
    Average,
    Weak,
}

impl ProfileStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStrength::Strong => "strong",
            ProfileStrength::Average => "average",
            ProfileStrength::Weak => "weak",
        }
    }
}

/// The three strength tiers stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StrengthTiers {
    pub academic: ProfileStrength,
    pub exam: ProfileStrength,
    pub sop: ProfileStrength,
}

/// Readiness breakdown shown on the profile analysis screen.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileAnalysis {
    pub academic_score: u8,
    pub exam_score: u8,
    pub sop_score: u8,
    pub overall_readiness: f64,
}

const MAX_READINESS_POINTS: f64 = 9.0;

pub fn academic_strength(gpa: Option<f64>) -> ProfileStrength {
    match gpa {
        Some(g) if g >= 3.5 => ProfileStrength::Strong,
        // A zero GPA is treated as "not provided".
        Some(g) if g != 0.0 && g < 3.0 => ProfileStrength::Weak,
        _ => ProfileStrength::Average,
    }
}

pub fn exam_strength(ielts: Option<f64>, toefl: Option<i32>) -> ProfileStrength {
    let ielts = ielts.filter(|s| *s != 0.0);
    let toefl = toefl.filter(|s| *s != 0);
    if ielts.is_none() && toefl.is_none() {
        return ProfileStrength::Weak;
    }
    if ielts.is_some_and(|s| s >= 7.0) || toefl.is_some_and(|s| s >= 100) {
        ProfileStrength::Strong
    } else {
        ProfileStrength::Average
    }
}

pub fn sop_strength(sop_status: &str) -> ProfileStrength {
    match sop_status {
        "Ready" => ProfileStrength::Strong,
        "Draft" => ProfileStrength::Average,
        _ => ProfileStrength::Weak,
    }
}

pub fn derive_strengths(profile: &ProfileRow) -> StrengthTiers {
    StrengthTiers {
        academic: academic_strength(profile.gpa),
        exam: exam_strength(profile.ielts_score, profile.toefl_score),
        sop: sop_strength(&profile.sop_status),
    }
}

pub fn analyze_profile(profile: &ProfileRow) -> ProfileAnalysis {
    let academic_score = match profile.gpa {
        Some(g) if g >= 3.5 => 3,
        Some(g) if g >= 3.0 => 2,
        Some(g) if g != 0.0 => 1,
        _ => 0,
    };

    let exam_score = [
        profile.ielts_score.is_some_and(|s| s >= 7.0),
        profile.toefl_score.is_some_and(|s| s >= 100),
        profile.gre_score.is_some_and(|s| s >= 320),
        profile.gmat_score.is_some_and(|s| s >= 700),
    ]
    .iter()
    .filter(|met| **met)
    .count() as u8;

    let sop_score = match profile.sop_status.as_str() {
        "Ready" => 3,
        "Draft" => 2,
        _ => 1,
    };

    let total = f64::from(academic_score + exam_score + sop_score);
    ProfileAnalysis {
        academic_score,
        exam_score,
        sop_score,
        overall_readiness: total / MAX_READINESS_POINTS * 100.0,
    }
}
