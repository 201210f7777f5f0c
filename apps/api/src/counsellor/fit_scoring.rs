//! Fit scoring. Rates how well a university suits a student profile and ranks a catalog.
//!
//! The score starts at a neutral base and moves by fixed steps for GPA, IELTS and budget,
//! then is clamped to `[0, 100]`. Category and risk are derived from the score with two
//! independent threshold ladders.
//!
//! Everything here is pure and synchronous: no I/O, no shared state.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::profile::ProfileRow;
use crate::models::university::UniversityRow;

/// Score every university starts from before adjustments.
pub const BASE_SCORE: f64 = 50.0;
/// Score returned for a single university when its inputs cannot be scored.
pub const DEFAULT_SCORE: f64 = 50.0;

const GPA_MARGIN: f64 = 0.5;
const GPA_STRONG_BONUS: f64 = 20.0;
const GPA_MEETS_BONUS: f64 = 10.0;
const GPA_BELOW_PENALTY: f64 = -20.0;

const IELTS_MARGIN: f64 = 0.5;
const IELTS_STRONG_BONUS: f64 = 15.0;
const IELTS_MEETS_BONUS: f64 = 7.0;
const IELTS_BELOW_PENALTY: f64 = -15.0;

/// Costs up to this multiple of the budget still earn a small bonus.
const BUDGET_STRETCH_FACTOR: f64 = 1.2;
const BUDGET_WITHIN_BONUS: f64 = 15.0;
const BUDGET_STRETCH_BONUS: f64 = 5.0;
const BUDGET_OVER_PENALTY: f64 = -20.0;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

/// Coarse admission-difficulty bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Safe,
    Target,
    Dream,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Safe => "safe",
            Category::Target => "target",
            Category::Dream => "dream",
        }
    }
}

/// Risk tier shown next to the category. Serialized capitalized ("Low", "Medium", "High").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// One ranked university. Recomputed on every call, never persisted here.
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub university: UniversityRow,
    pub fit_score: f64,
    pub category: Category,
    pub risk_level: RiskLevel,
    pub reasoning: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("field '{field}' is not a finite number ({value})")]
    NonFinite { field: &'static str, value: f64 },
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// Fit score in `[0, 100]`. Never fails: unscorable input yields [`DEFAULT_SCORE`].
pub fn score(profile: &ProfileRow, university: &UniversityRow) -> f64 {
    match try_score(profile, university) {
        Ok(score) => score,
        Err(e) => {
            warn!(
                "Fit score for university {} ({}) fell back to default: {e}",
                university.id, university.name
            );
            DEFAULT_SCORE
        }
    }
}

/// Fallible scoring core. Rejects NaN / infinite inputs rather than letting them
/// poison the clamp.
pub fn try_score(profile: &ProfileRow, university: &UniversityRow) -> Result<f64, ScoreError> {
    let mut score = BASE_SCORE;

    if let (Some(gpa), Some(min_gpa)) = (profile.gpa, university.min_gpa) {
        finite("gpa", gpa)?;
        finite("min_gpa", min_gpa)?;
        score += if gpa >= min_gpa + GPA_MARGIN {
            GPA_STRONG_BONUS
        } else if gpa >= min_gpa {
            GPA_MEETS_BONUS
        } else {
            GPA_BELOW_PENALTY
        };
    }

    if let (Some(ielts), Some(min_ielts)) = (profile.ielts_score, university.min_ielts) {
        finite("ielts_score", ielts)?;
        finite("min_ielts", min_ielts)?;
        score += if ielts >= min_ielts + IELTS_MARGIN {
            IELTS_STRONG_BONUS
        } else if ielts >= min_ielts {
            IELTS_MEETS_BONUS
        } else {
            IELTS_BELOW_PENALTY
        };
    }

    if let Some((total_cost, budget)) = budget_comparison(profile, university)? {
        score += if total_cost <= budget {
            BUDGET_WITHIN_BONUS
        } else if total_cost <= budget * BUDGET_STRETCH_FACTOR {
            BUDGET_STRETCH_BONUS
        } else {
            BUDGET_OVER_PENALTY
        };
    }

    Ok(score.clamp(0.0, 100.0))
}

/// `(total_cost, budget_max)` when a budget comparison applies: the student has a
/// non-zero budget and the university has a positive yearly cost.
fn budget_comparison(
    profile: &ProfileRow,
    university: &UniversityRow,
) -> Result<Option<(f64, f64)>, ScoreError> {
    let budget = finite("budget_max", profile.budget_max)?;
    let total_cost = finite("total_cost", university.total_annual_cost())?;

    if budget != 0.0 && total_cost > 0.0 {
        Ok(Some((total_cost, budget)))
    } else {
        Ok(None)
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, ScoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ScoreError::NonFinite { field, value })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Categorization
// ────────────────────────────────────────────────────────────────────────────

/// safe ≥ 80, target ≥ 60, dream below.
pub fn categorize(fit_score: f64) -> Category {
    if fit_score >= 80.0 {
        Category::Safe
    } else if fit_score >= 60.0 {
        Category::Target
    } else {
        Category::Dream
    }
}

/// Low ≥ 75, Medium ≥ 50, High below. Boundaries do not line up with [`categorize`].
pub fn risk_level(fit_score: f64) -> RiskLevel {
    if fit_score >= 75.0 {
        RiskLevel::Low
    } else if fit_score >= 50.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Reasoning
// ────────────────────────────────────────────────────────────────────────────

/// Short justification. Always ends with a tier clause, so it is never empty.
pub fn build_reasoning(profile: &ProfileRow, university: &UniversityRow, fit_score: f64) -> String {
    let mut reasons: Vec<String> = Vec::with_capacity(3);

    if let (Some(gpa), Some(min_gpa)) = (profile.gpa, university.min_gpa) {
        if gpa >= min_gpa {
            reasons.push(format!(
                "Your GPA ({gpa:?}) meets or exceeds the requirement ({min_gpa:?})"
            ));
        } else {
            reasons.push(format!(
                "Your GPA ({gpa:?}) is below the target requirement ({min_gpa:?})"
            ));
        }
    }

    if let Ok(Some((total_cost, budget))) = budget_comparison(profile, university) {
        let cost = format_currency(total_cost);
        if total_cost <= budget {
            reasons.push(format!("The estimated cost ({cost}) is within your budget"));
        } else {
            reasons.push(format!(
                "The estimated cost ({cost}) exceeds your current budget range"
            ));
        }
    }

    let tier = if fit_score >= 70.0 {
        "This university represents a strong match for your academic and financial profile"
    } else if fit_score >= 50.0 {
        "This is a balanced option that fits several of your criteria"
    } else {
        "This is considered a 'reach' school for your current profile"
    };
    reasons.push(tier.to_string());

    reasons.join(". ")
}

/// Whole dollars with thousands separators, e.g. `$45,000`. Halves round to even.
pub fn format_currency(amount: f64) -> String {
    let whole = amount.round_ties_even() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if whole < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Ranking
// ────────────────────────────────────────────────────────────────────────────

/// Scores every university (1:1, no filtering) and returns them best-first.
/// The sort is stable, so equal scores keep their input order.
pub fn recommend(profile: &ProfileRow, universities: &[UniversityRow]) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = universities
        .iter()
        .map(|university| {
            let fit_score = score(profile, university);
            Recommendation {
                university: university.clone(),
                fit_score,
                category: categorize(fit_score),
                risk_level: risk_level(fit_score),
                reasoning: build_reasoning(profile, university, fit_score),
            }
        })
        .collect();

    recommendations.sort_by(|a, b| {
        b.fit_score
            .partial_cmp(&a.fit_score)
            .unwrap_or(Ordering::Equal)
    });
    recommendations
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_profile(gpa: Option<f64>, ielts: Option<f64>, budget_max: f64) -> ProfileRow {
        ProfileRow {
            gpa,
            ielts_score: ielts,
            budget_max,
            ..ProfileRow::default()
        }
    }

    fn make_university(
        id: i64,
        min_gpa: Option<f64>,
        min_ielts: Option<f64>,
        tuition_max: Option<f64>,
        living: Option<f64>,
    ) -> UniversityRow {
        UniversityRow {
            id,
            name: format!("University {id}"),
            country: "Canada".to_string(),
            min_gpa,
            min_ielts,
            tuition_fee_max: tuition_max,
            living_cost_yearly: living,
            ..UniversityRow::default()
        }
    }

    #[test]
    fn test_no_optional_fields_returns_base_score() {
        let profile = make_profile(None, None, 0.0);
        let uni = make_university(1, None, None, None, None);
        assert_eq!(score(&profile, &uni), 50.0);
    }

    #[test]
    fn test_perfect_match_clamps_to_100() {
        let profile = make_profile(Some(3.8), Some(7.5), 50_000.0);
        let uni = make_university(1, Some(3.0), Some(7.0), Some(30_000.0), Some(15_000.0));
        let s = score(&profile, &uni);
        assert_eq!(s, 100.0);
        assert_eq!(categorize(s), Category::Safe);
        assert_eq!(risk_level(s), RiskLevel::Low);
    }

    #[test]
    fn test_weak_profile_over_budget_scores_10() {
        let profile = make_profile(Some(2.5), None, 10_000.0);
        let uni = make_university(1, Some(3.5), Some(6.5), Some(45_000.0), Some(15_000.0));
        let s = score(&profile, &uni);
        assert_eq!(s, 10.0);
        assert_eq!(categorize(s), Category::Dream);
        assert_eq!(risk_level(s), RiskLevel::High);
    }

    #[test]
    fn test_gpa_just_meeting_minimum_gives_small_bonus() {
        let profile = make_profile(Some(3.2), None, 0.0);
        let uni = make_university(1, Some(3.0), None, None, None);
        assert_eq!(score(&profile, &uni), 60.0);
    }

    #[test]
    fn test_ielts_tiers() {
        let uni = make_university(1, None, Some(6.5), None, None);
        assert_eq!(score(&make_profile(None, Some(7.0), 0.0), &uni), 65.0);
        assert_eq!(score(&make_profile(None, Some(6.5), 0.0), &uni), 57.0);
        assert_eq!(score(&make_profile(None, Some(6.0), 0.0), &uni), 35.0);
    }

    #[test]
    fn test_budget_stretch_band() {
        // 55k against a 50k budget is within the 1.2x stretch band.
        let profile = make_profile(None, None, 50_000.0);
        let uni = make_university(1, None, None, Some(40_000.0), Some(15_000.0));
        assert_eq!(score(&profile, &uni), 55.0);
    }

    #[test]
    fn test_gpa_strong_bonus_boundary_is_inclusive() {
        let uni = make_university(1, Some(3.0), None, None, None);
        assert_eq!(score(&make_profile(Some(3.5), None, 0.0), &uni), 70.0);
        assert_eq!(score(&make_profile(Some(3.49), None, 0.0), &uni), 60.0);
        assert_eq!(score(&make_profile(Some(3.0), None, 0.0), &uni), 60.0);
    }

    #[test]
    fn test_ielts_strong_bonus_boundary_is_inclusive() {
        let uni = make_university(1, None, Some(6.5), None, None);
        assert_eq!(score(&make_profile(None, Some(7.0), 0.0), &uni), 65.0);
        assert_eq!(score(&make_profile(None, Some(6.9), 0.0), &uni), 57.0);
    }

    #[test]
    fn test_budget_boundaries_are_inclusive() {
        let profile = make_profile(None, None, 50_000.0);
        // Exactly on budget.
        let on_budget = make_university(1, None, None, Some(35_000.0), Some(15_000.0));
        assert_eq!(score(&profile, &on_budget), 65.0);
        // Exactly 1.2x the budget is still in the stretch band.
        let at_stretch = make_university(2, None, None, Some(45_000.0), Some(15_000.0));
        assert_eq!(score(&profile, &at_stretch), 55.0);
        // One dollar over the stretch limit.
        let past_stretch = make_university(3, None, None, Some(45_001.0), Some(15_000.0));
        assert_eq!(score(&profile, &past_stretch), 30.0);
    }

    #[test]
    fn test_budget_ignored_when_cost_is_zero() {
        let profile = make_profile(None, None, 50_000.0);
        let uni = make_university(1, None, None, None, None);
        assert_eq!(score(&profile, &uni), 50.0);
    }

    #[test]
    fn test_negative_budget_never_escapes_range() {
        let profile = make_profile(Some(0.0), Some(0.0), -5_000.0);
        let uni = make_university(1, Some(4.0), Some(9.0), Some(80_000.0), Some(20_000.0));
        let s = score(&profile, &uni);
        assert!((0.0..=100.0).contains(&s), "score was {s}");
        assert_eq!(s, 0.0);
    }

    #[test]
    fn test_non_finite_input_falls_back_to_default() {
        let profile = make_profile(Some(f64::NAN), None, 0.0);
        let uni = make_university(1, Some(3.0), None, None, None);
        assert_eq!(score(&profile, &uni), DEFAULT_SCORE);
        assert!(matches!(
            try_score(&profile, &uni),
            Err(ScoreError::NonFinite { field: "gpa", .. })
        ));
    }

    #[test]
    fn test_category_and_risk_ladders_are_independent() {
        assert_eq!((categorize(72.0), risk_level(72.0)), (Category::Target, RiskLevel::Medium));
        assert_eq!((categorize(78.0), risk_level(78.0)), (Category::Target, RiskLevel::Low));
        assert_eq!((categorize(80.0), risk_level(80.0)), (Category::Safe, RiskLevel::Low));
        assert_eq!((categorize(55.0), risk_level(55.0)), (Category::Dream, RiskLevel::Medium));
        assert_eq!((categorize(49.9), risk_level(49.9)), (Category::Dream, RiskLevel::High));
    }

    #[test]
    fn test_reasoning_only_tier_clause_without_comparisons() {
        let profile = make_profile(None, None, 0.0);
        let uni = make_university(1, None, None, None, None);
        let reasoning = build_reasoning(&profile, &uni, 50.0);
        assert_eq!(
            reasoning,
            "This is a balanced option that fits several of your criteria"
        );
    }

    #[test]
    fn test_reasoning_joins_all_clauses() {
        let profile = make_profile(Some(3.8), None, 50_000.0);
        let uni = make_university(1, Some(3.0), None, Some(30_000.0), Some(15_000.0));
        let reasoning = build_reasoning(&profile, &uni, 85.0);
        assert_eq!(
            reasoning,
            "Your GPA (3.8) meets or exceeds the requirement (3.0). \
             The estimated cost ($45,000) is within your budget. \
             This university represents a strong match for your academic and financial profile"
        );
    }

    #[test]
    fn test_reasoning_below_requirement_and_over_budget() {
        let profile = make_profile(Some(2.5), None, 10_000.0);
        let uni = make_university(1, Some(3.5), None, Some(45_000.0), Some(15_000.0));
        let reasoning = build_reasoning(&profile, &uni, 10.0);
        assert!(reasoning.contains("Your GPA (2.5) is below the target requirement (3.5)"));
        assert!(reasoning.contains("($60,000) exceeds your current budget range"));
        assert!(reasoning.ends_with("'reach' school for your current profile"));
    }

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(999.0), "$999");
        assert_eq!(format_currency(45_000.0), "$45,000");
        assert_eq!(format_currency(1_234_567.4), "$1,234,567");
    }

    #[test]
    fn test_format_currency_rounds_halves_to_even() {
        assert_eq!(format_currency(45_000.5), "$45,000");
        assert_eq!(format_currency(45_001.5), "$45,002");
        assert_eq!(format_currency(2.5), "$2");
    }

    #[test]
    fn test_recommend_empty_input() {
        let profile = make_profile(Some(3.5), Some(7.0), 30_000.0);
        assert!(recommend(&profile, &[]).is_empty());
    }

    #[test]
    fn test_recommend_is_one_to_one_and_sorted() {
        let profile = make_profile(Some(3.4), Some(7.0), 40_000.0);
        let universities = vec![
            make_university(1, Some(3.8), Some(7.5), Some(60_000.0), Some(20_000.0)),
            make_university(2, Some(2.8), Some(6.0), Some(20_000.0), Some(10_000.0)),
            make_university(3, Some(3.2), None, Some(35_000.0), Some(10_000.0)),
            make_university(4, None, None, None, None),
        ];

        let recs = recommend(&profile, &universities);
        assert_eq!(recs.len(), universities.len());
        for pair in recs.windows(2) {
            assert!(pair[0].fit_score >= pair[1].fit_score);
        }
        assert_eq!(recs[0].university.id, 2);
        assert!(recs.iter().all(|r| !r.reasoning.is_empty()));
    }

    #[test]
    fn test_recommend_keeps_input_order_on_ties() {
        let profile = make_profile(None, None, 0.0);
        let universities: Vec<_> = (1..=5)
            .map(|id| make_university(id, None, None, None, None))
            .collect();

        let ids: Vec<i64> = recommend(&profile, &universities)
            .iter()
            .map(|r| r.university.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_recommendation_serializes_category_and_risk() {
        let profile = make_profile(None, None, 0.0);
        let recs = recommend(&profile, &[make_university(9, None, None, None, None)]);
        let value = serde_json::to_value(&recs[0]).unwrap();
        assert_eq!(value["category"], "dream");
        assert_eq!(value["risk_level"], "Medium");
        assert_eq!(value["fit_score"], 50.0);
        assert_eq!(value["university"]["id"], 9);
    }
}
