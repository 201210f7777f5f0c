//! Builds the text context the LLM advisor sees: profile snapshot, shortlist counts,
//! the top-ranked universities and the recent conversation.

use std::fmt::Write;

use crate::counsellor::fit_scoring::{format_currency, Recommendation};
use crate::counsellor::prompts::HISTORY_WINDOW;
use crate::models::chat::ChatMessageRow;
use crate::models::profile::ProfileRow;
use crate::models::user::User;

/// How many ranked universities are offered to the model as action targets.
pub const TOP_MATCHES: usize = 10;

/// Everything the advisor needs to know about the student for one chat turn.
pub struct AdvisorContext<'a> {
    pub user: &'a User,
    pub profile: &'a ProfileRow,
    pub shortlisted_count: usize,
    pub locked_count: usize,
    pub top_matches: &'a [Recommendation],
}

pub fn render_user_context(ctx: &AdvisorContext<'_>) -> String {
    let user = ctx.user;
    let p = ctx.profile;
    let mut out = String::new();

    let _ = writeln!(out, "USER PROFILE:");
    let _ = writeln!(out, "Name: {}", user.full_name);
    let _ = writeln!(out, "Email: {}", user.email);
    let _ = writeln!(out, "Current Stage: {}", user.current_stage);
    let _ = writeln!(out, "Onboarding Completed: {}", user.onboarding_completed);
    let _ = writeln!(out);

    let _ = writeln!(out, "ACADEMIC BACKGROUND:");
    let _ = writeln!(out, "- Education Level: {}", p.education_level);
    let _ = writeln!(out, "- Degree: {}", p.degree);
    let _ = writeln!(out, "- Major: {}", p.major);
    let _ = writeln!(out, "- Graduation Year: {}", p.graduation_year);
    let _ = writeln!(out, "- GPA: {}", or_label(p.gpa, "Not provided"));
    let _ = writeln!(out);

    let _ = writeln!(out, "STUDY GOALS:");
    let _ = writeln!(out, "- Intended Degree: {}", p.intended_degree);
    let _ = writeln!(out, "- Field of Study: {}", p.field_of_study);
    let _ = writeln!(out, "- Target Intake: {}", p.target_intake_year);
    let _ = writeln!(out, "- Preferred Countries: {}", p.preferred_countries);
    let _ = writeln!(out);

    let _ = writeln!(out, "BUDGET:");
    let _ = writeln!(
        out,
        "- Budget Range: {} - {} per year",
        format_currency(p.budget_min),
        format_currency(p.budget_max)
    );
    let _ = writeln!(out, "- Funding Plan: {}", p.funding_plan);
    let _ = writeln!(out);

    let _ = writeln!(out, "EXAM SCORES:");
    let _ = writeln!(out, "- IELTS: {}", or_label(p.ielts_score, "Not taken"));
    let _ = writeln!(out, "- TOEFL: {}", or_label(p.toefl_score, "Not taken"));
    let _ = writeln!(out, "- GRE: {}", or_label(p.gre_score, "Not taken"));
    let _ = writeln!(out, "- GMAT: {}", or_label(p.gmat_score, "Not taken"));
    let _ = writeln!(out, "- SOP Status: {}", p.sop_status);
    let _ = writeln!(out);

    let _ = writeln!(out, "PROFILE STRENGTH:");
    let _ = writeln!(out, "- Academic: {}", p.academic_strength);
    let _ = writeln!(out, "- Exams: {}", p.exam_strength);
    let _ = writeln!(out, "- SOP: {}", p.sop_strength);
    let _ = writeln!(out);

    let _ = writeln!(out, "SHORTLISTED UNIVERSITIES: {}", ctx.shortlisted_count);
    let _ = writeln!(out, "LOCKED UNIVERSITIES: {}", ctx.locked_count);
    let _ = writeln!(out);

    let _ = writeln!(out, "TOP {TOP_MATCHES} UNIVERSITY MATCHES (AVAILABLE FOR ACTIONS):");
    let _ = write!(out, "{}", render_top_matches(ctx.top_matches));

    out
}

/// One line per ranked university, capped at [`TOP_MATCHES`].
pub fn render_top_matches(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return "No university matches available.".to_string();
    }

    recommendations
        .iter()
        .take(TOP_MATCHES)
        .map(|r| {
            format!(
                "- ID: {} | {} ({}) | Fit: {}% | Cat: {}",
                r.university.id,
                r.university.name,
                r.university.country,
                r.fit_score,
                r.category.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Full prompt for one turn: context, the last [`HISTORY_WINDOW`] messages, then the
/// new message. `history` is in chronological order.
pub fn build_conversation(user_context: &str, history: &[ChatMessageRow], message: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{user_context}");
    let _ = writeln!(out, "CONVERSATION HISTORY:");

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    for msg in &history[start..] {
        let _ = writeln!(out, "{}: {}", msg.role.to_uppercase(), msg.content);
    }

    let _ = write!(out, "USER: {message}\nASSISTANT:");
    out
}

fn or_label<T: ToString>(value: Option<T>, missing: &str) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| missing.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counsellor::fit_scoring::recommend;
    use crate::models::university::UniversityRow;
    use chrono::Utc;

    fn make_user() -> User {
        User {
            id: 1,
            email: "maya@example.com".to_string(),
            full_name: "Maya Chen".to_string(),
            is_active: true,
            onboarding_completed: true,
            current_stage: "discovering_universities".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn make_profile() -> ProfileRow {
        ProfileRow {
            user_id: 1,
            major: "Computer Science".to_string(),
            gpa: Some(3.6),
            ielts_score: None,
            budget_min: 20_000.0,
            budget_max: 45_000.0,
            preferred_countries: "Canada, Germany".to_string(),
            sop_status: "Draft".to_string(),
            academic_strength: "strong".to_string(),
            ..ProfileRow::default()
        }
    }

    fn make_message(id: i64, role: &str, content: &str) -> ChatMessageRow {
        ChatMessageRow {
            id,
            user_id: 1,
            role: role.to_string(),
            content: content.to_string(),
            created_at: Utc::now(),
        }
    }

    fn make_catalog(n: i64) -> Vec<UniversityRow> {
        (1..=n)
            .map(|id| UniversityRow {
                id,
                name: format!("Uni {id}"),
                country: "Canada".to_string(),
                min_gpa: Some(2.5 + id as f64 * 0.1),
                ..UniversityRow::default()
            })
            .collect()
    }

    #[test]
    fn test_user_context_includes_profile_and_counts() {
        let user = make_user();
        let profile = make_profile();
        let recs = recommend(&profile, &make_catalog(2));
        let ctx = AdvisorContext {
            user: &user,
            profile: &profile,
            shortlisted_count: 3,
            locked_count: 1,
            top_matches: &recs,
        };

        let text = render_user_context(&ctx);
        assert!(text.contains("Name: Maya Chen"));
        assert!(text.contains("- GPA: 3.6"));
        assert!(text.contains("- IELTS: Not taken"));
        assert!(text.contains("- Budget Range: $20,000 - $45,000 per year"));
        assert!(text.contains("SHORTLISTED UNIVERSITIES: 3"));
        assert!(text.contains("LOCKED UNIVERSITIES: 1"));
        assert!(text.contains("- ID: 1 | Uni 1 (Canada) | Fit: 70% | Cat: target"));
    }

    #[test]
    fn test_top_matches_capped_at_ten() {
        let recs = recommend(&make_profile(), &make_catalog(15));
        let rendered = render_top_matches(&recs);
        assert_eq!(rendered.lines().count(), TOP_MATCHES);
    }

    #[test]
    fn test_top_matches_placeholder_when_empty() {
        assert_eq!(render_top_matches(&[]), "No university matches available.");
    }

    #[test]
    fn test_conversation_keeps_last_ten_messages() {
        let history: Vec<_> = (0..14)
            .map(|i| make_message(i, if i % 2 == 0 { "user" } else { "assistant" }, &format!("m{i}")))
            .collect();

        let prompt = build_conversation("CTX", &history, "What next?");
        assert!(prompt.starts_with("CTX\nCONVERSATION HISTORY:\n"));
        assert!(!prompt.contains("m3\n"));
        assert!(prompt.contains("USER: m4\n"));
        assert!(prompt.contains("ASSISTANT: m13\n"));
        assert!(prompt.ends_with("USER: What next?\nASSISTANT:"));
    }
}
