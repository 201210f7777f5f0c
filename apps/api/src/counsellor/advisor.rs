//! Advisor: produces the counsellor's reply for one chat turn.
//!
//! Two backends implement [`Advisor`]:
//! - `LlmAdvisor`: Gemini via `llm_client`, parsed with the action protocol.
//! - `RuleBasedAdvisor`: local keyword rules, no network. Used when no usable API key
//!   is configured, and by `LlmAdvisor` for any turn where the model call fails.
//!
//! `AppState` holds an `Arc<dyn Advisor>`, chosen at startup from `AdvisorMode`.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::counsellor::actions::{parse_response, ActionParams, ParsedAction};
use crate::counsellor::context::build_conversation;
use crate::counsellor::prompts::counsellor_system_prompt;
use crate::llm_client::LlmClient;
use crate::models::chat::ChatMessageRow;
use crate::models::profile::ProfileRow;
use crate::models::user::User;

const FALLBACK_NOTE: &str = "(Note: This is a system-generated fallback response as no valid API key was used for this request.)";
const ELITE_SCHOOLS: [&str; 3] = ["mit", "harvard", "stanford"];

/// Inputs for one chat turn. `history` is chronological and already includes `message`.
pub struct ChatTurn<'a> {
    pub message: &'a str,
    pub user: &'a User,
    pub profile: &'a ProfileRow,
    pub history: &'a [ChatMessageRow],
    pub user_context: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvisorResponse {
    pub message: String,
    pub actions: Vec<ParsedAction>,
    pub is_mock: bool,
}

#[async_trait]
pub trait Advisor: Send + Sync {
    async fn respond(&self, turn: &ChatTurn<'_>) -> AdvisorResponse;
}

// ────────────────────────────────────────────────────────────────────────────
// RuleBasedAdvisor
// ────────────────────────────────────────────────────────────────────────────

/// Keyword-driven replies. Deterministic and free; never contacts the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedAdvisor;

#[async_trait]
impl Advisor for RuleBasedAdvisor {
    async fn respond(&self, turn: &ChatTurn<'_>) -> AdvisorResponse {
        rule_based_reply(turn.message, turn.user, turn.profile)
    }
}

pub fn rule_based_reply(message: &str, user: &User, profile: &ProfileRow) -> AdvisorResponse {
    info!("Generating rule-based advisor reply for user {}", user.id);

    let lowered = message.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    let mentions = |needle: &str| words.iter().any(|w| *w == needle);

    let (text, actions) = if ELITE_SCHOOLS.into_iter().any(|s| mentions(s)) {
        let gpa = profile
            .gpa
            .filter(|g| *g != 0.0)
            .map(|g| format!("{g:?}"))
            .unwrap_or_else(|| "N/A".to_string());
        (
            format!(
                "Hello {}! These are top-tier schools. Given your GPA of {gpa}, you should focus \
                 on your SAT/IELTS scores to be competitive. I've added a task for you to check \
                 their specific requirements.",
                user.full_name
            ),
            vec![action(
                "CREATE_TASK",
                json!({"title": "Check Elite University Requirements", "priority": 4}),
            )],
        )
    } else if mentions("india") {
        (
            format!(
                "I see you're interested in India, {}. For B.Tech in Computer Science, your \
                 priority should be the JEE Mains and Advanced exams. I'll move your stage to \
                 'Researching Entrance Exams'.",
                user.full_name
            ),
            vec![action(
                "UPDATE_STAGE",
                json!({"stage": "preparing_applications"}),
            )],
        )
    } else {
        let countries = if profile.preferred_countries.trim().is_empty() {
            "your target countries"
        } else {
            profile.preferred_countries.as_str()
        };
        (
            format!(
                "I'm currently in Quota-Saving mode. To get a full AI response, please ensure a \
                 valid Gemini API Key is configured in the .env file. Based on your profile, I \
                 recommend looking at universities in {countries}."
            ),
            Vec::new(),
        )
    };

    AdvisorResponse {
        message: format!("{text}\n\n{FALLBACK_NOTE}"),
        actions,
        is_mock: true,
    }
}

fn action(name: &str, params: serde_json::Value) -> ParsedAction {
    let params = match params {
        serde_json::Value::Object(map) => map,
        _ => ActionParams::new(),
    };
    ParsedAction {
        action: name.to_string(),
        params,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LlmAdvisor
// ────────────────────────────────────────────────────────────────────────────

/// Gemini-backed advisor. Any failed call is answered by the rule-based advisor instead.
pub struct LlmAdvisor {
    llm: LlmClient,
    fallback: RuleBasedAdvisor,
}

impl LlmAdvisor {
    pub fn new(llm: LlmClient) -> Self {
        Self {
            llm,
            fallback: RuleBasedAdvisor,
        }
    }
}

#[async_trait]
impl Advisor for LlmAdvisor {
    async fn respond(&self, turn: &ChatTurn<'_>) -> AdvisorResponse {
        // The current message is the last history row; it is appended separately.
        let prior = match turn.history.split_last() {
            Some((last, rest)) if last.content == turn.message => rest,
            _ => turn.history,
        };
        let prompt = build_conversation(turn.user_context, prior, turn.message);
        let system = counsellor_system_prompt();

        match self.llm.call_text(&prompt, &system).await {
            Ok(text) => {
                let reply = parse_response(&text);
                info!(
                    "Advisor reply for user {} carries {} action(s)",
                    turn.user.id,
                    reply.actions.len()
                );
                AdvisorResponse {
                    message: reply.message,
                    actions: reply.actions,
                    is_mock: false,
                }
            }
            Err(e) => {
                error!("Gemini call failed: {e}. Switching to rule-based fallback.");
                self.fallback.respond(turn).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_user() -> User {
        User {
            id: 7,
            email: "sam@example.com".to_string(),
            full_name: "Sam Okafor".to_string(),
            is_active: true,
            onboarding_completed: true,
            current_stage: "discovering_universities".to_string(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn make_profile(gpa: Option<f64>, countries: &str) -> ProfileRow {
        ProfileRow {
            gpa,
            preferred_countries: countries.to_string(),
            ..ProfileRow::default()
        }
    }

    #[tokio::test]
    async fn test_elite_school_mention_creates_task() {
        let user = make_user();
        let profile = make_profile(Some(3.7), "USA");
        let turn = ChatTurn {
            message: "Can I get into Stanford?",
            user: &user,
            profile: &profile,
            history: &[],
            user_context: "",
        };

        let reply = RuleBasedAdvisor.respond(&turn).await;
        assert!(reply.is_mock);
        assert!(reply.message.contains("Hello Sam Okafor!"));
        assert!(reply.message.contains("GPA of 3.7"));
        assert!(reply.message.ends_with(FALLBACK_NOTE));
        assert_eq!(reply.actions.len(), 1);
        assert_eq!(reply.actions[0].action, "CREATE_TASK");
        assert_eq!(
            reply.actions[0].params.get("title"),
            Some(&json!("Check Elite University Requirements"))
        );
        assert_eq!(reply.actions[0].params.get("priority"), Some(&json!(4)));
    }

    #[test]
    fn test_missing_gpa_reads_not_available() {
        let reply = rule_based_reply("what about MIT", &make_user(), &make_profile(None, ""));
        assert!(reply.message.contains("GPA of N/A"));
    }

    #[test]
    fn test_india_mention_updates_stage() {
        let reply = rule_based_reply(
            "I want to study in India",
            &make_user(),
            &make_profile(None, ""),
        );
        assert_eq!(reply.actions.len(), 1);
        assert_eq!(reply.actions[0].action, "UPDATE_STAGE");
        assert_eq!(
            reply.actions[0].params.get("stage"),
            Some(&json!("preparing_applications"))
        );
    }

    #[test]
    fn test_generic_message_names_preferred_countries() {
        let reply = rule_based_reply(
            "How do I submit my documents?",
            &make_user(),
            &make_profile(None, "Germany, Netherlands"),
        );
        assert!(reply.actions.is_empty());
        assert!(reply.message.contains("universities in Germany, Netherlands."));
    }

    #[test]
    fn test_generic_message_without_countries() {
        let reply = rule_based_reply("hello", &make_user(), &make_profile(None, "  "));
        assert!(reply.message.contains("universities in your target countries."));
    }
}
