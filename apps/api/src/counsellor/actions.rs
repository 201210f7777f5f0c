//! Action protocol: the `ACTION:` / `PARAMS:` line convention advisor replies use to
//! request state changes.
//!
//! ```text
//! I've added a reminder for you.
//! ACTION: CREATE_TASK
//! PARAMS: {"title": "Book IELTS", "priority": 4}
//! ```
//!
//! The parser does not know the action vocabulary; names and params are forwarded
//! verbatim to the executor. Nothing in here fails: bad params degrade to an empty map.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const ACTION_MARKER: &str = "ACTION:";
pub const PARAMS_MARKER: &str = "PARAMS:";

/// Open-ended parameter map. Shapes are validated by the executor, not here.
pub type ActionParams = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedAction {
    pub action: String,
    #[serde(default)]
    pub params: ActionParams,
}

/// Advisor text split into the part shown to the user and the actions it requested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvisorReply {
    pub message: String,
    pub actions: Vec<ParsedAction>,
}

/// Parses and cleans in a single pass over the lines.
pub fn parse_response(text: &str) -> AdvisorReply {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut actions = Vec::new();
    let mut kept: Vec<&str> = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        match line.trim().strip_prefix(ACTION_MARKER) {
            Some(name) => {
                let params = match lines.get(i + 1).and_then(|next| params_payload(next)) {
                    Some(payload) => {
                        // PARAMS line belongs to this action whether or not it parses.
                        i += 1;
                        parse_params(payload)
                    }
                    None => ActionParams::new(),
                };
                actions.push(ParsedAction {
                    action: name.trim().to_string(),
                    params,
                });
            }
            None => kept.push(line),
        }
        i += 1;
    }

    AdvisorReply {
        message: kept.join("\n").trim().to_string(),
        actions,
    }
}

/// Actions in source order.
pub fn parse_actions(text: &str) -> Vec<ParsedAction> {
    parse_response(text).actions
}

/// The text with every ACTION line and its PARAMS line removed, trimmed.
pub fn clean_message(text: &str) -> String {
    parse_response(text).message
}

fn params_payload(line: &str) -> Option<&str> {
    line.trim().strip_prefix(PARAMS_MARKER).map(str::trim)
}

fn parse_params(payload: &str) -> ActionParams {
    match serde_json::from_str::<Value>(payload) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            warn!("Action params are not a JSON object, ignoring: {other}");
            ActionParams::new()
        }
        Err(e) => {
            warn!("Failed to parse action params '{payload}': {e}");
            ActionParams::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_action_with_params() {
        let text = "ACTION: CREATE_TASK\nPARAMS: {\"title\": \"X\"}\n";
        let actions = parse_actions(text);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, "CREATE_TASK");
        assert_eq!(Value::Object(actions[0].params.clone()), json!({"title": "X"}));
        assert_eq!(clean_message(text), "");
    }

    #[test]
    fn test_malformed_params_fall_back_to_empty() {
        let text = "ACTION: FOO\nPARAMS: not-json\n";
        let actions = parse_actions(text);
        assert_eq!(
            actions,
            vec![ParsedAction {
                action: "FOO".to_string(),
                params: ActionParams::new(),
            }]
        );
        assert_eq!(clean_message(text), "");
    }

    #[test]
    fn test_non_object_params_fall_back_to_empty() {
        let actions = parse_actions("ACTION: FOO\nPARAMS: [1, 2, 3]");
        assert_eq!(actions.len(), 1);
        assert!(actions[0].params.is_empty());
    }

    #[test]
    fn test_no_markers_returns_trimmed_text() {
        let text = "\n  Focus on your IELTS first.\nThen shortlist.  \n";
        assert!(parse_actions(text).is_empty());
        assert_eq!(clean_message(text), "Focus on your IELTS first.\nThen shortlist.");
    }

    #[test]
    fn test_action_without_params_line() {
        let text = "Moving you forward.\nACTION: UPDATE_STAGE\nGood luck!";
        let reply = parse_response(text);
        assert_eq!(reply.actions.len(), 1);
        assert_eq!(reply.actions[0].action, "UPDATE_STAGE");
        assert!(reply.actions[0].params.is_empty());
        assert_eq!(reply.message, "Moving you forward.\nGood luck!");
    }

    #[test]
    fn test_empty_action_name_is_valid() {
        let actions = parse_actions("ACTION:\nPARAMS: {\"a\": 1}");
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, "");
        assert_eq!(actions[0].params.get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_orphan_params_line_is_plain_text() {
        let text = "Here you go.\nPARAMS: {\"x\": 1}";
        assert!(parse_actions(text).is_empty());
        assert_eq!(clean_message(text), text);
    }

    #[test]
    fn test_multiple_actions_keep_source_order() {
        let text = "\
Great choices!
ACTION: SHORTLIST_UNIVERSITY
PARAMS: {\"university_id\": 12, \"category\": \"target\"}
  ACTION: LOCK_UNIVERSITY
  PARAMS: {\"university_id\": \"12\"}
ACTION: CUSTOM_THING
Next, prepare your SOP.";

        let reply = parse_response(text);
        let names: Vec<&str> = reply.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(
            names,
            vec!["SHORTLIST_UNIVERSITY", "LOCK_UNIVERSITY", "CUSTOM_THING"]
        );
        assert_eq!(reply.actions[0].params.get("university_id"), Some(&json!(12)));
        assert_eq!(reply.actions[1].params.get("university_id"), Some(&json!("12")));
        assert_eq!(reply.message, "Great choices!\nNext, prepare your SOP.");
    }

    #[test]
    fn test_nested_param_values_are_preserved() {
        let actions =
            parse_actions("ACTION: CREATE_TASK\nPARAMS: {\"meta\": {\"tags\": [\"sop\", true, null]}}");
        assert_eq!(
            actions[0].params.get("meta"),
            Some(&json!({"tags": ["sop", true, null]}))
        );
    }

    #[test]
    fn test_params_only_consumed_directly_after_action() {
        let text = "ACTION: FOO\n\nPARAMS: {\"x\": 1}";
        let reply = parse_response(text);
        assert!(reply.actions[0].params.is_empty());
        assert_eq!(reply.message, "PARAMS: {\"x\": 1}");
    }

    #[test]
    fn test_crlf_lines_are_recognized() {
        let reply = parse_response("Done.\r\nACTION: DELETE_TASK\r\nPARAMS: {\"task_id\": 3}\r\n");
        assert_eq!(reply.actions[0].action, "DELETE_TASK");
        assert_eq!(reply.actions[0].params.get("task_id"), Some(&json!(3)));
        assert_eq!(reply.message, "Done.");
    }

    #[test]
    fn test_parsed_action_serializes_as_action_and_params() {
        let action = ParsedAction {
            action: "CREATE_TASK".to_string(),
            params: ActionParams::new(),
        };
        assert_eq!(
            serde_json::to_value(&action).unwrap(),
            json!({"action": "CREATE_TASK", "params": {}})
        );
    }
}
