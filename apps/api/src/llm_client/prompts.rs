// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting fragments.

/// Keeps advisor replies short enough to read in a chat bubble.
pub const CONCISE_INSTRUCTION: &str = "\
CRITICAL INSTRUCTION: KEEP RESPONSES CONCISE AND MINIMAL.
- Do NOT provide long explanations unless asked.
- Avoid repeating user information.
- Use bullet points for clarity.
- Focus on the most important action or advice.
- Max response length: 2-3 short paragraphs or a list of 3-4 items.";

/// Describes the line protocol the action parser understands.
pub const ACTION_SYNTAX_INSTRUCTION: &str = "\
ACTIONS SYNTAX (Invisible to user):
ACTION: [action_name]
PARAMS: {json_params}

Put each ACTION on its own line, followed immediately by its PARAMS line.
PARAMS must be a single-line JSON object.";
