use crate::types::{LogItem, MAX_TAGS};

const INSTRUCTIONS: &str = "\
You are a technical log classification system.

GOAL:
Assign THEMATIC, GENERAL tags.
Tags must name reusable technical categories.
Do NOT rephrase or translate the log text.

MANDATORY RULES:
- Do not reuse keywords from the log
- Do not describe the literal event
- Use abstract technical categories
  (e.g. authentication, database connectivity, timeout error)
- At most {max_tags} tags per log
- Reply ONLY with valid JSON
- No explanations, no Markdown

EXACT FORMAT:

[
  {
    \"log_id\": 1,
    \"tags\": [\"...\"]
  }
]

LOGS:
";

/// Builds the request text for one batch, one `Log <id>: <text>` line per item.
pub fn build_prompt(batch: &[LogItem]) -> String {
    let mut prompt = INSTRUCTIONS.replace("{max_tags}", &MAX_TAGS.to_string());
    for item in batch {
        prompt.push_str(&format!("\nLog {}: {}", item.id, item.text));
    }
    prompt
}
