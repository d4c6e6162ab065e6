use serde_json::Value;

use crate::error::{Result, TaggerError};

/// Extracts the JSON array the model was asked to produce from its raw text.
///
/// Models tend to wrap the payload in prose or code fences, so everything
/// from the first `[` to the last `]` is decoded. Entries are returned
/// undecoded; field checks happen when they are merged with source lines.
pub fn parse(raw_text: &str) -> Result<Vec<Value>> {
    let start = raw_text
        .find('[')
        .ok_or_else(|| TaggerError::MalformedResponse("no opening '[' in response".into()))?;
    let end = raw_text
        .rfind(']')
        .ok_or_else(|| TaggerError::MalformedResponse("no closing ']' in response".into()))?;

    if end < start {
        return Err(TaggerError::MalformedResponse(
            "closing ']' precedes opening '['".into(),
        ));
    }

    serde_json::from_str::<Vec<Value>>(&raw_text[start..=end]).map_err(|e| {
        TaggerError::MalformedResponse(format!(
            "invalid JSON array: {e} (response starts with {:?})",
            snippet(raw_text)
        ))
    })
}

fn snippet(text: &str) -> String {
    text.chars().take(80).collect()
}
