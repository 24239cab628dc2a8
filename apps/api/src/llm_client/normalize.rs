//! Response normalisation: turns raw model text into a typed payload.

use serde::de::DeserializeOwned;

use super::GenerationError;

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let rest = match rest.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
        _ => rest,
    };
    let rest = rest.trim_start();

    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Cleans the model text and deserializes it into `T`.
pub fn parse_payload<T: DeserializeOwned>(raw: &str) -> Result<T, GenerationError> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(GenerationError::Parse("model returned an empty body".to_string()));
    }
    serde_json::from_str(cleaned).map_err(|e| GenerationError::Parse(e.to_string()))
}
