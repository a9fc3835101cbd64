//! Recovering typed values from schema-free model output.

use serde::de::DeserializeOwned;

/// Outcome of decoding a model response as JSON.
///
/// Callers must handle `ParseFailed` explicitly; there is no silent null.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelJson<T> {
    Parsed(T),
    ParseFailed { raw: String, reason: String },
}

/// Decodes model text as `T`.
///
/// Tries, in order: the fence-stripped text, then the slice between the first `{`
/// and the last `}` (models like to wrap the object in prose).
pub fn parse_model_json<T: DeserializeOwned>(text: &str) -> ModelJson<T> {
    let stripped = strip_json_fences(text);

    let first_error = match serde_json::from_str::<T>(stripped) {
        Ok(value) => return ModelJson::Parsed(value),
        Err(e) => e,
    };

    if let Some(candidate) = extract_braced(stripped) {
        if candidate.len() != stripped.len() {
            if let Ok(value) = serde_json::from_str::<T>(candidate) {
                return ModelJson::Parsed(value);
            }
        }
    }

    ModelJson::ParseFailed {
        raw: text.to_string(),
        reason: first_error.to_string(),
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim())
    } else {
        text
    }
}

fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}
