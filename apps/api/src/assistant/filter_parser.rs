//! Filter update parser. Turns a chat message into a partial filter delta.
//!
//! No key validation happens here: any JSON object the model returns becomes a
//! change set, with unrecognised keys carried through untyped.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::warn;

use crate::assistant::prompts::{FILTER_PROMPT_TEMPLATE, FILTER_SYSTEM};
use crate::llm_client::json::{parse_model_json, ModelJson};
use crate::llm_client::prompts::{fill, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{with_timeout, InferenceProvider};
use crate::models::filters::{FilterChanges, FilterUpdate};

pub const PARSE_FAILURE_MESSAGE: &str = "Could not parse filter request";

pub struct FilterUpdateParser {
    provider: Arc<dyn InferenceProvider>,
    timeout: Duration,
}

impl FilterUpdateParser {
    pub fn new(provider: Arc<dyn InferenceProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Never fails: provider and decode problems come back as `FilterUpdate::Error`.
    pub async fn parse(&self, query: &str) -> FilterUpdate {
        if query.trim().is_empty() {
            return FilterUpdate::Error(PARSE_FAILURE_MESSAGE.to_string());
        }

        let prompt = fill(FILTER_PROMPT_TEMPLATE, &[("{query}", query.trim())]);
        let system = format!("{FILTER_SYSTEM} {JSON_ONLY_INSTRUCTION}");

        match with_timeout(self.timeout, self.provider.complete(&system, &prompt)).await {
            Ok(raw) => interpret(&raw),
            Err(e) => {
                warn!("Filter parsing call failed: {e}");
                FilterUpdate::Error(PARSE_FAILURE_MESSAGE.to_string())
            }
        }
    }
}

/// Maps raw model text to a filter update.
fn interpret(raw: &str) -> FilterUpdate {
    let object = match parse_model_json::<Value>(raw) {
        ModelJson::Parsed(Value::Object(object)) => object,
        ModelJson::Parsed(other) => {
            warn!("Filter model returned non-object JSON: {other}");
            return FilterUpdate::Error(PARSE_FAILURE_MESSAGE.to_string());
        }
        ModelJson::ParseFailed { raw, reason } => {
            warn!("Filter model output was not JSON ({reason}): {raw:.200}");
            return FilterUpdate::Error(PARSE_FAILURE_MESSAGE.to_string());
        }
    };

    if is_reset(object.get("reset")) {
        return FilterUpdate::Reset;
    }

    FilterUpdate::Changes(FilterChanges::from_object(&object))
}

fn is_reset(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}
