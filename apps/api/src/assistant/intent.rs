//! Intent classifier. One constrained model call, validated against the closed set.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::assistant::prompts::{INTENT_PROMPT_TEMPLATE, INTENT_SYSTEM};
use crate::llm_client::prompts::fill;
use crate::llm_client::{with_timeout, InferenceProvider};
use crate::models::chat::Intent;

pub struct IntentClassifier {
    provider: Arc<dyn InferenceProvider>,
    timeout: Duration,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn InferenceProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Never fails: empty input, provider errors and unrecognised replies are `General`.
    pub async fn classify(&self, query: &str) -> Intent {
        if query.trim().is_empty() {
            return Intent::General;
        }

        let prompt = fill(INTENT_PROMPT_TEMPLATE, &[("{query}", query)]);
        let raw = match with_timeout(self.timeout, self.provider.complete(INTENT_SYSTEM, &prompt))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Intent classification failed, defaulting to general: {e}");
                return Intent::General;
            }
        };

        let intent = Intent::from_untrusted(&raw);
        if intent == Intent::General && raw.trim() != Intent::General.as_str() {
            debug!("Classifier reply '{:.60}' outside the intent set, coerced to general", raw.trim());
        }
        intent
    }
}
