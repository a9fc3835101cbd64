//! Conversation router. A one-hop state machine.
//!
//! detect_intent → exactly one terminal handler (filter_update | job_search | help | general).
//! No handler transitions anywhere else. Every turn is recorded in `ConversationMemory`,
//! and no provider problem ever reaches the caller: the worst case is a fixed apology.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assistant::filter_parser::FilterUpdateParser;
use crate::assistant::intent::IntentClassifier;
use crate::assistant::memory::ConversationMemory;
use crate::assistant::prompts::{
    general_system, help_system, job_search_system, GUIDANCE_PROMPT_TEMPLATE,
};
use crate::errors::InputError;
use crate::llm_client::prompts::fill;
use crate::llm_client::{with_timeout, InferenceProvider};
use crate::models::chat::{AssistantResult, ConversationTurn, Intent, Role};
use crate::models::filters::{FilterChanges, FilterUpdate};

pub const APOLOGY: &str =
    "I'm sorry, I ran into a problem answering that. Please try again in a moment.";
const RESET_MESSAGE: &str = "All filters have been cleared.";
const PARSE_ERROR_MESSAGE: &str = "Sorry, I couldn't understand that filter request. \
    Try something like \"show remote jobs posted this week\".";
const NO_CHANGES_MESSAGE: &str = "I couldn't find any filter changes in that request. \
    Try something like \"full-time jobs in Berlin\".";

/// Turns of history included in guidance prompts.
const HISTORY_WINDOW: usize = 6;

/// Terminal states of the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    FilterUpdate,
    JobSearch,
    Help,
    General,
}

impl Handler {
    pub fn name(self) -> &'static str {
        match self {
            Handler::FilterUpdate => "filter_update",
            Handler::JobSearch => "job_search",
            Handler::Help => "help",
            Handler::General => "general",
        }
    }
}

/// The transition table. Total over `Intent`, so there is no failure arm.
pub fn route(intent: Intent) -> Handler {
    match intent {
        Intent::FilterUpdate => Handler::FilterUpdate,
        Intent::JobSearch => Handler::JobSearch,
        Intent::Help => Handler::Help,
        Intent::General => Handler::General,
    }
}

#[derive(Debug, Clone)]
pub struct AssistantSettings {
    pub provider_timeout: Duration,
    /// Deadline for one whole chat turn (classification plus handler).
    pub request_deadline: Duration,
}

pub struct ConversationRouter {
    provider: Arc<dyn InferenceProvider>,
    classifier: IntentClassifier,
    filter_parser: FilterUpdateParser,
    memory: Arc<ConversationMemory>,
    settings: AssistantSettings,
}

impl ConversationRouter {
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        memory: Arc<ConversationMemory>,
        settings: AssistantSettings,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(provider.clone(), settings.provider_timeout),
            filter_parser: FilterUpdateParser::new(provider.clone(), settings.provider_timeout),
            provider,
            memory,
            settings,
        }
    }

    /// Handles one user message and records both sides of the exchange.
    pub async fn chat(
        &self,
        conversation_id: &str,
        message: &str,
    ) -> Result<AssistantResult, InputError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(InputError::EmptyMessage);
        }

        let history = self.memory.recent(conversation_id, HISTORY_WINDOW);
        self.memory
            .append(conversation_id, ConversationTurn::new(Role::User, message));

        let result = match tokio::time::timeout(
            self.settings.request_deadline,
            self.respond(message, &history),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Chat turn for conversation {conversation_id} exceeded {:?}",
                    self.settings.request_deadline
                );
                AssistantResult {
                    response: APOLOGY.to_string(),
                    intent: Intent::General,
                    filter_updates: None,
                }
            }
        };

        self.memory.append(
            conversation_id,
            ConversationTurn::new(Role::Assistant, result.response.clone()),
        );
        info!(
            "Chat turn handled: conversation={conversation_id} intent={}",
            result.intent.as_str()
        );

        Ok(result)
    }

    async fn respond(&self, message: &str, history: &[ConversationTurn]) -> AssistantResult {
        let intent = self.classifier.classify(message).await;
        let handler = route(intent);
        debug!("Routing intent {} to handler {}", intent.as_str(), handler.name());

        match handler {
            Handler::FilterUpdate => {
                let update = self.filter_parser.parse(message).await;
                AssistantResult {
                    response: summarize_filter_update(&update),
                    intent,
                    filter_updates: Some(update),
                }
            }
            Handler::JobSearch => self.guidance(intent, &job_search_system(), history, message).await,
            Handler::Help => self.guidance(intent, &help_system(), history, message).await,
            Handler::General => self.guidance(intent, &general_system(), history, message).await,
        }
    }

    /// Free-form model answer under a fixed system framing, returned verbatim.
    async fn guidance(
        &self,
        intent: Intent,
        system: &str,
        history: &[ConversationTurn],
        message: &str,
    ) -> AssistantResult {
        let transcript = render_history(history);
        let prompt = fill(
            GUIDANCE_PROMPT_TEMPLATE,
            &[("{history}", transcript.as_str()), ("{message}", message)],
        );

        let response = match with_timeout(
            self.settings.provider_timeout,
            self.provider.complete(system, &prompt),
        )
        .await
        {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Guidance reply for {} was empty", intent.as_str());
                APOLOGY.to_string()
            }
            Err(e) => {
                warn!("Guidance call for {} failed: {e}", intent.as_str());
                APOLOGY.to_string()
            }
        };

        AssistantResult {
            response,
            intent,
            filter_updates: None,
        }
    }
}

fn render_history(history: &[ConversationTurn]) -> String {
    if history.is_empty() {
        return "(no earlier messages)".to_string();
    }
    history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{speaker}: {}", turn.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Human-readable confirmation of a filter update. Known keys are listed in a fixed
/// order: role, skills, date posted, job type, work mode, location, match score.
/// Any other keys follow alphabetically.
pub fn summarize_filter_update(update: &FilterUpdate) -> String {
    match update {
        FilterUpdate::Reset => RESET_MESSAGE.to_string(),
        FilterUpdate::Error(_) => PARSE_ERROR_MESSAGE.to_string(),
        FilterUpdate::Changes(changes) if changes.is_empty() => NO_CHANGES_MESSAGE.to_string(),
        FilterUpdate::Changes(changes) => {
            format!("Updated your filters: {}.", describe_changes(changes).join("; "))
        }
    }
}

fn describe_changes(changes: &FilterChanges) -> Vec<String> {
    let mut parts = Vec::new();
    if let Some(role) = &changes.role {
        parts.push(format!("role: {role}"));
    }
    if let Some(skills) = &changes.skills {
        parts.push(format!("skills: {}", skills.join(", ")));
    }
    if let Some(date_posted) = changes.date_posted {
        parts.push(format!("date posted: {}", date_posted.label()));
    }
    if let Some(job_type) = changes.job_type {
        parts.push(format!("job type: {}", job_type.label()));
    }
    if let Some(work_mode) = changes.work_mode {
        parts.push(format!("work mode: {}", work_mode.label()));
    }
    if let Some(location) = &changes.location {
        parts.push(format!("location: {location}"));
    }
    if let Some(match_score) = changes.match_score {
        parts.push(format!("match score: {}", match_score.label()));
    }
    let mut extra: Vec<_> = changes.extra.iter().collect();
    extra.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in extra {
        parts.push(format!("{key}: {}", display_value(value)));
    }
    parts
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items.iter().map(display_value).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}
