use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::filters::FilterUpdate;

/// What a chat message is for. The set is closed: model output that is not
/// exactly one of these labels becomes `General`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    FilterUpdate,
    JobSearch,
    Help,
    General,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::FilterUpdate,
        Intent::JobSearch,
        Intent::Help,
        Intent::General,
    ];

    /// Coerces untrusted text (typically a classifier reply) into an intent.
    pub fn from_untrusted(raw: &str) -> Intent {
        match raw.trim().to_lowercase().as_str() {
            "filter_update" => Intent::FilterUpdate,
            "job_search" => Intent::JobSearch,
            "help" => Intent::Help,
            _ => Intent::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::FilterUpdate => "filter_update",
            Intent::JobSearch => "job_search",
            Intent::Help => "help",
            Intent::General => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message in a conversation. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// What the assistant returns for one chat turn.
/// `filter_updates` is only ever set for `Intent::FilterUpdate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantResult {
    pub response: String,
    pub intent: Intent,
    pub filter_updates: Option<FilterUpdate>,
}
