//! Conversation memory. Bounded, per-conversation turn logs held in process.
//!
//! Each conversation has its own lock, so appends for one id are serialized while
//! different conversations never contend beyond the map lookup. Conversations
//! that see no reads or writes for the idle timeout are dropped.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use parking_lot::Mutex;

use crate::models::chat::ConversationTurn;

pub const DEFAULT_MAX_TURNS: usize = 20;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60 * 60);

type TurnLog = Arc<Mutex<VecDeque<ConversationTurn>>>;

pub struct ConversationMemory {
    max_turns: usize,
    conversations: Cache<String, TurnLog>,
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self::with_idle_timeout(max_turns, DEFAULT_IDLE_TIMEOUT)
    }

    pub fn with_idle_timeout(max_turns: usize, idle_timeout: Duration) -> Self {
        Self {
            max_turns: max_turns.max(1),
            conversations: Cache::builder().time_to_idle(idle_timeout).build(),
        }
    }

    /// Appends a turn, dropping the oldest turns beyond the cap.
    pub fn append(&self, conversation_id: &str, turn: ConversationTurn) {
        let log = self.log_for(conversation_id);
        let mut turns = log.lock();
        turns.push_back(turn);
        while turns.len() > self.max_turns {
            turns.pop_front();
        }
    }

    /// All retained turns, oldest first. Unknown ids have an empty history.
    pub fn get(&self, conversation_id: &str) -> Vec<ConversationTurn> {
        self.recent(conversation_id, self.max_turns)
    }

    /// The last `count` turns, oldest first.
    pub fn recent(&self, conversation_id: &str, count: usize) -> Vec<ConversationTurn> {
        let Some(log) = self.conversations.get(conversation_id) else {
            return Vec::new();
        };
        let turns = log.lock();
        let skip = turns.len().saturating_sub(count);
        turns.iter().skip(skip).cloned().collect()
    }

    /// Empties a conversation's log under its lock. The log itself stays in place,
    /// so a turn appended by an in-flight chat after the clear is kept.
    /// Returns whether any turns were removed.
    pub fn clear(&self, conversation_id: &str) -> bool {
        let Some(log) = self.conversations.get(conversation_id) else {
            return false;
        };
        let mut turns = log.lock();
        let had_turns = !turns.is_empty();
        turns.clear();
        had_turns
    }

    fn log_for(&self, conversation_id: &str) -> TurnLog {
        self.conversations
            .get_with(conversation_id.to_string(), TurnLog::default)
    }
}
