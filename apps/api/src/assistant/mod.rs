// Conversational assistant.
// Classify intent, route to exactly one handler, remember the last turns per conversation.
// All provider calls go through llm_client::InferenceProvider.

pub mod filter_parser;
pub mod handlers;
pub mod intent;
pub mod memory;
pub mod prompts;
pub mod router;
