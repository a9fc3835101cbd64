use std::time::Duration;

use anyhow::{Context, Result};

const DEFAULT_EMBEDDING_API_URL: &str = "https://api.voyageai.com/v1/embeddings";
const DEFAULT_EMBEDDING_MODEL: &str = "voyage-3-lite";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub embedding_api_key: String,
    pub embedding_api_url: String,
    pub embedding_model: String,
    pub port: u16,
    pub rust_log: String,
    /// Upper bound for a single embed/complete round-trip.
    pub provider_timeout: Duration,
    /// Caller-level deadline for one match request or one chat turn.
    pub request_deadline: Duration,
    pub resume_char_budget: usize,
    pub batch_concurrency: usize,
    pub memory_max_turns: usize,
    /// Conversations untouched for this long are forgotten.
    pub conversation_idle_timeout: Duration,
    /// `None` keeps every embedding for the life of the process.
    pub embedding_cache_capacity: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            embedding_api_key: require_env("EMBEDDING_API_KEY")?,
            embedding_api_url: std::env::var("EMBEDDING_API_URL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_API_URL.to_string()),
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            port: parse_env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            provider_timeout: Duration::from_secs(parse_env_or("PROVIDER_TIMEOUT_SECS", 12)?),
            request_deadline: Duration::from_secs(parse_env_or("REQUEST_DEADLINE_SECS", 30)?),
            resume_char_budget: parse_env_or("RESUME_CHAR_BUDGET", 2000)?,
            batch_concurrency: parse_env_or::<usize>("BATCH_CONCURRENCY", 8)?.max(1),
            memory_max_turns: parse_env_or::<usize>("MEMORY_MAX_TURNS", 20)?.max(1),
            conversation_idle_timeout: Duration::from_secs(
                parse_env_or::<u64>("CONVERSATION_IDLE_SECS", 3600)?.max(1),
            ),
            embedding_cache_capacity: parse_optional(
                "EMBEDDING_CACHE_CAPACITY",
                std::env::var("EMBEDDING_CACHE_CAPACITY").ok(),
            )?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env_or<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_optional(key, std::env::var(key).ok())?.unwrap_or(default))
}

/// Parses an optional raw value; blank counts as unset.
fn parse_optional<T>(key: &str, raw: Option<String>) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("{key} must be a valid number, got '{value}'")),
    }
}
