/// LLM Client. The single point of entry for all inference provider calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic or embeddings APIs directly.
/// Everything goes through `InferenceProvider`, implemented here by `LlmClient`.
///
/// Model: claude-sonnet-4-5 (fixed, not configurable)
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod json;
#[cfg(test)]
pub mod mock;
pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The chat model used for every completion.
pub const MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 1024;
/// One retry at most.
const MAX_ATTEMPTS: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// An embedding vector as returned by the provider.
pub type Embedding = Vec<f32>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("provider returned empty content")]
    EmptyContent,

    #[error("could not decode provider response: {0}")]
    Decode(String),

    #[error("Rate limited after {retries} attempts")]
    RateLimited { retries: u32 },
}

/// The two calls the matching and assistant cores make against a model provider.
///
/// Carried as `Arc<dyn InferenceProvider>` so tests can substitute a scripted provider.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError>;

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError>;
}

/// Runs a provider future under a hard time limit. Elapsing is reported as
/// `ProviderError::Timeout` and the in-flight call is dropped.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit)),
    }
}

/// Returns at most `max_chars` characters of `text`, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: [&'a str; 1],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Connection settings for `LlmClient`.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub anthropic_api_key: String,
    pub embedding_api_key: String,
    pub embedding_api_url: String,
    pub embedding_model: String,
    pub timeout: Duration,
}

/// The production inference provider.
/// Wraps the Anthropic Messages API and an OpenAI-compatible embeddings endpoint
/// with a per-request timeout and a single retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
}

impl LlmClient {
    pub fn new(settings: LlmSettings) -> Self {
        Self {
            client: Client::builder()
                .timeout(settings.timeout)
                .build()
                .expect("Failed to build HTTP client"),
            settings,
        }
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries once on transport errors, 429 and 5xx.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, ProviderError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let request = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.settings.anthropic_api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body);

        let llm_response: LlmResponse = self.send_with_retry("completion", request).await?;

        debug!(
            "LLM call succeeded: input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );

        Ok(llm_response)
    }

    async fn send_with_retry<T: serde::de::DeserializeOwned>(
        &self,
        label: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                warn!(
                    "{label} call attempt {attempt} failed, retrying after {}ms...",
                    RETRY_DELAY.as_millis()
                );
                tokio::time::sleep(RETRY_DELAY).await;
            }

            let Some(builder) = request.try_clone() else {
                return Err(ProviderError::Decode(format!(
                    "{label} request body cannot be retried"
                )));
            };

            let response = match builder.send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ProviderError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("{label} API returned {status}: {body}");
                last_error = Some(ProviderError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return response.json::<T>().await.map_err(ProviderError::Http);
        }

        Err(last_error.unwrap_or(ProviderError::RateLimited {
            retries: MAX_ATTEMPTS,
        }))
    }
}

#[async_trait]
impl InferenceProvider for LlmClient {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        let request = self
            .client
            .post(&self.settings.embedding_api_url)
            .bearer_auth(&self.settings.embedding_api_key)
            .json(&EmbeddingRequest {
                input: [text],
                model: &self.settings.embedding_model,
            });

        let response: EmbeddingResponse = self.send_with_retry("embedding", request).await?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| ProviderError::Decode("embedding response had no vector".to_string()))?;

        debug!("Embedding call succeeded: dimensions={}", embedding.len());
        Ok(embedding)
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        let response = self.call(prompt, system).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(ProviderError::EmptyContent)
    }
}
