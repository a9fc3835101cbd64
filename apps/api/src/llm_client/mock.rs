//! Scripted `InferenceProvider` for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{Embedding, InferenceProvider, ProviderError};

type EmbedFn = Box<dyn Fn(&str) -> Result<Embedding, ProviderError> + Send + Sync>;
type CompleteFn = Box<dyn Fn(&str, &str) -> Result<String, ProviderError> + Send + Sync>;
type DelayFn = Box<dyn Fn(&str) -> Duration + Send + Sync>;

pub struct MockProvider {
    embed_fn: EmbedFn,
    complete_fn: CompleteFn,
    delay_fn: DelayFn,
    embed_calls: AtomicUsize,
    complete_calls: AtomicUsize,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            embed_fn: Box::new(|_| Ok(vec![1.0, 0.0, 0.0])),
            complete_fn: Box::new(|_, _| Ok("general".to_string())),
            delay_fn: Box::new(|_| Duration::ZERO),
            embed_calls: AtomicUsize::new(0),
            complete_calls: AtomicUsize::new(0),
        }
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose every call fails with an API error.
    pub fn failing() -> Self {
        Self::new()
            .with_embed(|_| Err(unavailable()))
            .with_complete(|_, _| Err(unavailable()))
    }

    pub fn with_embed(
        mut self,
        f: impl Fn(&str) -> Result<Embedding, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.embed_fn = Box::new(f);
        self
    }

    pub fn with_complete(
        mut self,
        f: impl Fn(&str, &str) -> Result<String, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.complete_fn = Box::new(f);
        self
    }

    /// Replies to every completion with the same text.
    pub fn replying(self, reply: &str) -> Self {
        let reply = reply.to_string();
        self.with_complete(move |_, _| Ok(reply.clone()))
    }

    /// Delay applied before answering, keyed by the embed text or completion prompt.
    pub fn with_delay(mut self, f: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay_fn = Box::new(f);
        self
    }

    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }
}

pub fn unavailable() -> ProviderError {
    ProviderError::Api {
        status: 503,
        message: "provider unavailable".to_string(),
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Embedding, ProviderError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        let delay = (self.delay_fn)(text);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (self.embed_fn)(text)
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, ProviderError> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        let delay = (self.delay_fn)(prompt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        (self.complete_fn)(system, prompt)
    }
}
