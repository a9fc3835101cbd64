//! Embedding cache. Memoizes provider embeddings by fingerprint.
//!
//! Fingerprints are a namespaced prefix of the input text, not a content hash:
//! near-duplicate resumes that share an opening collapse onto one entry. Two callers
//! racing on the same missing fingerprint may both call the provider; the last
//! write wins, which is harmless because the vectors are equivalent.

use std::sync::Arc;

use moka::sync::Cache;
use tracing::debug;

use crate::llm_client::{truncate_chars, InferenceProvider, ProviderError};

/// Characters of input text that make up a fingerprint.
pub const FINGERPRINT_PREFIX_CHARS: usize = 100;

/// An immutable embedding. Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Arc<[f32]>);

impl EmbeddingVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values.into())
    }
}

/// Builds the cache key for `text` within `namespace` (e.g. `resume`, `job`).
pub fn fingerprint(namespace: &str, text: &str) -> String {
    format!(
        "{namespace}:{}",
        truncate_chars(text.trim(), FINGERPRINT_PREFIX_CHARS)
    )
}

pub struct EmbeddingCache {
    provider: Arc<dyn InferenceProvider>,
    entries: Cache<String, EmbeddingVector>,
}

impl EmbeddingCache {
    /// Cache that keeps every embedding for the life of the process.
    pub fn unbounded(provider: Arc<dyn InferenceProvider>) -> Self {
        Self {
            provider,
            entries: Cache::builder().build(),
        }
    }

    /// Cache that evicts once `capacity` entries are held.
    pub fn with_capacity(provider: Arc<dyn InferenceProvider>, capacity: u64) -> Self {
        Self {
            provider,
            entries: Cache::builder().max_capacity(capacity).build(),
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<EmbeddingVector> {
        self.entries.get(fingerprint)
    }

    /// Returns the cached vector for `fingerprint`, or embeds `text` and stores it.
    ///
    /// Provider failures propagate unchanged and leave the cache untouched.
    pub async fn get_or_compute(
        &self,
        text: &str,
        fingerprint: &str,
    ) -> Result<EmbeddingVector, ProviderError> {
        if let Some(hit) = self.get(fingerprint) {
            debug!("Embedding cache hit: {fingerprint:.40}");
            return Ok(hit);
        }

        debug!("Embedding cache miss: {fingerprint:.40}");
        let vector = EmbeddingVector::from(self.provider.embed(text).await?);
        self.entries.insert(fingerprint.to_string(), vector.clone());
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::{unavailable, MockProvider};

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let provider = Arc::new(MockProvider::new());
        let cache = EmbeddingCache::unbounded(provider.clone());

        let first = cache.get_or_compute("Rust engineer", "resume:Rust").await.unwrap();
        let second = cache.get_or_compute("Rust engineer", "resume:Rust").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.embed_calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_fingerprints_are_computed_separately() {
        let provider = Arc::new(MockProvider::new());
        let cache = EmbeddingCache::unbounded(provider.clone());

        cache.get_or_compute("a", "job:1").await.unwrap();
        cache.get_or_compute("b", "job:2").await.unwrap();

        assert_eq!(provider.embed_calls(), 2);
        assert!(cache.get("job:1").is_some());
        assert!(cache.get("job:2").is_some());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates_and_is_not_cached() {
        let provider = Arc::new(MockProvider::new().with_embed(|_| Err(unavailable())));
        let cache = EmbeddingCache::unbounded(provider.clone());

        let result = cache.get_or_compute("text", "resume:text").await;

        assert!(matches!(result, Err(ProviderError::Api { status: 503, .. })));
        assert!(cache.get("resume:text").is_none());
    }

    #[tokio::test]
    async fn test_bounded_cache_still_memoizes() {
        let provider = Arc::new(MockProvider::new());
        let cache = EmbeddingCache::with_capacity(provider.clone(), 16);

        cache.get_or_compute("x", "job:x").await.unwrap();
        cache.get_or_compute("x", "job:x").await.unwrap();

        assert_eq!(provider.embed_calls(), 1);
    }

    #[test]
    fn test_fingerprint_uses_stable_prefix() {
        let long = "x".repeat(500);
        let fp = fingerprint("resume", &long);
        assert_eq!(fp.len(), "resume:".len() + FINGERPRINT_PREFIX_CHARS);
    }

    #[test]
    fn test_fingerprint_collapses_texts_sharing_a_prefix() {
        let opening = "Jane Doe. Senior engineer. ".repeat(10);
        let a = format!("{opening} Extra line A");
        let b = format!("{opening} Something else entirely");
        assert_eq!(fingerprint("resume", &a), fingerprint("resume", &b));
        assert_ne!(fingerprint("resume", &a), fingerprint("job", &a));
    }
}
