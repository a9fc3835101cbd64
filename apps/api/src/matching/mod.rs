// Semantic resume/job matching.
// Embeddings + cosine score, optional model explanation, keyword fallback on any failure.
// All provider calls go through llm_client::InferenceProvider.

pub mod embedding_cache;
pub mod explanation;
pub mod fallback;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod similarity;
