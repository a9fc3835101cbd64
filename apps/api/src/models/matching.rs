use serde::{Deserialize, Serialize};

/// How much work a match request is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Embeddings and cosine score only. Used across batches.
    Fast,
    /// Embeddings, cosine score and a model-written explanation.
    Detailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchExplanation {
    pub matching_skills: Vec<String>,
    pub relevant_experience: String,
    pub keyword_alignment: String,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadata {
    pub semantic_similarity: f32,
    pub base_score: u8,
    /// Set when the fallback scorer produced this result.
    pub degraded: bool,
    pub mode: MatchMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compatibility of one resume with one job posting.
///
/// `score` is always within 0..=100. When `metadata.degraded` is set the
/// explanation text is fixed placeholder copy rather than model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: u8,
    pub explanation: MatchExplanation,
    pub metadata: MatchMetadata,
}
