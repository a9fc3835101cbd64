//! Explanation refiner. Asks the chat model why a resume fits a job.
//!
//! Model output is decoded as `ModelJson`; anything that does not parse is replaced
//! by a locally computed placeholder, never raised. Only provider failures
//! (network, quota, timeout) escape as errors.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::llm_client::json::{parse_model_json, ModelJson};
use crate::llm_client::prompts::{fill, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{truncate_chars, with_timeout, InferenceProvider, ProviderError};
use crate::matching::fallback::matching_skills;
use crate::matching::prompts::{EXPLANATION_PROMPT_TEMPLATE, EXPLANATION_SYSTEM};
use crate::models::job::JobPosting;
use crate::models::matching::MatchExplanation;

/// Where the explanation text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationSource {
    Model,
    /// The model answered but its output could not be decoded.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    pub score: u8,
    pub explanation: MatchExplanation,
    pub source: ExplanationSource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelExplanation {
    #[serde(default)]
    matching_skills: Vec<String>,
    #[serde(default)]
    relevant_experience: String,
    #[serde(default)]
    keyword_alignment: String,
    #[serde(default)]
    adjusted_score: Option<Value>,
    #[serde(default)]
    reasoning: String,
}

pub struct ExplanationRefiner {
    provider: Arc<dyn InferenceProvider>,
    resume_char_budget: usize,
    timeout: Duration,
}

impl ExplanationRefiner {
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        resume_char_budget: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            resume_char_budget,
            timeout,
        }
    }

    pub async fn refine(
        &self,
        resume_text: &str,
        job: &JobPosting,
        base_score: u8,
    ) -> Result<Refinement, ProviderError> {
        let prompt = self.build_prompt(resume_text, job, base_score);
        let system = format!("{EXPLANATION_SYSTEM} {JSON_ONLY_INSTRUCTION}");

        let raw = with_timeout(self.timeout, self.provider.complete(&system, &prompt)).await?;

        Ok(match parse_model_json::<ModelExplanation>(&raw) {
            ModelJson::Parsed(parsed) => reconcile(parsed, resume_text, job, base_score),
            ModelJson::ParseFailed { raw, reason } => {
                warn!(
                    "Explanation for '{}' was not valid JSON ({reason}); using placeholder. Raw: {:.200}",
                    job.title, raw
                );
                Refinement {
                    score: base_score.min(100),
                    explanation: unexplained(resume_text, job, base_score),
                    source: ExplanationSource::Placeholder,
                }
            }
        })
    }

    fn build_prompt(&self, resume_text: &str, job: &JobPosting, base_score: u8) -> String {
        let score = base_score.to_string();
        let skills = job.skills.join(", ");
        fill(
            EXPLANATION_PROMPT_TEMPLATE,
            &[
                ("{base_score}", score.as_str()),
                ("{job_title}", job.title.as_str()),
                ("{company}", job.company.as_deref().unwrap_or("Not specified")),
                ("{skills}", skills.as_str()),
                ("{description}", job.description.as_str()),
                ("{resume}", truncate_chars(resume_text, self.resume_char_budget)),
            ],
        )
    }
}

fn reconcile(
    parsed: ModelExplanation,
    resume_text: &str,
    job: &JobPosting,
    base_score: u8,
) -> Refinement {
    let fallback = unexplained(resume_text, job, base_score);
    let or_placeholder = |text: String, placeholder: String| {
        if text.trim().is_empty() {
            placeholder
        } else {
            text
        }
    };

    Refinement {
        score: reconcile_score(parsed.adjusted_score.as_ref(), base_score),
        explanation: MatchExplanation {
            matching_skills: parsed.matching_skills,
            relevant_experience: or_placeholder(
                parsed.relevant_experience,
                fallback.relevant_experience,
            ),
            keyword_alignment: or_placeholder(parsed.keyword_alignment, fallback.keyword_alignment),
            reasoning: or_placeholder(parsed.reasoning, fallback.reasoning),
        },
        source: ExplanationSource::Model,
    }
}

/// Explanation for a match whose score is semantic but whose model text is
/// missing. Unlike the degraded placeholder it does not claim a keyword score.
fn unexplained(resume_text: &str, job: &JobPosting, base_score: u8) -> MatchExplanation {
    let matching_skills = matching_skills(resume_text, &job.skills);
    MatchExplanation {
        keyword_alignment: format!(
            "{} of {} listed skills appear in the resume.",
            matching_skills.len(),
            job.skills.len()
        ),
        matching_skills,
        relevant_experience: "A written experience analysis could not be generated for this match."
            .to_string(),
        reasoning: format!(
            "Score of {base_score} reflects semantic similarity between the resume and the posting. \
             A written explanation could not be generated."
        ),
    }
}

/// `adjustedScore` wins when it is a finite number (or numeric string); the result
/// is clamped to 0..=100. Otherwise the base score stands.
fn reconcile_score(adjusted: Option<&Value>, base_score: u8) -> u8 {
    let adjusted = match adjusted {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match adjusted.filter(|v| v.is_finite()) {
        Some(value) => value.round().clamp(0.0, 100.0) as u8,
        None => base_score.min(100),
    }
}
