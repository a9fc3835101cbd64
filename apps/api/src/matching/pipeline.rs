//! Match pipeline. Orchestrates the full resume/job scoring flow.
//!
//! Flow: embeddings (cache) → cosine score → [detailed only] explanation refiner.
//! Any failure on that path, including the caller deadline, is absorbed and the
//! result is produced by the keyword fallback scorer with `degraded = true`.
//! Only `InputError` (a caller bug) escapes.

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{self, StreamExt};
use thiserror::Error;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::errors::InputError;
use crate::llm_client::{with_timeout, InferenceProvider, ProviderError};
use crate::matching::embedding_cache::{fingerprint, EmbeddingCache, EmbeddingVector};
use crate::matching::explanation::{ExplanationRefiner, ExplanationSource};
use crate::matching::fallback::{fallback_score, matching_skills, placeholder_explanation};
use crate::matching::similarity::{base_score, cosine, SimilarityError};
use crate::models::job::{validate_resume, JobPosting};
use crate::models::matching::{MatchExplanation, MatchMetadata, MatchMode, MatchResult};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub provider_timeout: Duration,
    pub request_deadline: Duration,
    pub resume_char_budget: usize,
    pub batch_concurrency: usize,
}

/// Why the primary path was abandoned. Rendered into `metadata.error`.
#[derive(Debug, Error)]
enum MatchFailure {
    #[error("embedding failed: {0}")]
    Embedding(ProviderError),

    #[error("explanation failed: {0}")]
    Explanation(ProviderError),

    #[error(transparent)]
    Similarity(#[from] SimilarityError),

    #[error("request deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

pub struct MatchPipeline {
    cache: Arc<EmbeddingCache>,
    refiner: ExplanationRefiner,
    settings: PipelineSettings,
}

impl MatchPipeline {
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        cache: Arc<EmbeddingCache>,
        settings: PipelineSettings,
    ) -> Self {
        let refiner = ExplanationRefiner::new(
            provider,
            settings.resume_char_budget,
            settings.provider_timeout,
        );
        Self {
            cache,
            refiner,
            settings,
        }
    }

    /// Detailed match for a single job, including a model-written explanation.
    pub async fn match_one(
        &self,
        resume_text: &str,
        job: &JobPosting,
    ) -> Result<MatchResult, InputError> {
        validate_resume(resume_text)?;
        job.validate(0)?;

        let deadline = Instant::now() + self.settings.request_deadline;
        let attempt = async {
            let (resume_vec, job_vec) =
                tokio::try_join!(self.embed_resume(resume_text), self.embed_job(job))?;
            self.score(resume_text, &resume_vec, &job_vec, job, MatchMode::Detailed)
                .await
        };

        Ok(self
            .settle(resume_text, job, MatchMode::Detailed, timeout_at(deadline, attempt).await))
    }

    /// Fast matches for every job, in the same order as `jobs`.
    ///
    /// Per-job work runs concurrently (bounded by `batch_concurrency`); completion
    /// order does not affect the output order.
    pub async fn batch_match(
        &self,
        resume_text: &str,
        jobs: &[JobPosting],
    ) -> Result<Vec<MatchResult>, InputError> {
        validate_resume(resume_text)?;
        for (index, job) in jobs.iter().enumerate() {
            job.validate(index)?;
        }
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let deadline = Instant::now() + self.settings.request_deadline;

        // One resume embedding for the whole batch. If it fails, every job degrades
        // without further provider calls.
        let resume_vec = match timeout_at(deadline, self.embed_resume(resume_text)).await {
            Ok(Ok(vector)) => vector,
            Ok(Err(failure)) => return Ok(self.degrade_all(resume_text, jobs, failure)),
            Err(_) => {
                let failure = MatchFailure::DeadlineExceeded(self.settings.request_deadline);
                return Ok(self.degrade_all(resume_text, jobs, failure));
            }
        };

        let pending: Vec<_> = jobs
            .iter()
            .map(|job| self.fast_one(resume_text, &resume_vec, job, deadline))
            .collect();
        let results: Vec<MatchResult> = stream::iter(pending)
            .buffered(self.settings.batch_concurrency.max(1))
            .collect()
            .await;

        let degraded = results.iter().filter(|r| r.metadata.degraded).count();
        info!(
            "Batch matched {} jobs ({} degraded)",
            results.len(),
            degraded
        );

        Ok(results)
    }

    /// One batch entry: job embedding plus cosine score, bounded by the batch deadline.
    async fn fast_one(
        &self,
        resume_text: &str,
        resume_vec: &EmbeddingVector,
        job: &JobPosting,
        deadline: Instant,
    ) -> MatchResult {
        let attempt = async {
            let job_vec = self.embed_job(job).await?;
            self.score(resume_text, resume_vec, &job_vec, job, MatchMode::Fast)
                .await
        };
        self.settle(resume_text, job, MatchMode::Fast, timeout_at(deadline, attempt).await)
    }

    async fn embed_resume(&self, resume_text: &str) -> Result<EmbeddingVector, MatchFailure> {
        let key = fingerprint("resume", resume_text);
        self.embed(resume_text, &key).await
    }

    async fn embed_job(&self, job: &JobPosting) -> Result<EmbeddingVector, MatchFailure> {
        let text = job.embedding_text();
        let key = fingerprint("job", &text);
        self.embed(&text, &key).await
    }

    async fn embed(&self, text: &str, key: &str) -> Result<EmbeddingVector, MatchFailure> {
        with_timeout(
            self.settings.provider_timeout,
            self.cache.get_or_compute(text, key),
        )
        .await
        .map_err(MatchFailure::Embedding)
    }

    async fn score(
        &self,
        resume_text: &str,
        resume_vec: &EmbeddingVector,
        job_vec: &EmbeddingVector,
        job: &JobPosting,
        mode: MatchMode,
    ) -> Result<MatchResult, MatchFailure> {
        let similarity = cosine(resume_vec.as_slice(), job_vec.as_slice())?;
        let base = base_score(similarity);

        let metadata = MatchMetadata {
            semantic_similarity: similarity,
            base_score: base,
            degraded: false,
            mode,
            error: None,
        };

        match mode {
            MatchMode::Fast => Ok(MatchResult {
                score: base,
                explanation: fast_explanation(resume_text, job, similarity),
                metadata,
            }),
            MatchMode::Detailed => {
                let refinement = self
                    .refiner
                    .refine(resume_text, job, base)
                    .await
                    .map_err(MatchFailure::Explanation)?;
                if refinement.source == ExplanationSource::Placeholder {
                    debug!("Detailed match for '{}' used placeholder explanation", job.title);
                }
                Ok(MatchResult {
                    score: refinement.score,
                    explanation: refinement.explanation,
                    metadata,
                })
            }
        }
    }

    /// Collapses the outcome of an attempt into a result, degrading on any failure.
    fn settle(
        &self,
        resume_text: &str,
        job: &JobPosting,
        mode: MatchMode,
        outcome: Result<Result<MatchResult, MatchFailure>, tokio::time::error::Elapsed>,
    ) -> MatchResult {
        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(failure)) => degraded_result(resume_text, job, mode, &failure),
            Err(_) => degraded_result(
                resume_text,
                job,
                mode,
                &MatchFailure::DeadlineExceeded(self.settings.request_deadline),
            ),
        }
    }

    fn degrade_all(
        &self,
        resume_text: &str,
        jobs: &[JobPosting],
        failure: MatchFailure,
    ) -> Vec<MatchResult> {
        warn!(
            "Resume embedding unavailable, degrading {} jobs: {failure}",
            jobs.len()
        );
        jobs.iter()
            .map(|job| degraded_result(resume_text, job, MatchMode::Fast, &failure))
            .collect()
    }
}

fn degraded_result(
    resume_text: &str,
    job: &JobPosting,
    mode: MatchMode,
    failure: &MatchFailure,
) -> MatchResult {
    warn!("Match for '{}' degraded to keyword fallback: {failure}", job.title);
    let score = fallback_score(resume_text, job);
    MatchResult {
        score,
        explanation: placeholder_explanation(resume_text, job),
        metadata: MatchMetadata {
            semantic_similarity: 0.0,
            base_score: score,
            degraded: true,
            mode,
            error: Some(failure.to_string()),
        },
    }
}

fn fast_explanation(resume_text: &str, job: &JobPosting, similarity: f32) -> MatchExplanation {
    let matching_skills = matching_skills(resume_text, &job.skills);
    MatchExplanation {
        relevant_experience: format!(
            "{} of {} listed skills appear in the resume.",
            matching_skills.len(),
            job.skills.len()
        ),
        keyword_alignment: format!(
            "Semantic similarity {:.0}%.",
            similarity.max(0.0) * 100.0
        ),
        reasoning: "Quick match from embedding similarity. Request a detailed match for a full explanation."
            .to_string(),
        matching_skills,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::mock::{unavailable, MockProvider};
    use crate::models::job::make_job;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            provider_timeout: Duration::from_secs(12),
            request_deadline: Duration::from_secs(30),
            resume_char_budget: 2000,
            batch_concurrency: 8,
        }
    }

    fn pipeline(provider: Arc<MockProvider>) -> MatchPipeline {
        pipeline_with(provider, settings())
    }

    fn pipeline_with(provider: Arc<MockProvider>, settings: PipelineSettings) -> MatchPipeline {
        let cache = Arc::new(EmbeddingCache::unbounded(provider.clone()));
        MatchPipeline::new(provider, cache, settings)
    }

    /// Resume and job texts embed to a fixed high-similarity pair.
    fn high_similarity_provider() -> MockProvider {
        MockProvider::new().with_embed(|text| {
            Ok(if text.contains("Skills:") {
                vec![0.9, 0.4, 0.1]
            } else {
                vec![1.0, 0.3, 0.0]
            })
        })
    }

    #[tokio::test]
    async fn test_fast_match_end_to_end() {
        let provider = Arc::new(high_similarity_provider());
        let resume = "Full-stack developer. Python, React, PostgreSQL.";
        let job = make_job("Software Engineer", &["Python", "React", "PostgreSQL", "REST APIs"]);

        let results = pipeline(provider).batch_match(resume, &[job]).await.unwrap();
        let result = &results[0];

        let expected_similarity = cosine(&[1.0, 0.3, 0.0], &[0.9, 0.4, 0.1]).unwrap();
        assert!(!result.metadata.degraded);
        assert_eq!(result.metadata.mode, MatchMode::Fast);
        assert_eq!(result.metadata.base_score, base_score(expected_similarity));
        assert_eq!(result.score, result.metadata.base_score);
        assert!(result.score >= 60, "got {}", result.score);
        for skill in ["Python", "React", "PostgreSQL"] {
            assert!(result.explanation.matching_skills.iter().any(|s| s == skill));
        }
    }

    #[tokio::test]
    async fn test_fast_mode_never_calls_the_chat_model() {
        let provider = Arc::new(high_similarity_provider());
        let jobs = vec![make_job("A", &["Go"]), make_job("B", &["Rust"])];

        pipeline(provider.clone()).batch_match("Go and Rust", &jobs).await.unwrap();

        assert_eq!(provider.complete_calls(), 0);
    }

    #[tokio::test]
    async fn test_failing_provider_degrades_to_fallback_formula() {
        let provider = Arc::new(MockProvider::failing());
        let resume = "Backend Engineer skilled in Rust";
        let job = make_job("Backend Engineer", &["Rust", "Kafka"]);

        let result = pipeline(provider).match_one(resume, &job).await.unwrap();

        assert!(result.metadata.degraded);
        assert_eq!(result.score, fallback_score(resume, &job));
        assert_eq!(result.score, 50);
        assert!(result.metadata.error.as_deref().unwrap().contains("embedding failed"));
        assert_eq!(result.metadata.mode, MatchMode::Detailed);
    }

    #[tokio::test]
    async fn test_detailed_match_uses_refined_score() {
        let provider = Arc::new(high_similarity_provider().replying(
            r#"{"matchingSkills": ["Python"], "relevantExperience": "e",
                "keywordAlignment": "k", "adjustedScore": 83, "reasoning": "r"}"#,
        ));
        let job = make_job("Engineer", &["Python"]);

        let result = pipeline(provider.clone()).match_one("Python", &job).await.unwrap();

        assert!(!result.metadata.degraded);
        assert_eq!(result.score, 83);
        assert_eq!(result.explanation.reasoning, "r");
        assert_eq!(provider.complete_calls(), 1);
    }

    #[tokio::test]
    async fn test_refiner_provider_failure_degrades() {
        let provider = Arc::new(
            high_similarity_provider().with_complete(|_, _| Err(unavailable())),
        );
        let job = make_job("Engineer", &["Python"]);

        let result = pipeline(provider).match_one("Python", &job).await.unwrap();

        assert!(result.metadata.degraded);
        assert!(result.metadata.error.as_deref().unwrap().contains("explanation failed"));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_degrades() {
        let provider = Arc::new(MockProvider::new().with_embed(|text| {
            Ok(if text.contains("Skills:") { vec![1.0, 0.0] } else { vec![1.0, 0.0, 0.0] })
        }));
        let job = make_job("Engineer", &["Python"]);

        let result = pipeline(provider).match_one("Python", &job).await.unwrap();

        assert!(result.metadata.degraded);
        assert!(result.metadata.error.as_deref().unwrap().contains("dimension mismatch"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_preserves_input_order_regardless_of_latency() {
        let provider = Arc::new(
            MockProvider::new()
                .with_delay(|text| {
                    if text.starts_with("Job A") {
                        Duration::from_millis(900)
                    } else if text.starts_with("Job B") {
                        Duration::from_millis(10)
                    } else {
                        Duration::from_millis(300)
                    }
                }),
        );
        let jobs = vec![
            make_job("Job A", &["Alpha"]),
            make_job("Job B", &["Beta"]),
            make_job("Job C", &["Gamma"]),
        ];

        let results = pipeline(provider)
            .batch_match("Alpha Beta Gamma", &jobs)
            .await
            .unwrap();

        let skills: Vec<&str> = results
            .iter()
            .map(|r| r.explanation.matching_skills[0].as_str())
            .collect();
        assert_eq!(skills, vec!["Alpha", "Beta", "Gamma"]);
        assert!(results.iter().all(|r| !r.metadata.degraded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_runs_jobs_concurrently() {
        let provider = Arc::new(MockProvider::new().with_delay(|text| {
            if text.contains("Skills:") {
                Duration::from_secs(5)
            } else {
                Duration::ZERO
            }
        }));
        let jobs: Vec<JobPosting> = (0..4).map(|i| make_job(&format!("Job {i}"), &["X"])).collect();

        let started = Instant::now();
        let results = pipeline(provider).batch_match("X", &jobs).await.unwrap();

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| !r.metadata.degraded));
        assert!(started.elapsed() < Duration::from_secs(10), "jobs ran sequentially");
    }

    #[tokio::test]
    async fn test_batch_isolates_per_job_failures() {
        let provider = Arc::new(MockProvider::new().with_embed(|text| {
            if text.starts_with("Job B") {
                Err(unavailable())
            } else {
                Ok(vec![1.0, 0.0, 0.0])
            }
        }));
        let jobs = vec![
            make_job("Job A", &["Alpha"]),
            make_job("Job B", &["Beta"]),
            make_job("Job C", &["Gamma"]),
        ];

        let results = pipeline(provider).batch_match("Alpha Beta", &jobs).await.unwrap();

        let degraded: Vec<bool> = results.iter().map(|r| r.metadata.degraded).collect();
        assert_eq!(degraded, vec![false, true, false]);
        assert_eq!(results[1].score, 30);
    }

    #[tokio::test]
    async fn test_batch_resume_failure_degrades_every_job_with_one_call() {
        let provider = Arc::new(MockProvider::failing());
        let jobs = vec![make_job("A", &["Go"]), make_job("B", &["Go"]), make_job("C", &[])];

        let results = pipeline(provider.clone()).batch_match("Go", &jobs).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.metadata.degraded));
        assert_eq!(provider.embed_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_provider_call_times_out_and_degrades() {
        let provider = Arc::new(MockProvider::new().with_delay(|_| Duration::from_secs(20)));
        let job = make_job("Engineer", &["Python"]);

        let result = pipeline(provider).match_one("Python", &job).await.unwrap();

        assert!(result.metadata.degraded);
        assert!(result.metadata.error.as_deref().unwrap().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_deadline_cancels_in_flight_work() {
        let provider = Arc::new(
            high_similarity_provider()
                .replying("{}")
                .with_delay(|_| Duration::from_secs(10)),
        );
        let mut settings = settings();
        settings.request_deadline = Duration::from_secs(15);
        let job = make_job("Engineer", &["Python"]);

        // embeddings take 10s, the refiner another 10s: the 15s deadline hits mid-refinement
        let result = pipeline_with(provider, settings)
            .match_one("Python", &job)
            .await
            .unwrap();

        assert!(result.metadata.degraded);
        assert!(result.metadata.error.as_deref().unwrap().contains("deadline"));
        assert_eq!(result.score, fallback_score("Python", &job));
    }

    #[tokio::test]
    async fn test_embeddings_are_reused_across_requests() {
        let provider = Arc::new(high_similarity_provider());
        let pipeline = pipeline(provider.clone());
        let jobs = vec![make_job("A", &["Go"])];

        pipeline.batch_match("Go developer", &jobs).await.unwrap();
        pipeline.batch_match("Go developer", &jobs).await.unwrap();

        assert_eq!(provider.embed_calls(), 2);
    }

    #[tokio::test]
    async fn test_reused_job_id_with_new_content_is_embedded_again() {
        let provider = Arc::new(MockProvider::new().with_embed(|text| {
            Ok(if text.contains("Rust") {
                vec![1.0, 0.0]
            } else {
                vec![0.0, 1.0]
            })
        }));
        let pipeline = pipeline(provider.clone());
        let resume = "Rust developer";

        let mut rust_job = make_job("Rust Engineer", &["Rust"]);
        rust_job.id = Some("1".to_string());
        let mut design_job = make_job("Designer", &["Figma"]);
        design_job.id = Some("1".to_string());

        let first = pipeline.batch_match(resume, &[rust_job]).await.unwrap();
        let second = pipeline.batch_match(resume, &[design_job]).await.unwrap();

        assert_eq!(first[0].score, 100);
        assert_eq!(second[0].score, 0);
        assert_eq!(provider.embed_calls(), 3);
    }

    #[tokio::test]
    async fn test_batch_runs_on_a_spawned_task() {
        let pipeline = Arc::new(pipeline(Arc::new(high_similarity_provider())));
        let jobs = vec![make_job("A", &["Go"]), make_job("B", &["Rust"])];

        let results = tokio::spawn(async move {
            pipeline.batch_match("Go and Rust developer", &jobs).await
        })
        .await
        .unwrap()
        .unwrap();

        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_scores_stay_in_range_for_any_vectors() {
        let pairs: Vec<(Vec<f32>, Vec<f32>)> = vec![
            (vec![1.0, 0.0], vec![-1.0, 0.0]),
            (vec![0.0, 0.0], vec![1.0, 1.0]),
            (vec![3.0, 4.0], vec![3.0, 4.0]),
            (vec![1e30, 1e30], vec![1e30, 1e30]),
        ];
        for (resume_vec, job_vec) in pairs {
            let provider = Arc::new(MockProvider::new().with_embed(move |text| {
                Ok(if text.contains("Skills:") { job_vec.clone() } else { resume_vec.clone() })
            }));
            let results = pipeline(provider)
                .batch_match("anything", &[make_job("Role", &["x"])])
                .await
                .unwrap();
            assert!(results[0].score <= 100);
        }
    }

    #[tokio::test]
    async fn test_input_errors_surface_to_caller() {
        let provider = Arc::new(MockProvider::new());
        let pipeline = pipeline(provider.clone());

        let empty_resume = pipeline.match_one("  ", &make_job("A", &[])).await;
        assert_eq!(empty_resume.unwrap_err(), InputError::EmptyResume);

        let jobs = vec![make_job("A", &[]), make_job("", &[])];
        let bad_job = pipeline.batch_match("resume", &jobs).await;
        assert_eq!(bad_job.unwrap_err(), InputError::MissingTitle { index: 1 });

        assert_eq!(provider.embed_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_returns_empty() {
        let provider = Arc::new(MockProvider::new());
        let results = pipeline(provider.clone()).batch_match("resume", &[]).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(provider.embed_calls(), 0);
    }
}
