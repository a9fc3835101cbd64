//! Axum route handlers for the Match API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::job::JobPosting;
use crate::models::matching::MatchResult;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub resume_text: String,
    pub job: JobPosting,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchMatchRequest {
    pub resume_text: String,
    pub jobs: Vec<JobPosting>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMatch {
    /// Position of the job in the request.
    pub job_index: usize,
    pub job_id: Option<String>,
    pub result: MatchResult,
}

#[derive(Debug, Serialize)]
pub struct BatchMatchResponse {
    pub matches: Vec<RankedMatch>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/match
///
/// Detailed match of one resume against one job, with a model-written explanation.
pub async fn handle_match_one(
    State(state): State<AppState>,
    Json(request): Json<MatchRequest>,
) -> Result<Json<MatchResult>, AppError> {
    let result = state
        .pipeline
        .match_one(&request.resume_text, &request.job)
        .await?;
    Ok(Json(result))
}

/// POST /api/v1/match/batch
///
/// Fast match of one resume against many jobs, ranked by descending score.
pub async fn handle_match_all(
    State(state): State<AppState>,
    Json(request): Json<BatchMatchRequest>,
) -> Result<Json<BatchMatchResponse>, AppError> {
    let results = state
        .pipeline
        .batch_match(&request.resume_text, &request.jobs)
        .await?;

    let matches = rank_by_score(
        request
            .jobs
            .into_iter()
            .zip(results)
            .enumerate()
            .map(|(job_index, (job, result))| RankedMatch {
                job_index,
                job_id: job.id,
                result,
            })
            .collect(),
    );

    Ok(Json(BatchMatchResponse { matches }))
}

/// Presentation order: highest score first, ties keep request order.
fn rank_by_score(mut matches: Vec<RankedMatch>) -> Vec<RankedMatch> {
    matches.sort_by(|a, b| b.result.score.cmp(&a.result.score));
    matches
}
