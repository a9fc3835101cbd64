//! Fallback scoring. Deterministic keyword overlap, no provider calls.
//!
//! This is the terminal degrade path for the match pipeline: it cannot fail and
//! always produces a score in 0..=100.
//!
//! Algorithm:
//! 1. skill_ratio = |job skills found in resume| / |job skills|  (0 when the job lists none)
//!    case-insensitive substring containment, not token equality
//! 2. title_bonus = 20 when the job title appears in the resume
//! 3. score = min(100, round(skill_ratio × 60 + title_bonus))

use crate::models::job::JobPosting;
use crate::models::matching::MatchExplanation;

const SKILL_WEIGHT: f32 = 60.0;
const TITLE_BONUS: f32 = 20.0;

/// Job skills that occur (case-insensitively) in the resume, in job order.
/// Blank skill strings never match.
pub fn matching_skills(resume_text: &str, skills: &[String]) -> Vec<String> {
    let resume_lower = resume_text.to_lowercase();
    skills
        .iter()
        .filter(|skill| {
            let skill = skill.trim();
            !skill.is_empty() && resume_lower.contains(&skill.to_lowercase())
        })
        .cloned()
        .collect()
}

/// Keyword-overlap score for `job` against `resume_text`.
pub fn fallback_score(resume_text: &str, job: &JobPosting) -> u8 {
    let matched = matching_skills(resume_text, &job.skills).len();

    let skill_ratio = if job.skills.is_empty() {
        0.0
    } else {
        matched as f32 / job.skills.len() as f32
    };

    let title = job.title.trim().to_lowercase();
    let title_bonus = if !title.is_empty() && resume_text.to_lowercase().contains(&title) {
        TITLE_BONUS
    } else {
        0.0
    };

    (skill_ratio * SKILL_WEIGHT + title_bonus).round().min(100.0) as u8
}

/// Placeholder explanation used whenever model output is unavailable.
pub fn placeholder_explanation(resume_text: &str, job: &JobPosting) -> MatchExplanation {
    let matching_skills = matching_skills(resume_text, &job.skills);
    let keyword_alignment = format!(
        "{} of {} listed skills appear in the resume.",
        matching_skills.len(),
        job.skills.len()
    );

    MatchExplanation {
        matching_skills,
        relevant_experience: "Detailed experience analysis is currently unavailable.".to_string(),
        keyword_alignment,
        reasoning: "Score estimated from keyword overlap because semantic analysis was unavailable."
            .to_string(),
    }
}
