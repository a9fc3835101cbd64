// All LLM prompt constants for the matching module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System framing for match explanations. JSON-only output is appended at call time.
pub const EXPLANATION_SYSTEM: &str = "You are an expert technical recruiter. \
    You compare a candidate's resume with a job posting and explain the fit \
    honestly and concisely, citing only evidence present in the resume.";

/// Explanation prompt template. Placeholders are filled via `llm_client::prompts::fill`.
pub const EXPLANATION_PROMPT_TEMPLATE: &str = r#"Compare the resume with the job posting below.

An embedding model rated their semantic similarity at {base_score}/100. You may adjust
that score if the evidence clearly supports a different value.

JOB TITLE: {job_title}
COMPANY: {company}
REQUIRED SKILLS: {skills}
JOB DESCRIPTION:
{description}

RESUME (may be truncated):
{resume}

Return a JSON object with this EXACT schema (no extra fields):
{
  "matchingSkills": ["skills from the job that the resume demonstrates"],
  "relevantExperience": "one or two sentences on the most relevant experience",
  "keywordAlignment": "one sentence on how well the resume's vocabulary matches the posting",
  "adjustedScore": 0-100 integer,
  "reasoning": "two or three sentences justifying the score"
}"#;
