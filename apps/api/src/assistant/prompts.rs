// All LLM prompt constants for the assistant module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System framing for intent classification. The reply is validated against a closed set.
pub const INTENT_SYSTEM: &str = "You are an intent classifier for a job search assistant. \
    Reply with exactly one label from the list you are given, in lowercase, \
    with no punctuation, quotes or explanation.";

/// Intent prompt template. The user message goes last so it cannot rewrite the rules.
pub const INTENT_PROMPT_TEMPLATE: &str = r#"Classify the user's message into one of these labels:

filter_update - the user wants to change which jobs are shown (role, skills, date posted,
                job type, work mode, location, match score) or to clear filters
job_search    - the user asks for advice on finding or choosing jobs
help          - the user asks how to use this assistant or the job board
general       - anything else

User message:
{query}"#;

/// System framing for filter extraction. JSON-only output is appended at call time.
pub const FILTER_SYSTEM: &str = "You translate job search requests into filter changes \
    for a job board. Only emit keys the user actually asked to change.";

/// Filter extraction prompt template with few-shot examples pinning the output shape.
pub const FILTER_PROMPT_TEMPLATE: &str = r#"Convert the request into a JSON object containing ONLY the filters to change.

Allowed keys and values:
- "role": free text job title
- "skills": array of skill names
- "datePosted": one of "any", "24h", "week", "month"
- "jobType": one of "full-time", "part-time", "contract", "internship"
- "workMode": one of "remote", "hybrid", "on-site"
- "location": free text city, region or country
- "matchScore": one of "any", "high", "medium", "low"
To clear every filter return {"reset": true}.

Examples:
Request: show remote jobs
Output: {"workMode": "remote"}

Request: clear filters
Output: {"reset": true}

Request: Full-time jobs in San Francisco
Output: {"jobType": "full-time", "location": "San Francisco"}

Request: React or TypeScript roles posted this week
Output: {"skills": ["React", "TypeScript"], "datePosted": "week"}

Request: senior data engineer positions where I'm a strong match
Output: {"role": "Senior Data Engineer", "matchScore": "high"}

Request: {query}
Output:"#;

/// Shared framing for the free-form guidance handlers.
const GUIDANCE_BASE: &str = "You are a friendly assistant inside a job search app. \
    Users can rank job postings against their resume and change the job list filters \
    by chatting. Keep answers under 120 words and do not invent job listings.";

pub fn job_search_system() -> String {
    format!(
        "{GUIDANCE_BASE} The user wants job search advice: suggest concrete next steps, \
        roles or search terms that fit what they said."
    )
}

pub fn help_system() -> String {
    format!(
        "{GUIDANCE_BASE} The user needs help using the app. Explain that they can upload a resume \
        to see match scores, open a job for a detailed match explanation, and type requests \
        such as \"show remote jobs\" or \"clear filters\" to change the list."
    )
}

pub fn general_system() -> String {
    format!("{GUIDANCE_BASE} Answer the user helpfully and steer back to their job search.")
}

/// Guidance prompt template.
pub const GUIDANCE_PROMPT_TEMPLATE: &str = r#"Conversation so far:
{history}

User: {message}"#;
