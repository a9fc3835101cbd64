use serde::{Deserialize, Serialize};

use crate::errors::InputError;

/// A job posting as supplied by the calling layer.
///
/// `skills` is required on the wire; an absent list is a caller bug, not an empty list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub description: String,
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl JobPosting {
    /// Checks the structural contract. `index` is the posting's position in a batch.
    pub fn validate(&self, index: usize) -> Result<(), InputError> {
        if self.title.trim().is_empty() {
            return Err(InputError::MissingTitle { index });
        }
        Ok(())
    }

    /// Text sent to the embedding provider for this posting.
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.title.trim().to_string()];
        if let Some(company) = self.company.as_deref().filter(|c| !c.trim().is_empty()) {
            parts.push(company.trim().to_string());
        }
        if let Some(location) = self.location.as_deref().filter(|l| !l.trim().is_empty()) {
            parts.push(format!("Location: {}", location.trim()));
        }
        if !self.description.trim().is_empty() {
            parts.push(self.description.trim().to_string());
        }
        if !self.skills.is_empty() {
            parts.push(format!("Skills: {}", self.skills.join(", ")));
        }
        parts.join("\n")
    }
}

pub fn validate_resume(resume_text: &str) -> Result<(), InputError> {
    if resume_text.trim().is_empty() {
        return Err(InputError::EmptyResume);
    }
    Ok(())
}

#[cfg(test)]
pub fn make_job(title: &str, skills: &[&str]) -> JobPosting {
    JobPosting {
        id: None,
        title: title.to_string(),
        company: Some("Acme".to_string()),
        description: format!("We are hiring a {title}."),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        location: None,
    }
}
