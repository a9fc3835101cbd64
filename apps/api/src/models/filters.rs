//! The shared job-filter object the assistant steers.

use serde::ser::SerializeMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatePosted {
    #[serde(rename = "any")]
    Any,
    #[serde(rename = "24h", alias = "past_24h", alias = "today")]
    Past24Hours,
    #[serde(rename = "week", alias = "past_week", alias = "7d")]
    PastWeek,
    #[serde(rename = "month", alias = "past_month", alias = "30d")]
    PastMonth,
}

impl DatePosted {
    pub fn label(self) -> &'static str {
        match self {
            DatePosted::Any => "any time",
            DatePosted::Past24Hours => "past 24 hours",
            DatePosted::PastWeek => "past week",
            DatePosted::PastMonth => "past month",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    #[serde(alias = "fulltime", alias = "full_time")]
    FullTime,
    #[serde(alias = "parttime", alias = "part_time")]
    PartTime,
    Contract,
    #[serde(alias = "intern")]
    Internship,
}

impl JobType {
    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Internship => "internship",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkMode {
    Remote,
    Hybrid,
    #[serde(alias = "onsite", alias = "on_site", alias = "in-office")]
    OnSite,
}

impl WorkMode {
    pub fn label(self) -> &'static str {
        match self {
            WorkMode::Remote => "remote",
            WorkMode::Hybrid => "hybrid",
            WorkMode::OnSite => "on-site",
        }
    }
}

/// Minimum match-score band shown in the job list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScoreFilter {
    #[serde(alias = "all")]
    Any,
    High,
    Medium,
    Low,
}

impl MatchScoreFilter {
    pub fn label(self) -> &'static str {
        match self {
            MatchScoreFilter::Any => "any",
            MatchScoreFilter::High => "high (70+)",
            MatchScoreFilter::Medium => "medium (40-69)",
            MatchScoreFilter::Low => "low (below 40)",
        }
    }
}

/// A partial filter delta. `None` means "leave this filter alone".
///
/// Keys the service understands get typed fields. Every other key, and any known
/// key whose value is not one it understands, is kept in `extra` and serialized
/// unchanged for the consumer to use or ignore.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_posted: Option<DatePosted>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_mode: Option<WorkMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<MatchScoreFilter>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FilterChanges {
    /// Splits a model-produced object into typed known keys and pass-through extras.
    ///
    /// `reset` belongs to the parser and is skipped. Null and blank values carry
    /// no change and are dropped.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut changes = FilterChanges::default();
        for (key, value) in object {
            if key == "reset" || is_blank(value) {
                continue;
            }
            let typed = match key.as_str() {
                "role" => set(&mut changes.role, text_value(value)),
                "skills" => set(&mut changes.skills, skills_value(value)),
                "datePosted" => set(&mut changes.date_posted, enum_value(value)),
                "jobType" => set(&mut changes.job_type, enum_value(value)),
                "workMode" => set(&mut changes.work_mode, enum_value(value)),
                "location" => set(&mut changes.location, text_value(value)),
                "matchScore" => set(&mut changes.match_score, enum_value(value)),
                _ => false,
            };
            if !typed {
                changes.extra.insert(key.clone(), value.clone());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        *self == FilterChanges::default()
    }
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    let present = value.is_some();
    if present {
        *slot = value;
    }
    present
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn text_value(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn skills_value(value: &Value) -> Option<Vec<String>> {
    let skills: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(text_value).collect(),
        Value::String(_) => text_value(value).into_iter().collect(),
        _ => return None,
    };
    (!skills.is_empty()).then_some(skills)
}

fn enum_value<T: DeserializeOwned>(value: &Value) -> Option<T> {
    let normalized = value.as_str()?.trim().to_lowercase();
    serde_json::from_value(Value::String(normalized)).ok()
}

/// Result of turning a chat message into a filter instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterUpdate {
    Changes(FilterChanges),
    /// Clear every filter.
    Reset,
    Error(String),
}

impl Serialize for FilterUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FilterUpdate::Changes(changes) => changes.serialize(serializer),
            FilterUpdate::Reset => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("reset", &true)?;
                map.end()
            }
            FilterUpdate::Error(message) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", message)?;
                map.end()
            }
        }
    }
}
