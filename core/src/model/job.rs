use crate::model::Detection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle reported by the remote service: `queued → processing → completed | failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[serde(alias = "pending")]
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    Single,
    Batch,
    Tracking,
    #[serde(other)]
    Other,
}

impl std::str::FromStr for AnalysisType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "single" => Ok(AnalysisType::Single),
            "batch" => Ok(AnalysisType::Batch),
            "tracking" => Ok(AnalysisType::Tracking),
            other => Err(format!("unknown analysis type '{other}'")),
        }
    }
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub file_ids: Vec<String>,
    pub analysis_type: AnalysisType,
}

/// A server-tracked unit of analysis work over one or more files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub file_ids: Vec<String>,
    pub analysis_type: AnalysisType,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Option<Vec<Detection>>,
}

impl Job {
    /// Enforces "results present iff completed" on a payload from the wire.
    pub fn normalized(mut self) -> Self {
        match self.status {
            JobStatus::Completed => {
                if self.results.is_none() {
                    self.results = Some(Vec::new());
                }
            }
            _ => self.results = None,
        }
        self
    }

    pub fn detections(&self) -> Option<&[Detection]> {
        match self.status {
            JobStatus::Completed => self.results.as_deref(),
            _ => None,
        }
    }
}
