use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Agent record name for the orchestration phases themselves.
pub const MASTER_AGENT: &str = "Master Agent";
/// Agent record name for the clinical trials worker.
pub const CLINICAL_TRIALS_AGENT: &str = "Clinical Trials Agent";
/// Agent record name for the patent worker.
pub const PATENT_AGENT: &str = "Patent Agent";
/// Agent record name for the literature worker.
pub const LITERATURE_AGENT: &str = "Literature Agent";

/// Per-source display cap applied when the final [`JobResult`] is assembled.
pub const RESULT_DISPLAY_LIMIT: usize = 15;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryRequest {
    /// Free-text pharmaceutical query, 10-500 characters.
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

// ============= Job Types =============

/// Overall job execution status.
///
/// Moves forward only: `Queued -> Running -> {Completed | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Status of a single agent record within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Running,
    Completed,
    Failed,
}

impl AgentStatus {
    /// Completed and Failed are terminal for worker records.
    pub fn is_terminal(self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Failed)
    }
}

/// Execution record for one worker (or the master orchestration phases).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentRecord {
    pub name: String,
    pub status: AgentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub result_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentRecord {
    pub fn idle(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: AgentStatus::Idle,
            start_time: None,
            end_time: None,
            result_count: 0,
            error: None,
        }
    }
}

/// One user query's end-to-end processing unit.
///
/// Owned exclusively by the [`JobStore`](crate::store::JobStore); the
/// orchestrator run for this job is the only writer. `progress` is
/// monotonically non-decreasing over the job's life.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Job {
    pub job_id: Uuid,
    pub query: String,
    pub status: JobStatus,
    pub agents: Vec<AgentRecord>,
    /// Percentage in [0, 100].
    pub progress: u8,
    /// Set when the job as a whole failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Fresh job: generated id, all agent records idle, status queued,
    /// progress zero. The master record always comes first.
    pub fn new(query: &str) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4(),
            query: query.to_string(),
            status: JobStatus::Queued,
            agents: vec![
                AgentRecord::idle(MASTER_AGENT),
                AgentRecord::idle(CLINICAL_TRIALS_AGENT),
                AgentRecord::idle(PATENT_AGENT),
                AgentRecord::idle(LITERATURE_AGENT),
            ],
            progress: 0,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn agent(&self, name: &str) -> Option<&AgentRecord> {
        self.agents.iter().find(|a| a.name == name)
    }
}

// ============= Worker Result Types =============

/// Structured clinical trial data from ClinicalTrials.gov.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClinicalTrial {
    pub nct_id: String,
    pub title: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    pub condition: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sponsor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enrollment: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Provenance: link back to ClinicalTrials.gov.
    pub source_url: String,
    pub retrieved_at: DateTime<Utc>,
    /// Relevance match score 0-1 against the normalized query.
    pub match_score: f32,
    #[serde(default)]
    pub matched_terms: Vec<String>,
}

/// Patent record from the aggregated free patent sources.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Patent {
    pub patent_id: String,
    pub title: String,
    pub assignee: String,
    pub filing_date: String,
    pub status: String,
    pub source_url: String,
    pub retrieved_at: DateTime<Utc>,
    pub match_score: f32,
    #[serde(default)]
    pub matched_terms: Vec<String>,
}

/// Scientific literature record from Europe PMC.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Publication {
    pub source: String,
    pub title: String,
    pub url: String,
    pub snippet: String,
    /// Citation-derived relevance 0-1.
    pub relevance_score: f32,
    pub retrieved_at: DateTime<Utc>,
    #[serde(default)]
    pub matched_terms: Vec<String>,
}

/// Competitive-landscape summary derived from the clinical trial set.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompetitionAnalysis {
    /// low / medium / high, or unknown when no trials were retrieved.
    pub competition_level: String,
    pub active_trials: usize,
    pub total_trials: usize,
    #[serde(default)]
    pub phase_distribution: std::collections::HashMap<String, usize>,
}

/// Qualitative confidence bucket for an aggregate result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::High => write!(f, "High"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::Low => write!(f, "Low"),
        }
    }
}

/// Final aggregate for a completed job.
///
/// Created once at completion and immutable thereafter; persisted in a slot
/// separate from the live [`Job`] record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobResult {
    pub job_id: Uuid,
    pub query: String,
    pub status: JobStatus,
    pub executive_summary: String,
    /// Ordered findings; the first always states confidence and sample sizes.
    pub key_findings: Vec<String>,
    pub clinical_trials: Vec<ClinicalTrial>,
    pub patents: Vec<Patent>,
    pub publications: Vec<Publication>,
    pub competition_analysis: CompetitionAnalysis,
    /// Overall analysis confidence 0-1.
    pub confidence_score: f32,
    pub confidence_level: ConfidenceLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

// ============= Event Types =============

/// Notification kind published on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    JobStarted,
    AgentUpdate,
    JobCompleted,
    JobFailed,
}

/// Typed event payload, serialized by content so the wire shape stays a
/// flat object per event type.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EventPayload {
    Agent {
        agent: String,
        status: AgentStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        result_count: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Started {
        query: String,
    },
    Completed {
        report_url: String,
    },
    Failed {
        error: String,
    },
}

/// Ephemeral state-change notification for one job.
///
/// Delivered at most once to subscribers live at emission time; never
/// persisted, never replayed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub job_id: Uuid,
    pub event_type: EventType,
    pub payload: EventPayload,
    pub timestamp: DateTime<Utc>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not ready: {0}")]
    NotReady(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Domain failure inside a search worker; isolated by the orchestrator
    /// into a failed agent record, never aborts the job.
    #[error("Worker error: {0}")]
    Worker(String),

    /// Failure in a normalization/synthesis/report collaborator; aborts the
    /// whole job.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (axum::http::StatusCode::NOT_FOUND, msg),
            AppError::NotReady(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::InvalidInput(msg) => (axum::http::StatusCode::BAD_REQUEST, msg),
            AppError::Worker(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Collaborator(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Store(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
