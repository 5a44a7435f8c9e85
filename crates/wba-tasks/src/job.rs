//! Job definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::AuthHeaders;
use crate::routes::{JobKind, TaskEndpoints};

/// Backend task handle (`task_id`)
pub type JobId = String;

/// One submitted unit of backend work
#[derive(Debug, Clone)]
pub struct Job {
    id: JobId,
    kind: JobKind,
    submitted_at: DateTime<Utc>,
    endpoints: TaskEndpoints,
    headers: AuthHeaders,
    initial_status: QueueStatus,
}

impl Job {
    pub fn new(id: impl Into<JobId>, kind: JobKind, endpoints: TaskEndpoints, headers: AuthHeaders) -> Self {
        Self {
            id: id.into(),
            kind,
            submitted_at: Utc::now(),
            endpoints,
            headers,
            initial_status: QueueStatus::default(),
        }
    }

    /// Seed the queue snapshot reported by the submit call
    pub fn with_initial_status(mut self, status: QueueStatus) -> Self {
        self.initial_status = status;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &JobKind {
        &self.kind
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn headers(&self) -> &AuthHeaders {
        &self.headers
    }

    pub fn initial_status(&self) -> &QueueStatus {
        &self.initial_status
    }

    pub fn queue_url(&self) -> String {
        self.endpoints.queue_url(&self.id)
    }

    pub fn result_url(&self) -> String {
        self.endpoints.result_url(&self.id)
    }
}

/// Snapshot of a job's place in the backend queue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Position in the queue, `None` when not queued or unknown
    pub position: Option<u32>,
    /// Expedited lane
    pub is_priority: bool,
    /// Lane label reported by the backend
    pub queue: Option<String>,
}

impl QueueStatus {
    /// Apply a partial update. Fields missing from `update` keep their last known value.
    pub fn merge(&mut self, update: QueueUpdate) {
        if let Some(position) = update.position {
            self.position = Some(position);
        }
        if let Some(queue) = update.queue {
            self.queue = Some(queue);
        }
        match update.is_priority {
            Some(flag) => self.is_priority = flag,
            None => {
                if self.queue.as_deref() == Some("priority") {
                    self.is_priority = true;
                }
            }
        }
    }
}

/// Partial queue information from a single response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueUpdate {
    pub position: Option<u32>,
    pub is_priority: Option<bool>,
    pub queue: Option<String>,
}

impl QueueUpdate {
    pub fn is_empty(&self) -> bool {
        self.position.is_none() && self.is_priority.is_none() && self.queue.is_none()
    }
}

/// Terminal result of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Backend-defined result object
    Success { payload: serde_json::Value },
    /// The job ran and the backend reported an error
    Failure { reason: String },
    /// Attempt budget exhausted without a terminal status
    TimedOut,
    /// Caller stopped observing the job
    Cancelled,
}

impl JobOutcome {
    pub fn success(payload: serde_json::Value) -> Self {
        Self::Success { payload }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Failure { .. } => "failure",
            Self::TimedOut => "timed_out",
            Self::Cancelled => "cancelled",
        }
    }
}
