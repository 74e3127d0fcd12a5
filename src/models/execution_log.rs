// Execution log - the audit record of one playbook run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// State machine for a single run.
///
/// `Pending` -> `Running` -> `Completed` | `Failed`. The terminal states are
/// final; a finalized log is an audit record and is never edited again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Outcome of one step within a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub order: u32,
    pub action: String,
    pub integration: String,
    pub success: bool,
    /// Dispatch attempts including retries.
    pub attempts: u32,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
    pub duration_ms: i64,
}

/// Audit record of one playbook run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: Uuid,
    pub playbook_id: Uuid,
    pub alert_id: Option<Uuid>,
    pub status: ExecutionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub steps: Vec<StepRecord>,
}

impl ExecutionLog {
    pub fn new(playbook_id: Uuid, alert_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            playbook_id,
            alert_id,
            status: ExecutionStatus::Pending,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
            steps: Vec::new(),
        }
    }

    /// `Pending` -> `Running`, stamping `started_at`.
    pub fn start(&mut self) {
        if self.status != ExecutionStatus::Pending {
            warn!("ignoring start() on execution log {} in state {:?}", self.id, self.status);
            return;
        }
        self.status = ExecutionStatus::Running;
        self.started_at = Utc::now();
    }

    /// `Running` -> `Completed`.
    pub fn complete(&mut self) {
        if self.status != ExecutionStatus::Running {
            warn!("ignoring complete() on execution log {} in state {:?}", self.id, self.status);
            return;
        }
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// `Running` -> `Failed` with the failure's message.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status != ExecutionStatus::Running {
            warn!("ignoring fail() on execution log {} in state {:?}", self.id, self.status);
            return;
        }
        self.status = ExecutionStatus::Failed;
        self.error_message = Some(message.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn record_step(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.status, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}
