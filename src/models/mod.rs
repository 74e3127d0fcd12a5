// Domain models for the incident-response engine

pub mod alert;
pub mod execution_log;
pub mod playbook;
pub mod severity;

pub use alert::{Alert, AlertStatus};
pub use execution_log::{ExecutionLog, ExecutionStatus, StepRecord};
pub use playbook::{Playbook, Step};
pub use severity::Severity;
