// Error taxonomy for the playbook execution engine

use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the engine and its collaborators.
///
/// Step-level failures do not appear here: they are converted into a terminal
/// `failed` ExecutionLog by the engine. Only run-setup and infrastructure
/// errors propagate to the caller of `run`.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An alert or playbook id did not resolve. Fatal to the run; no
    /// ExecutionLog is produced.
    #[error("{0} not found")]
    NotFound(String),

    /// Malformed playbook, or dispatch to an unregistered integration/action.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An integration handler's external call failed.
    #[error("integration call failed: {0}")]
    Connectivity(String),

    /// The whole run exceeded the playbook's `timeout_seconds`.
    #[error("execution timed out after {0} seconds")]
    Timeout(u64),

    /// Persistence collaborator failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// The run queue has been shut down and accepts no further requests.
    #[error("run queue is closed")]
    QueueClosed,
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failure() {
        let err = EngineError::NotFound("playbook 42".into());
        assert_eq!(err.to_string(), "playbook 42 not found");

        let err = EngineError::Timeout(300);
        assert_eq!(err.to_string(), "execution timed out after 300 seconds");
    }

    #[test]
    fn store_errors_convert() {
        let err: EngineError = StoreError::Unavailable("connection refused".into()).into();
        assert!(matches!(err, EngineError::Storage(_)));
    }
}
