//! Playbook execution engine for automated security-incident response.
//!
//! Given a security alert, the engine decides which playbooks apply, runs
//! each playbook's ordered steps against external security tools through a
//! uniform integration registry, and records a durable audit trail plus
//! rolling per-playbook metrics.
//!
//! Persistence and the concrete alert lifecycle live behind the
//! [`store::PlaybookStore`] seam; external tools live behind
//! [`integrations::IntegrationHandler`]. Both are injected at construction,
//! so the engine itself holds no process-wide state.

pub mod config;
pub mod engine;
pub mod error;
pub mod integrations;
pub mod models;
pub mod store;

pub use config::Config;
pub use engine::{
    AlertEvent, AutoTriggerDispatcher, ExecutionEngine, MetricsAccumulator, RunQueue,
    TriggerEvaluator, WorkerPool,
};
pub use error::{EngineError, EngineResult};
pub use integrations::{ActionResult, IntegrationHandler, IntegrationRegistry};
pub use models::{Alert, AlertStatus, ExecutionLog, ExecutionStatus, Playbook, Severity, Step};
pub use store::{InMemoryStore, PlaybookStore, StoreError};

#[cfg(test)]
mod tests;
