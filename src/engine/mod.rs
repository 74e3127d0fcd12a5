// Playbook Execution Engine
//
// Trigger evaluation, step orchestration, execution bookkeeping and the
// worker pool that runs playbooks off the alert-ingestion path.

pub mod dispatcher;
pub mod executor;
pub mod metrics;
pub mod triggers;
pub mod worker;

pub use dispatcher::{AlertEvent, AutoTriggerDispatcher};
pub use executor::ExecutionEngine;
pub use metrics::MetricsAccumulator;
pub use triggers::TriggerEvaluator;
pub use worker::{RunQueue, RunRequest, WorkerPool};
