// Persistence seam - the narrow interface the engine consumes

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Alert, ExecutionLog, Playbook};

pub use memory::InMemoryStore;

/// Failure of the persistence collaborator. The engine never swallows these;
/// they surface as fatal run errors and abort any pending metrics update.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("stored record could not be decoded: {0}")]
    Corrupt(String),
}

/// Entity storage consumed by the engine.
///
/// Implemented once per backing store and injected at construction. Lookups
/// return `Ok(None)` for missing ids; the engine turns that into its own
/// not-found error so stores never need to know about run semantics.
#[async_trait]
pub trait PlaybookStore: Send + Sync {
    async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>, StoreError>;

    async fn get_playbook(&self, id: Uuid) -> Result<Option<Playbook>, StoreError>;

    /// Insert or overwrite an execution log. Called once when a run becomes
    /// observable and once when it finalizes.
    async fn save_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError>;

    /// Persist a playbook's rolling metrics fields.
    async fn update_playbook_metrics(&self, playbook: &Playbook) -> Result<(), StoreError>;

    /// Playbooks eligible for auto-triggering: `active` and `auto_trigger` set.
    async fn list_active_playbooks(&self) -> Result<Vec<Playbook>, StoreError>;
}
