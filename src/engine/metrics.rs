// Metrics accumulator - rolling per-playbook execution statistics
//
// Two runs of the same playbook can finish at the same time. Updates are
// serialized through a per-playbook lock: read the current playbook, fold
// the run in, write it back, all under the lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::store::PlaybookStore;

pub struct MetricsAccumulator {
    store: Arc<dyn PlaybookStore>,
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl MetricsAccumulator {
    pub fn new(store: Arc<dyn PlaybookStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, playbook_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(playbook_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fold one finished run into the playbook's rolling metrics and persist
    /// them. The read-modify-write is atomic per playbook.
    pub async fn record(
        &self,
        playbook_id: Uuid,
        success: bool,
        duration_seconds: f64,
    ) -> EngineResult<()> {
        let lock = self.lock_for(playbook_id).await;
        let _guard = lock.lock().await;

        let mut playbook = self
            .store
            .get_playbook(playbook_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("playbook {playbook_id}")))?;

        playbook.record_execution(success, duration_seconds);
        self.store.update_playbook_metrics(&playbook).await?;

        info!(
            "recorded {} run for playbook '{}' ({} executions, {:.1}% success)",
            if success { "successful" } else { "failed" },
            playbook.name,
            playbook.execution_count,
            playbook.success_rate()
        );
        Ok(())
    }
}
