// In-memory store backed by RwLock maps

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlaybookStore, StoreError};
use crate::models::{Alert, ExecutionLog, Playbook};

/// Map-backed [`PlaybookStore`] for tests and embedded deployments.
#[derive(Default)]
pub struct InMemoryStore {
    alerts: RwLock<HashMap<Uuid, Alert>>,
    playbooks: RwLock<HashMap<Uuid, Playbook>>,
    execution_logs: RwLock<HashMap<Uuid, ExecutionLog>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_alert(&self, alert: Alert) {
        self.alerts.write().await.insert(alert.id, alert);
    }

    pub async fn insert_playbook(&self, playbook: Playbook) {
        self.playbooks.write().await.insert(playbook.id, playbook);
    }

    pub async fn execution_log(&self, id: Uuid) -> Option<ExecutionLog> {
        self.execution_logs.read().await.get(&id).cloned()
    }

    /// Logs for one playbook, newest first.
    pub async fn execution_logs_for_playbook(&self, playbook_id: Uuid) -> Vec<ExecutionLog> {
        let mut logs: Vec<ExecutionLog> = self
            .execution_logs
            .read()
            .await
            .values()
            .filter(|log| log.playbook_id == playbook_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        logs
    }

    pub async fn execution_log_count(&self) -> usize {
        self.execution_logs.read().await.len()
    }
}

#[async_trait]
impl PlaybookStore for InMemoryStore {
    async fn get_alert(&self, id: Uuid) -> Result<Option<Alert>, StoreError> {
        Ok(self.alerts.read().await.get(&id).cloned())
    }

    async fn get_playbook(&self, id: Uuid) -> Result<Option<Playbook>, StoreError> {
        Ok(self.playbooks.read().await.get(&id).cloned())
    }

    async fn save_execution_log(&self, log: &ExecutionLog) -> Result<(), StoreError> {
        self.execution_logs
            .write()
            .await
            .insert(log.id, log.clone());
        Ok(())
    }

    async fn update_playbook_metrics(&self, playbook: &Playbook) -> Result<(), StoreError> {
        self.playbooks
            .write()
            .await
            .insert(playbook.id, playbook.clone());
        Ok(())
    }

    async fn list_active_playbooks(&self) -> Result<Vec<Playbook>, StoreError> {
        Ok(self
            .playbooks
            .read()
            .await
            .values()
            .filter(|p| p.active && p.auto_trigger)
            .cloned()
            .collect())
    }
}
