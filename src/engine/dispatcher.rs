// Auto-trigger dispatcher - reacts to alert lifecycle events

use std::sync::Arc;

use tracing::{error, info};

use super::{RunQueue, TriggerEvaluator};
use crate::error::EngineResult;
use crate::models::Alert;
use crate::store::PlaybookStore;

/// Alert lifecycle events that can auto-fire playbooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertEvent {
    Created,
    Escalated,
}

/// Listens for alert lifecycle events, filters the active playbooks through
/// the trigger evaluator and enqueues one run per match.
///
/// Matched playbooks run independently: a playbook that fails to enqueue (or
/// later fails to run) never blocks the others.
pub struct AutoTriggerDispatcher {
    store: Arc<dyn PlaybookStore>,
    evaluator: TriggerEvaluator,
    queue: RunQueue,
}

impl AutoTriggerDispatcher {
    pub fn new(store: Arc<dyn PlaybookStore>, queue: RunQueue) -> Self {
        Self {
            store,
            evaluator: TriggerEvaluator::new(),
            queue,
        }
    }

    /// Notification hook invoked by the alert-lifecycle collaborator on
    /// creation and escalation. Returns how many playbook runs were enqueued.
    pub async fn on_alert_event(&self, alert: &Alert, event: AlertEvent) -> EngineResult<usize> {
        let playbooks = self.store.list_active_playbooks().await?;
        let mut enqueued = 0;

        for playbook in &playbooks {
            if !self.evaluator.matches(playbook, alert) {
                continue;
            }

            info!(
                "auto-triggering playbook '{}' for {:?} alert {}",
                playbook.name, event, alert.id
            );
            match self.queue.enqueue(playbook.id, alert.id).await {
                Ok(()) => enqueued += 1,
                Err(err) => {
                    // Isolate per-playbook failures; the rest still fire.
                    error!(
                        "failed to enqueue playbook '{}' for alert {}: {err}",
                        playbook.name, alert.id
                    );
                }
            }
        }

        if enqueued == 0 {
            info!("no playbooks matched {:?} alert {}", event, alert.id);
        }
        Ok(enqueued)
    }
}
