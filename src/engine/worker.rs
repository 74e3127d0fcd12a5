// Run queue and worker pool - bounded concurrency for playbook runs
//
// Run requests are enqueued by the auto-trigger dispatcher (or any caller
// wanting non-blocking execution) and consumed by a fixed set of workers;
// alert ingestion never waits on external calls.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use super::ExecutionEngine;
use crate::error::{EngineError, EngineResult};

/// One queued request to run a playbook against an alert.
#[derive(Debug, Clone, Copy)]
pub struct RunRequest {
    pub playbook_id: Uuid,
    pub alert_id: Uuid,
}

/// Sending half of the run queue. Cheap to clone; dropping every clone shuts
/// the worker pool down once the queue drains.
#[derive(Clone)]
pub struct RunQueue {
    tx: mpsc::Sender<RunRequest>,
}

impl RunQueue {
    pub async fn enqueue(&self, playbook_id: Uuid, alert_id: Uuid) -> EngineResult<()> {
        self.tx
            .send(RunRequest {
                playbook_id,
                alert_id,
            })
            .await
            .map_err(|_| EngineError::QueueClosed)
    }
}

/// A fixed set of workers draining the run queue.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks sharing one bounded queue of `queue_depth`
    /// requests. Each worker runs playbooks to completion one at a time;
    /// failures are logged and isolated to the run that caused them.
    pub fn spawn(
        engine: Arc<ExecutionEngine>,
        workers: usize,
        queue_depth: usize,
    ) -> (RunQueue, WorkerPool) {
        let (tx, rx) = mpsc::channel::<RunRequest>(queue_depth.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let engine = engine.clone();
                let rx = rx.clone();
                tokio::spawn(async move {
                    loop {
                        let request = { rx.lock().await.recv().await };
                        let Some(request) = request else {
                            break;
                        };

                        match engine.run(request.playbook_id, request.alert_id).await {
                            Ok(log) => info!(
                                "worker {worker_id}: run {} finished with status {:?}",
                                log.id, log.status
                            ),
                            Err(err) => error!(
                                "worker {worker_id}: run of playbook {} for alert {} never started: {err}",
                                request.playbook_id, request.alert_id
                            ),
                        }
                    }
                })
            })
            .collect();

        (RunQueue { tx }, WorkerPool { handles })
    }

    /// Wait for every worker to exit. Workers exit once all [`RunQueue`]
    /// clones are dropped and the queue is drained.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::IntegrationRegistry;
    use crate::models::{Alert, ExecutionStatus, Playbook, Step};
    use crate::store::{InMemoryStore, PlaybookStore};
    use crate::tests::fixtures::{HandlerBehavior, ScriptedHandler};

    #[tokio::test]
    async fn queued_runs_execute_to_completion() {
        let handler = ScriptedHandler::new("tool", &["act"], HandlerBehavior::Succeed);
        let registry = IntegrationRegistry::new().with(handler.clone());

        let store = Arc::new(InMemoryStore::new());
        let playbook = Playbook::new("Queued", vec![Step::new(1, "tool", "act")]);
        let playbook_id = playbook.id;
        store.insert_playbook(playbook).await;

        let mut alert_ids = Vec::new();
        for i in 0..5 {
            let alert = Alert::new(&format!("Alert {i}"), "high", "EDR");
            alert_ids.push(alert.id);
            store.insert_alert(alert).await;
        }

        let engine = Arc::new(ExecutionEngine::new(store.clone(), registry));
        let (queue, pool) = WorkerPool::spawn(engine, 2, 16);

        for alert_id in alert_ids {
            queue.enqueue(playbook_id, alert_id).await.unwrap();
        }
        drop(queue);
        pool.join().await;

        assert_eq!(handler.calls(), 5);
        assert_eq!(store.execution_log_count().await, 5);
        let playbook = store.get_playbook(playbook_id).await.unwrap().unwrap();
        assert_eq!(playbook.execution_count, 5);
        assert_eq!(playbook.success_count, 5);

        let logs = store.execution_logs_for_playbook(playbook_id).await;
        assert!(logs.iter().all(|l| l.status == ExecutionStatus::Completed));
    }

    #[tokio::test]
    async fn failed_setup_does_not_kill_the_worker() {
        let handler = ScriptedHandler::new("tool", &["act"], HandlerBehavior::Succeed);
        let registry = IntegrationRegistry::new().with(handler.clone());

        let store = Arc::new(InMemoryStore::new());
        let playbook = Playbook::new("Survivor", vec![Step::new(1, "tool", "act")]);
        let playbook_id = playbook.id;
        store.insert_playbook(playbook).await;
        let alert = Alert::new("Real alert", "high", "EDR");
        let alert_id = alert.id;
        store.insert_alert(alert).await;

        let engine = Arc::new(ExecutionEngine::new(store.clone(), registry));
        let (queue, pool) = WorkerPool::spawn(engine, 1, 16);

        // A request for a missing alert errors, then the next request runs.
        queue.enqueue(playbook_id, Uuid::new_v4()).await.unwrap();
        queue.enqueue(playbook_id, alert_id).await.unwrap();
        drop(queue);
        pool.join().await;

        assert_eq!(handler.calls(), 1);
        assert_eq!(store.execution_log_count().await, 1);
    }

    #[tokio::test]
    async fn enqueue_fails_once_the_pool_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let queue = RunQueue { tx };

        let err = queue.enqueue(Uuid::new_v4(), Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, EngineError::QueueClosed));
    }
}
