// End-to-end flows: alert event -> dispatcher -> worker pool -> engine

use std::sync::Arc;

use serde_json::json;

use crate::engine::{AlertEvent, AutoTriggerDispatcher, ExecutionEngine, WorkerPool};
use crate::integrations::IntegrationRegistry;
use crate::models::{Alert, ExecutionStatus, Playbook, Step};
use crate::store::{InMemoryStore, PlaybookStore};
use crate::tests::fixtures::{HandlerBehavior, ScriptedHandler};

fn triage_playbook() -> Playbook {
    Playbook::new(
        "Critical EDR triage",
        vec![
            Step::new(1, "virustotal", "query_ip_address")
                .with_param("ip_address", json!("{{alert.ip_address}}")),
            Step::new(2, "slack", "notify_team")
                .with_param("message", json!("Critical alert: {{alert.title}}")),
        ],
    )
    .auto_triggered()
    .with_severity_requirement("high")
    .with_trigger_condition("source:EDR AND severity:critical")
}

#[tokio::test]
async fn critical_alert_runs_the_matching_playbook_to_completion() {
    let virustotal = ScriptedHandler::new(
        "virustotal",
        &["query_ip_address", "query_file_hash"],
        HandlerBehavior::Succeed,
    );
    let slack = ScriptedHandler::new(
        "slack",
        &["notify_team", "create_incident_channel"],
        HandlerBehavior::Succeed,
    );
    let registry = IntegrationRegistry::new()
        .with(virustotal.clone())
        .with(slack.clone());

    let store = Arc::new(InMemoryStore::new());
    let playbook = triage_playbook();
    let playbook_id = playbook.id;
    store.insert_playbook(playbook).await;

    let alert = Alert::new("C2 beaconing detected", "critical", "EDR")
        .with_ip_address("203.0.113.7");
    store.insert_alert(alert.clone()).await;

    let engine = Arc::new(ExecutionEngine::new(store.clone(), registry));
    let (queue, pool) = WorkerPool::spawn(engine, 2, 16);
    let dispatcher = AutoTriggerDispatcher::new(store.clone(), queue);

    let enqueued = dispatcher
        .on_alert_event(&alert, AlertEvent::Created)
        .await
        .unwrap();
    assert_eq!(enqueued, 1);

    drop(dispatcher);
    pool.join().await;

    assert_eq!(virustotal.calls(), 1);
    assert_eq!(slack.calls(), 1);

    let logs = store.execution_logs_for_playbook(playbook_id).await;
    assert_eq!(logs.len(), 1);
    let log = &logs[0];
    assert_eq!(log.status, ExecutionStatus::Completed);
    assert_eq!(log.alert_id, Some(alert.id));
    assert_eq!(log.steps.len(), 2);
    // Step params were rendered against the alert before dispatch.
    assert_eq!(
        log.steps[0].output.as_ref().unwrap()["params"]["ip_address"],
        "203.0.113.7"
    );
    assert_eq!(
        log.steps[1].output.as_ref().unwrap()["params"]["message"],
        "Critical alert: C2 beaconing detected"
    );

    let playbook = store.get_playbook(playbook_id).await.unwrap().unwrap();
    assert_eq!(playbook.execution_count, 1);
    assert_eq!(playbook.success_count, 1);
    assert_eq!(playbook.success_rate(), 100.0);
    assert!(playbook.last_executed_at.is_some());
}

#[tokio::test]
async fn one_broken_playbook_does_not_block_the_others() {
    let notify = ScriptedHandler::new("notify", &["post"], HandlerBehavior::Succeed);
    let edr = ScriptedHandler::new("edr", &["isolate_host"], HandlerBehavior::Fail("agent offline"));
    let registry = IntegrationRegistry::new().with(notify.clone()).with(edr);

    let store = Arc::new(InMemoryStore::new());
    let healthy = Playbook::new("notify team", vec![Step::new(1, "notify", "post")])
        .auto_triggered();
    let broken = Playbook::new("isolate host", vec![Step::new(1, "edr", "isolate_host")])
        .auto_triggered()
        .with_retries(0);
    let (healthy_id, broken_id) = (healthy.id, broken.id);
    store.insert_playbook(healthy).await;
    store.insert_playbook(broken).await;

    let alert = Alert::new("Ransomware note found", "critical", "EDR");
    store.insert_alert(alert.clone()).await;

    let engine = Arc::new(ExecutionEngine::new(store.clone(), registry));
    let (queue, pool) = WorkerPool::spawn(engine, 2, 16);
    let dispatcher = AutoTriggerDispatcher::new(store.clone(), queue);

    let enqueued = dispatcher
        .on_alert_event(&alert, AlertEvent::Created)
        .await
        .unwrap();
    assert_eq!(enqueued, 2);

    drop(dispatcher);
    pool.join().await;

    let healthy_logs = store.execution_logs_for_playbook(healthy_id).await;
    assert_eq!(healthy_logs.len(), 1);
    assert_eq!(healthy_logs[0].status, ExecutionStatus::Completed);

    let broken_logs = store.execution_logs_for_playbook(broken_id).await;
    assert_eq!(broken_logs.len(), 1);
    assert_eq!(broken_logs[0].status, ExecutionStatus::Failed);

    let broken = store.get_playbook(broken_id).await.unwrap().unwrap();
    assert_eq!(broken.failure_count, 1);
    assert_eq!(broken.success_rate(), 0.0);
}

#[tokio::test]
async fn repeated_runs_produce_distinct_audit_records() {
    let notify = ScriptedHandler::new("notify", &["post"], HandlerBehavior::Succeed);
    let registry = IntegrationRegistry::new().with(notify);

    let store = Arc::new(InMemoryStore::new());
    let playbook = Playbook::new("notify team", vec![Step::new(1, "notify", "post")]);
    let playbook_id = playbook.id;
    store.insert_playbook(playbook).await;
    let alert = Alert::new("Repeated offender", "high", "SIEM");
    let alert_id = alert.id;
    store.insert_alert(alert).await;

    let engine = ExecutionEngine::new(store.clone(), registry);

    // No de-duplication fingerprint: the same playbook/alert pair yields an
    // independent audit record per invocation.
    let first = engine.run(playbook_id, alert_id).await.unwrap();
    let second = engine.run(playbook_id, alert_id).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(store.execution_log_count().await, 2);

    let playbook = store.get_playbook(playbook_id).await.unwrap().unwrap();
    assert_eq!(playbook.execution_count, 2);
}
