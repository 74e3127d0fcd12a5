// Execution engine - runs a playbook's steps in order against an alert
//
// Failure policy: stop on the first failed step; remaining steps never run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::MetricsAccumulator;
use crate::error::{EngineError, EngineResult};
use crate::integrations::IntegrationRegistry;
use crate::models::{Alert, ExecutionLog, ExecutionStatus, Playbook, StepRecord};
use crate::store::PlaybookStore;

pub struct ExecutionEngine {
    store: Arc<dyn PlaybookStore>,
    registry: IntegrationRegistry,
    metrics: MetricsAccumulator,
}

impl ExecutionEngine {
    pub fn new(store: Arc<dyn PlaybookStore>, registry: IntegrationRegistry) -> Self {
        let metrics = MetricsAccumulator::new(store.clone());
        Self {
            store,
            registry,
            metrics,
        }
    }

    /// Execute a playbook against an alert and return the finalized audit
    /// record.
    ///
    /// A missing playbook or alert is fatal: the run never starts and no
    /// ExecutionLog is produced. Once the log exists, every step-level
    /// failure (including a whole-run timeout) finalizes it as `failed`
    /// instead of propagating. Storage failures always propagate.
    pub async fn run(&self, playbook_id: Uuid, alert_id: Uuid) -> EngineResult<ExecutionLog> {
        let playbook = self
            .store
            .get_playbook(playbook_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("playbook {playbook_id}")))?;
        let alert = self
            .store
            .get_alert(alert_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("alert {alert_id}")))?;

        info!(
            "starting execution of playbook '{}' for alert {}",
            playbook.name, alert.id
        );

        let mut log = ExecutionLog::new(playbook.id, Some(alert.id));
        log.start();
        // Persist immediately so the run is observable before it finishes.
        self.store.save_execution_log(&log).await?;

        let started = Instant::now();

        let failure = if let Err(err) = playbook.validate_steps() {
            Some(err.to_string())
        } else {
            let deadline = Duration::from_secs(playbook.timeout_seconds);
            match tokio::time::timeout(deadline, self.run_steps(&playbook, &alert, &mut log)).await
            {
                Ok(Ok(())) => None,
                Ok(Err(message)) => Some(message),
                Err(_) => {
                    error!(
                        "playbook '{}' exceeded its {}s timeout, abandoning the in-flight step",
                        playbook.name, playbook.timeout_seconds
                    );
                    Some(EngineError::Timeout(playbook.timeout_seconds).to_string())
                }
            }
        };

        match failure {
            None => log.complete(),
            Some(message) => log.fail(message),
        }
        self.store.save_execution_log(&log).await?;

        let duration = started.elapsed().as_secs_f64();
        let success = log.status == ExecutionStatus::Completed;
        self.metrics.record(playbook.id, success, duration).await?;

        info!(
            "playbook '{}' finished in {:.2}s with status {:?}",
            playbook.name, duration, log.status
        );
        Ok(log)
    }

    /// Run every step in order, recording each outcome on the log. Returns
    /// the failure message of the first broken step, after which no further
    /// steps execute.
    async fn run_steps(
        &self,
        playbook: &Playbook,
        alert: &Alert,
        log: &mut ExecutionLog,
    ) -> Result<(), String> {
        for step in playbook.steps_in_order() {
            info!(
                "step {}: executing action '{}' on '{}'",
                step.order, step.action, step.integration
            );
            let params = render_params(&step.params, alert);
            let started = Instant::now();

            let mut attempts: u32 = 0;
            let outcome = loop {
                attempts += 1;
                match self
                    .registry
                    .dispatch(&step.integration, &step.action, alert, &params)
                    .await
                {
                    Ok(result) if result.success => break Ok(result),
                    Ok(result) => {
                        let message = result
                            .message
                            .unwrap_or_else(|| "unknown integration error".to_string());
                        if playbook.retry_on_failure && attempts <= playbook.max_retries {
                            warn!(
                                "step {} failed ({message}), retrying ({attempts}/{})",
                                step.order, playbook.max_retries
                            );
                            continue;
                        }
                        break Err(message);
                    }
                    // Unregistered integration or action: retrying cannot help.
                    Err(err) => break Err(err.to_string()),
                }
            };
            let duration_ms = started.elapsed().as_millis() as i64;

            match outcome {
                Ok(result) => {
                    log.record_step(StepRecord {
                        order: step.order,
                        action: step.action.clone(),
                        integration: step.integration.clone(),
                        success: true,
                        attempts,
                        output: result.data,
                        error: None,
                        duration_ms,
                    });
                    info!("step {} completed successfully", step.order);
                }
                Err(message) => {
                    log.record_step(StepRecord {
                        order: step.order,
                        action: step.action.clone(),
                        integration: step.integration.clone(),
                        success: false,
                        attempts,
                        output: None,
                        error: Some(message.clone()),
                        duration_ms,
                    });
                    error!("step {} failed: {message}", step.order);
                    return Err(format!("Step {} failed: {message}", step.order));
                }
            }
        }

        Ok(())
    }
}

/// Resolve `{{alert.<field>}}` placeholders in step parameters against the
/// triggering alert. Objects and arrays are rendered recursively; placeholders
/// that name nothing are left verbatim.
fn render_params(params: &Map<String, Value>, alert: &Alert) -> Map<String, Value> {
    params
        .iter()
        .map(|(key, value)| (key.clone(), render_value(value, alert)))
        .collect()
}

fn render_value(value: &Value, alert: &Alert) -> Value {
    match value {
        Value::String(s) => Value::String(render_template(s, alert)),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_value(v, alert)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| render_value(v, alert)).collect()),
        other => other.clone(),
    }
}

fn render_template(template: &str, alert: &Alert) -> String {
    let re = regex::Regex::new(r"\{\{\s*([a-z_.]+)\s*\}\}").unwrap();
    let mut result = template.to_string();

    for cap in re.captures_iter(template) {
        if let Some(value) = alert_field(&cap[1], alert) {
            result = result.replace(&cap[0], &value);
        }
    }

    result
}

fn alert_field(path: &str, alert: &Alert) -> Option<String> {
    match path {
        "alert.id" => Some(alert.id.to_string()),
        "alert.title" => Some(alert.title.clone()),
        "alert.severity" => Some(alert.severity.clone()),
        "alert.status" => Some(alert.status.as_str().to_string()),
        "alert.source" => Some(alert.source.clone()),
        "alert.ip_address" => alert.ip_address.clone(),
        "alert.hostname" => alert.hostname.clone(),
        _ => None,
    }
}
