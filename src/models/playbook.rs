// Playbook model - named, ordered automation workflows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// One action within a playbook, naming an integration and the action to
/// perform with parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Position within the playbook, 1-based. Unique per playbook.
    pub order: u32,
    /// Handler name exposed by the integration, e.g. `query_ip_address`.
    pub action: String,
    /// Registry key of the integration, e.g. `virustotal`.
    pub integration: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Step {
    pub fn new(order: u32, integration: &str, action: &str) -> Self {
        Self {
            order,
            action: action.to_string(),
            integration: integration.to_string(),
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: &str, value: serde_json::Value) -> Self {
        self.params.insert(key.to_string(), value);
        self
    }
}

/// A named automation workflow with trigger configuration, ordered steps and
/// rolling execution metrics.
///
/// Metrics fields are mutated only by the metrics accumulator, which serializes
/// updates per playbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playbook {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub auto_trigger: bool,
    /// Textual predicate over alert fields, e.g. `source:EDR AND severity:critical`.
    pub trigger_condition: Option<String>,
    /// Minimum alert severity for auto-triggering.
    pub severity_requirement: Option<String>,
    pub steps: Vec<Step>,
    pub timeout_seconds: u64,
    pub retry_on_failure: bool,
    pub max_retries: u32,
    /// Classification, e.g. malware, phishing, network.
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_executed_at: Option<DateTime<Utc>>,
    pub execution_count: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Incremental mean of run durations, in seconds.
    pub avg_execution_time: Option<f64>,
}

impl Playbook {
    pub fn new(name: &str, steps: Vec<Step>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            active: true,
            auto_trigger: false,
            trigger_condition: None,
            severity_requirement: None,
            steps,
            timeout_seconds: 300,
            retry_on_failure: true,
            max_retries: 3,
            category: None,
            created_at: Utc::now(),
            updated_at: None,
            last_executed_at: None,
            execution_count: 0,
            success_count: 0,
            failure_count: 0,
            avg_execution_time: None,
        }
    }

    pub fn auto_triggered(mut self) -> Self {
        self.auto_trigger = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn with_trigger_condition(mut self, condition: &str) -> Self {
        self.trigger_condition = Some(condition.to_string());
        self
    }

    pub fn with_severity_requirement(mut self, severity: &str) -> Self {
        self.severity_requirement = Some(severity.to_string());
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.retry_on_failure = max_retries > 0;
        self.max_retries = max_retries;
        self
    }

    /// Check the structural invariants of the step list: at least one step,
    /// no duplicate or zero `order` values, and a named action and integration
    /// on every step.
    pub fn validate_steps(&self) -> Result<(), EngineError> {
        if self.steps.is_empty() {
            return Err(EngineError::Validation(format!(
                "playbook '{}' must have at least one step",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if step.order == 0 {
                return Err(EngineError::Validation(format!(
                    "playbook '{}' has a step with order 0; orders are 1-based",
                    self.name
                )));
            }
            if !seen.insert(step.order) {
                return Err(EngineError::Validation(format!(
                    "playbook '{}' has duplicate step order {}",
                    self.name, step.order
                )));
            }
            if step.action.is_empty() {
                return Err(EngineError::Validation(format!(
                    "playbook '{}' step {} is missing an action",
                    self.name, step.order
                )));
            }
            if step.integration.is_empty() {
                return Err(EngineError::Validation(format!(
                    "playbook '{}' step {} is missing an integration",
                    self.name, step.order
                )));
            }
        }

        Ok(())
    }

    /// Steps sorted ascending by `order`. Storage order is not trusted.
    pub fn steps_in_order(&self) -> Vec<&Step> {
        let mut steps: Vec<&Step> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.order);
        steps
    }

    /// Fold one finished run into the rolling metrics.
    pub fn record_execution(&mut self, success: bool, duration_seconds: f64) {
        self.execution_count += 1;
        if success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }

        self.avg_execution_time = Some(match self.avg_execution_time {
            None => duration_seconds,
            Some(avg) => {
                let n = self.execution_count as f64;
                (avg * (n - 1.0) + duration_seconds) / n
            }
        });

        self.last_executed_at = Some(Utc::now());
        self.updated_at = Some(Utc::now());
    }

    /// Success percentage over all recorded runs, rounded to two decimals.
    /// `0.0` when nothing has run yet.
    pub fn success_rate(&self) -> f64 {
        if self.execution_count == 0 {
            return 0.0;
        }
        let rate = self.success_count as f64 / self.execution_count as f64 * 100.0;
        (rate * 100.0).round() / 100.0
    }
}
