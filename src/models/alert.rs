// Alert model - security alerts reported by external sources

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Severity;

/// Lifecycle status of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    Investigating,
    Resolved,
    Closed,
    FalsePositive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::Investigating => "investigating",
            AlertStatus::Resolved => "resolved",
            AlertStatus::Closed => "closed",
            AlertStatus::FalsePositive => "false_positive",
        }
    }
}

/// A reported security event.
///
/// Alerts are owned by the persistence collaborator; the engine only reads
/// them. Severity is kept as the raw label from the reporting source, ranked
/// through [`Severity`] wherever ordering matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub severity: String,
    pub status: AlertStatus,
    /// Reporting system, e.g. SIEM, EDR, Firewall.
    pub source: String,
    /// Alert id in the external system.
    pub source_id: Option<String>,
    pub ip_address: Option<String>,
    pub hostname: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn new(title: &str, severity: &str, source: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: None,
            severity: severity.to_string(),
            status: AlertStatus::Open,
            source: source.to_string(),
            source_id: None,
            ip_address: None,
            hostname: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
            closed_at: None,
        }
    }

    pub fn with_ip_address(mut self, ip: &str) -> Self {
        self.ip_address = Some(ip.to_string());
        self
    }

    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.hostname = Some(hostname.to_string());
        self
    }

    pub fn is_critical(&self) -> bool {
        self.severity.eq_ignore_ascii_case("critical")
    }

    pub fn is_open(&self) -> bool {
        self.status == AlertStatus::Open
    }

    /// Move the alert to a new status; resolving or closing stamps `closed_at`.
    pub fn update_status(&mut self, status: AlertStatus) {
        self.status = status;
        self.updated_at = Some(Utc::now());

        if matches!(status, AlertStatus::Resolved | AlertStatus::Closed) {
            self.closed_at = Some(Utc::now());
        }
    }

    /// Bump severity one rung up the scale. `critical` stays `critical`.
    pub fn escalate_severity(&mut self) {
        self.severity = Severity::escalated(&self.severity).to_string();
        self.updated_at = Some(Utc::now());
    }

    pub fn add_tag(&mut self, tag: &str) {
        if !self.tags.iter().any(|t| t == tag) {
            self.tags.push(tag.to_string());
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }
}
