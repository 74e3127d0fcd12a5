// Severity scale shared by trigger evaluation and alert escalation

use serde::{Deserialize, Serialize};

/// The total order over alert severities: `low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const SCALE: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];

    /// Parse a severity label, case-insensitively. Unknown labels yield `None`.
    pub fn parse(label: &str) -> Option<Severity> {
        match label.to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Numeric rank of a label: `low` = 1 through `critical` = 4.
    /// Unrecognized labels rank 0, below every real severity.
    pub fn rank(label: &str) -> u8 {
        Severity::parse(label).map(|s| s as u8 + 1).unwrap_or(0)
    }

    /// The label one rung up the scale. `critical` saturates; an unknown
    /// label escalates straight to `critical`.
    pub fn escalated(label: &str) -> &'static str {
        match Severity::parse(label) {
            Some(Severity::Low) => "medium",
            Some(Severity::Medium) => "high",
            Some(Severity::High) | Some(Severity::Critical) | None => "critical",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
