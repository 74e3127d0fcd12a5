// Trigger evaluation - decides whether a playbook fires for an alert
//
// Evaluation is fail-closed: unknown severities rank below every requirement
// and unparseable trigger conditions never match.

use tracing::debug;

use crate::models::{Alert, Playbook, Severity};

/// One `key:value` clause of a trigger condition.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    Source(String),
    Severity(String),
}

impl Clause {
    fn holds(&self, alert: &Alert) -> bool {
        match self {
            Clause::Source(value) => alert.source.eq_ignore_ascii_case(value),
            Clause::Severity(value) => alert.severity.eq_ignore_ascii_case(value),
        }
    }
}

/// Parse a trigger condition as a conjunction of `key:value` clauses, e.g.
/// `source:EDR AND severity:critical`. `AND` separators are optional noise;
/// any token that is not a recognized clause makes the whole condition
/// unparseable.
fn parse_condition(condition: &str) -> Option<Vec<Clause>> {
    let mut clauses = Vec::new();

    for token in condition.split_whitespace() {
        if token.eq_ignore_ascii_case("and") {
            continue;
        }

        let (key, value) = token.split_once(':')?;
        if value.is_empty() {
            return None;
        }

        match key.to_ascii_lowercase().as_str() {
            "source" => clauses.push(Clause::Source(value.to_string())),
            "severity" => clauses.push(Clause::Severity(value.to_string())),
            _ => return None,
        }
    }

    Some(clauses)
}

/// Decides whether a playbook should auto-fire for a given alert.
///
/// Pure over its inputs: the same playbook and alert snapshot always produce
/// the same answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TriggerEvaluator;

impl TriggerEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn matches(&self, playbook: &Playbook, alert: &Alert) -> bool {
        if !playbook.active || !playbook.auto_trigger {
            return false;
        }

        if let Some(requirement) = &playbook.severity_requirement {
            if Severity::rank(&alert.severity) < Severity::rank(requirement) {
                debug!(
                    "playbook '{}' requires severity {requirement}, alert is {}",
                    playbook.name, alert.severity
                );
                return false;
            }
        }

        if let Some(condition) = playbook.trigger_condition.as_deref() {
            if !condition.trim().is_empty() {
                let Some(clauses) = parse_condition(condition) else {
                    debug!(
                        "playbook '{}' has unparseable trigger condition '{condition}'",
                        playbook.name
                    );
                    return false;
                };
                if !clauses.iter().all(|c| c.holds(alert)) {
                    return false;
                }
            }
        }

        true
    }
}
