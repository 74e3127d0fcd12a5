// Integration dispatch - the single seam between the engine and external tools
//
// Handlers are registered once at process start; the registry itself holds no
// mutable state beyond the capability table.

pub mod slack;
pub mod virustotal;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{EngineError, EngineResult};
use crate::models::Alert;

pub use slack::SlackIntegration;
pub use virustotal::VirusTotalIntegration;

/// The uniform contract every integration action fulfils.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub message: Option<String>,
}

impl ActionResult {
    pub fn success(data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Failures raised inside a handler. The registry converts these into failed
/// [`ActionResult`]s so the engine sees one uniform shape.
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("{0}")]
    Connectivity(String),

    #[error("missing required parameter '{0}'")]
    MissingParam(&'static str),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("unhandled action '{0}'")]
    Unsupported(String),
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        IntegrationError::Connectivity(err.to_string())
    }
}

/// An external security tool reachable through named actions.
///
/// Handlers must not mutate the alert or any persisted state; side effects
/// live entirely in the external calls they make.
#[async_trait]
pub trait IntegrationHandler: Send + Sync {
    /// Registry key, e.g. `virustotal`.
    fn name(&self) -> &'static str;

    /// Actions this integration exposes to playbook steps.
    fn actions(&self) -> &'static [&'static str];

    /// Run one action against the alert with the step's rendered parameters.
    async fn execute(
        &self,
        action: &str,
        alert: &Alert,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<serde_json::Value, IntegrationError>;
}

/// Capability table mapping integration names to handlers.
#[derive(Default, Clone)]
pub struct IntegrationRegistry {
    handlers: HashMap<String, Arc<dyn IntegrationHandler>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from configuration, registering every integration
    /// that has credentials.
    pub fn from_config(config: &Config) -> Self {
        let mut registry = Self::new();
        if config.virustotal.is_configured() {
            registry.register(Arc::new(VirusTotalIntegration::new(&config.virustotal.api_key)));
        }
        if config.slack.is_configured() {
            registry.register(Arc::new(SlackIntegration::new(
                &config.slack.webhook_url,
                &config.slack.default_channel,
            )));
        }
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn IntegrationHandler>) {
        let name = handler.name().to_ascii_lowercase();
        info!("registered integration '{}' with actions {:?}", name, handler.actions());
        self.handlers.insert(name, handler);
    }

    pub fn with(mut self, handler: Arc<dyn IntegrationHandler>) -> Self {
        self.register(handler);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(&name.to_ascii_lowercase())
    }

    /// Route an action to its handler.
    ///
    /// Unknown integration or action names are validation errors. Handler
    /// failures are wrapped into a failed [`ActionResult`] instead of
    /// propagating, so the engine can uniformly decide stop-vs-continue.
    pub async fn dispatch(
        &self,
        integration: &str,
        action: &str,
        alert: &Alert,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> EngineResult<ActionResult> {
        let handler = self
            .handlers
            .get(&integration.to_ascii_lowercase())
            .ok_or_else(|| {
                EngineError::Validation(format!("integration '{integration}' is not registered"))
            })?;

        if !handler.actions().contains(&action) {
            return Err(EngineError::Validation(format!(
                "action '{action}' is not defined for integration '{integration}'"
            )));
        }

        match handler.execute(action, alert, params).await {
            Ok(data) => Ok(ActionResult::success(Some(data))),
            Err(err) => {
                error!("integration call to {integration}.{action} failed: {err}");
                Ok(ActionResult::failure(err.to_string()))
            }
        }
    }
}
