// Slack integration - incident notifications via incoming webhook

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::info;

use super::{IntegrationError, IntegrationHandler};
use crate::models::Alert;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack incoming-webhook client exposing notification actions to playbooks.
pub struct SlackIntegration {
    client: reqwest::Client,
    webhook_url: String,
    default_channel: String,
}

impl SlackIntegration {
    pub fn new(webhook_url: &str, default_channel: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            webhook_url: webhook_url.to_string(),
            default_channel: default_channel.to_string(),
        }
    }

    async fn post_message(&self, channel: &str, text: &str) -> Result<(), IntegrationError> {
        if self.webhook_url.is_empty() {
            return Err(IntegrationError::NotConfigured("Slack webhook URL"));
        }

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntegrationError::Connectivity(format!(
                "Slack webhook returned {status}"
            )));
        }
        Ok(())
    }

    async fn notify_team(
        &self,
        params: &Map<String, Value>,
    ) -> Result<Value, IntegrationError> {
        let message = params
            .get("message")
            .and_then(Value::as_str)
            .ok_or(IntegrationError::MissingParam("message"))?;
        let channel = params
            .get("channel")
            .and_then(Value::as_str)
            .unwrap_or(&self.default_channel);

        info!("notifying {channel} via Slack");
        self.post_message(channel, message).await?;

        Ok(json!({ "channel": channel, "delivered": true }))
    }

    /// Announce a dedicated investigation channel for the alert. The channel
    /// name is derived from severity and alert id, one name per alert.
    async fn create_incident_channel(&self, alert: &Alert) -> Result<Value, IntegrationError> {
        let channel_name = format!("inc-{}-{}", alert.severity.to_ascii_lowercase(), alert.id);
        let announcement = format!(
            "Incident channel #{channel_name} opened for alert '{}' ({} via {})",
            alert.title, alert.severity, alert.source
        );

        self.post_message(&self.default_channel, &announcement).await?;

        Ok(json!({ "channel_name": channel_name }))
    }
}

#[async_trait]
impl IntegrationHandler for SlackIntegration {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn actions(&self) -> &'static [&'static str] {
        &["notify_team", "create_incident_channel"]
    }

    async fn execute(
        &self,
        action: &str,
        alert: &Alert,
        params: &Map<String, Value>,
    ) -> Result<Value, IntegrationError> {
        match action {
            "notify_team" => self.notify_team(params).await,
            "create_incident_channel" => self.create_incident_channel(alert).await,
            other => Err(IntegrationError::Unsupported(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn alert() -> Alert {
        Alert::new("Credential stuffing", "critical", "WAF")
    }

    #[tokio::test]
    async fn notify_team_posts_to_the_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(json!({
                "channel": "#soc-critical",
                "text": "New critical alert"
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let slack = SlackIntegration::new(&format!("{}/hook", server.uri()), "#security-alerts");
        let mut params = Map::new();
        params.insert("message".into(), json!("New critical alert"));
        params.insert("channel".into(), json!("#soc-critical"));

        let result = slack.execute("notify_team", &alert(), &params).await.unwrap();
        assert_eq!(result["channel"], "#soc-critical");
        assert_eq!(result["delivered"], true);
    }

    #[tokio::test]
    async fn notify_team_falls_back_to_the_default_channel() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "channel": "#security-alerts" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let slack = SlackIntegration::new(&server.uri(), "#security-alerts");
        let mut params = Map::new();
        params.insert("message".into(), json!("heads up"));

        slack.execute("notify_team", &alert(), &params).await.unwrap();
    }

    #[tokio::test]
    async fn incident_channel_name_derives_from_the_alert() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let slack = SlackIntegration::new(&server.uri(), "#security-alerts");
        let alert = alert();
        let result = slack
            .execute("create_incident_channel", &alert, &Map::new())
            .await
            .unwrap();

        let name = result["channel_name"].as_str().unwrap();
        assert_eq!(name, format!("inc-critical-{}", alert.id));
    }

    #[tokio::test]
    async fn webhook_failure_is_a_connectivity_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let slack = SlackIntegration::new(&server.uri(), "#security-alerts");
        let mut params = Map::new();
        params.insert("message".into(), json!("will not arrive"));

        let err = slack.execute("notify_team", &alert(), &params).await.unwrap_err();
        assert!(matches!(err, IntegrationError::Connectivity(_)));
    }

    #[tokio::test]
    async fn missing_message_is_reported() {
        let slack = SlackIntegration::new("https://hooks.example.com/x", "#security-alerts");
        let err = slack
            .execute("notify_team", &alert(), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::MissingParam("message")));
    }
}
