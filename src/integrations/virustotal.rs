// VirusTotal integration - IP and file-hash reputation lookups

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tracing::info;

use super::{IntegrationError, IntegrationHandler};
use crate::models::Alert;

const BASE_URL: &str = "https://www.virustotal.com/api/v3";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// VirusTotal v3 API client exposing reputation lookups as playbook actions.
pub struct VirusTotalIntegration {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl VirusTotalIntegration {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_key: api_key.to_string(),
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint. Used by tests.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn vt_get(&self, endpoint: &str) -> Result<Value, IntegrationError> {
        if self.api_key.is_empty() {
            return Err(IntegrationError::NotConfigured("VirusTotal API key"));
        }

        let url = format!("{}{}", self.base_url, endpoint);
        let response = self
            .client
            .get(&url)
            .header("x-apikey", &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("unknown VirusTotal error")
                .to_string();
            return Err(IntegrationError::Connectivity(format!(
                "VirusTotal API call failed ({status}): {message}"
            )));
        }

        Ok(response.json().await?)
    }

    async fn query_ip_address(
        &self,
        alert: &Alert,
        params: &Map<String, Value>,
    ) -> Result<Value, IntegrationError> {
        // Explicit param wins; otherwise take the address off the alert.
        let ip = params
            .get("ip_address")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| alert.ip_address.clone())
            .ok_or(IntegrationError::MissingParam("ip_address"))?;

        info!("querying VirusTotal for IP {ip}");
        let body = self.vt_get(&format!("/ip_addresses/{ip}")).await?;
        let attributes = &body["data"]["attributes"];

        Ok(json!({
            "ip_address": ip,
            "owner_country": attributes["country"],
            "malicious_detections": attributes["last_analysis_stats"]["malicious"].as_u64().unwrap_or(0),
            "last_analysis_date": attributes["last_analysis_date"],
            "reputation": attributes["reputation"],
        }))
    }

    async fn query_file_hash(
        &self,
        params: &Map<String, Value>,
    ) -> Result<Value, IntegrationError> {
        let hash = params
            .get("file_hash")
            .or_else(|| params.get("hash"))
            .and_then(Value::as_str)
            .ok_or(IntegrationError::MissingParam("file_hash"))?;

        info!("querying VirusTotal for hash {hash}");
        let body = self.vt_get(&format!("/files/{hash}")).await?;
        let attributes = &body["data"]["attributes"];

        Ok(json!({
            "hash": hash,
            "type": attributes["type_tag"],
            "size": attributes["size"],
            "malicious_detections": attributes["last_analysis_stats"]["malicious"].as_u64().unwrap_or(0),
        }))
    }
}

#[async_trait]
impl IntegrationHandler for VirusTotalIntegration {
    fn name(&self) -> &'static str {
        "virustotal"
    }

    fn actions(&self) -> &'static [&'static str] {
        &["query_ip_address", "query_file_hash"]
    }

    async fn execute(
        &self,
        action: &str,
        alert: &Alert,
        params: &Map<String, Value>,
    ) -> Result<Value, IntegrationError> {
        match action {
            "query_ip_address" => self.query_ip_address(alert, params).await,
            "query_file_hash" => self.query_file_hash(params).await,
            other => Err(IntegrationError::Unsupported(other.to_string())),
        }
    }
}
