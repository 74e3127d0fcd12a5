use std::env;

/// Engine configuration, read from the environment with workable defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of concurrent run workers.
    pub worker_count: usize,
    /// Bound on queued run requests before enqueueing blocks.
    pub queue_depth: usize,
    pub virustotal: VirusTotalConfig,
    pub slack: SlackConfig,
}

#[derive(Debug, Clone)]
pub struct VirusTotalConfig {
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub webhook_url: String,
    pub default_channel: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            worker_count: env::var("SOAR_WORKER_COUNT")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            queue_depth: env::var("SOAR_QUEUE_DEPTH")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .unwrap_or(64),
            virustotal: VirusTotalConfig {
                api_key: env::var("VIRUSTOTAL_API_KEY").unwrap_or_default(),
            },
            slack: SlackConfig {
                webhook_url: env::var("SLACK_WEBHOOK_URL").unwrap_or_default(),
                default_channel: env::var("SLACK_DEFAULT_CHANNEL")
                    .unwrap_or_else(|_| "#security-alerts".to_string()),
            },
        })
    }
}

impl VirusTotalConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl SlackConfig {
    pub fn is_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }
}
