//! Webhook notifier
//!
//! POSTs a summarized result to an IFTTT-style maker webhook. Throughput is
//! reported in Mbps rounded to two decimals; latency passes through as
//! measured.

use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::models::SpeedTestResult;
use crate::publish::Notifier;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Timeout for the webhook POST
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP notifier for the outbound webhook
pub struct WebhookNotifier {
    client: Client,
    endpoint: String,
    logger: Logger,
}

impl WebhookNotifier {
    /// Create a notifier for the given host and key
    pub fn new(host: &str, key: &str, logger: &Logger) -> Result<Self> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .user_agent(concat!("speedtest-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/trigger/speedtest/with/key/{}",
                host.trim_end_matches('/'),
                key
            ),
            logger: logger.named("webhook"),
        })
    }

    /// Build the webhook payload for one result
    pub fn build_payload(result: &SpeedTestResult) -> serde_json::Value {
        serde_json::json!({
            "value1": result.latency_ms,
            "value2": result.download_mbps(),
            "value3": result.upload_mbps(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, result: &SpeedTestResult) -> Result<()> {
        let payload = Self::build_payload(result);
        self.logger.debug(&format!("Webhook payload: {}", payload));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::notify(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::notify(format!("HTTP {}", response.status())));
        }

        Ok(())
    }
}
