use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::shared::config::Config;
use crate::shared::error::FeedError;

/// Tunneling proxies serve an interstitial warning page unless asked
/// not to; this is an operational concern of the deployment, not part
/// of the webhook protocol.
const TUNNEL_SKIP_HEADER: (&str, &str) = ("ngrok-skip-browser-warning", "true");

/// Status update body. Field names are fixed by the webhook contract.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusUpdate {
    pub order_id: String,
    pub new_status: String,
    pub updated_by: String,
    pub timestamp: String,
}

/// Seam between the polling logic and the network, so the worker can be
/// exercised without a webhook on the other end.
#[async_trait]
pub trait OrderFeedApi: Send + Sync {
    /// Fetch the raw order feed. Shape interpretation is the
    /// normalizer's job; this only guarantees valid JSON.
    async fn fetch_feed(&self) -> Result<Value, FeedError>;

    /// Send a status update to the write endpoint
    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), FeedError>;
}

/// HTTP client for the order webhook pair
pub struct WebhookClient {
    client: reqwest::Client,
    orders_url: String,
    update_url: String,
    fetch_attempts: u32,
    fetch_retry_delay: std::time::Duration,
}

impl WebhookClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            orders_url: config.webhook.orders_url.clone(),
            update_url: config.webhook.update_url.clone(),
            fetch_attempts: config.polling.max_retry_attempts.max(1),
            fetch_retry_delay: std::time::Duration::from_millis(config.polling.retry_delay_ms),
        }
    }
}

#[async_trait]
impl OrderFeedApi for WebhookClient {
    async fn fetch_feed(&self) -> Result<Value, FeedError> {
        // Bounded retry within a single fetch. Only transport failures
        // are retried here; an HTTP error status is a server answer.
        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            match self
                .client
                .get(&self.orders_url)
                .header("Content-Type", "application/json")
                .header(TUNNEL_SKIP_HEADER.0, TUNNEL_SKIP_HEADER.1)
                .send()
                .await
            {
                Ok(response) => break response,
                Err(err) if attempt < self.fetch_attempts => {
                    tracing::warn!("fetch attempt {attempt} failed: {err}");
                    tokio::time::sleep(self.fetch_retry_delay).await;
                }
                Err(err) => return Err(FeedError::Transport(err)),
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("orders webhook returned {status}: {body}");
            return Err(FeedError::Status(status));
        }

        let body = response.text().await?;
        serde_json::from_str::<Value>(&body).map_err(|err| {
            tracing::error!("orders webhook returned non-JSON body: {err}");
            FeedError::Malformed(err.to_string())
        })
    }

    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), FeedError> {
        let response = self
            .client
            .post(&self.update_url)
            .header(TUNNEL_SKIP_HEADER.0, TUNNEL_SKIP_HEADER.1)
            .json(update)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                order_id = %update.order_id,
                "update webhook returned {status}: {body}"
            );
            return Err(FeedError::Status(status));
        }

        match response.json::<Value>().await {
            Ok(body) => tracing::debug!(order_id = %update.order_id, "update accepted: {body}"),
            Err(err) => tracing::debug!("update accepted with unreadable body: {err}"),
        }
        Ok(())
    }
}
