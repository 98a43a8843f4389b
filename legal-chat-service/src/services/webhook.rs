//! JSON client for workflow-automation webhooks.

use reqwest::Client;
use serde::Serialize;
use service_core::observability::TracedClientExt;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("legal-chat-service/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("webhook URL not configured")]
    NotConfigured,

    #[error("webhook timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("webhook returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid webhook response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for WebhookError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            WebhookError::Timeout
        } else if e.is_decode() {
            WebhookError::InvalidResponse(e.to_string())
        } else {
            WebhookError::Network(e.to_string())
        }
    }
}

/// Posts JSON and expects a JSON object back. No retries.
#[derive(Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub async fn post_json<B>(
        &self,
        url: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<serde_json::Map<String, serde_json::Value>, WebhookError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!(url = %url, "Calling workflow webhook");

        let response = self
            .client
            .traced_post(url)
            .header("User-Agent", USER_AGENT)
            .json(body)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Workflow webhook returned an error status");
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"));
        if !is_json {
            return Err(WebhookError::InvalidResponse(
                "non-JSON response".to_string(),
            ));
        }

        match response.json::<serde_json::Value>().await? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(WebhookError::InvalidResponse(
                "response is not a JSON object".to_string(),
            )),
        }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}
