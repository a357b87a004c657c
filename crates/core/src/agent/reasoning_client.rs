//! Reasoning backend HTTP client
//!
//! Asks the chat backend for a natural-language reply to a goal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Error;
use crate::Result;

/// Reply used when the backend answers without a usable text field
pub const DEFAULT_ACKNOWLEDGEMENT: &str = "I understand. I'll plan the steps next.";

/// Timeout applied to each backend request unless configured otherwise
pub const DEFAULT_REASONING_TIMEOUT: Duration = Duration::from_secs(20);

/// Request sent to the reasoning backend
#[derive(Debug, Clone, Serialize)]
pub struct ReasoningRequest {
    pub message: String,
    pub model: String,
    pub mode: String,
    pub context: Value,
}

impl ReasoningRequest {
    pub fn agent(message: impl Into<String>, model: impl Into<String>, context: Value) -> Self {
        Self {
            message: message.into(),
            model: model.into(),
            mode: "agent".to_string(),
            context,
        }
    }
}

/// Backend reply. The text may arrive as `response` or `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReasoningReply {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ReasoningReply {
    /// Text content, preferring `response` over `message`
    pub fn content(&self) -> &str {
        [self.response.as_deref(), self.message.as_deref()]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .unwrap_or(DEFAULT_ACKNOWLEDGEMENT)
    }
}

/// A service that can produce a natural-language reply for a goal
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn reply(&self, request: ReasoningRequest) -> Result<String>;
}

/// Configuration for [`HttpReasoningClient`]
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    /// Base URL of the backend, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    pub timeout: Duration,
}

impl ReasoningConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_REASONING_TIMEOUT,
        }
    }
}

/// Reasoning backend reached over HTTP at `{base_url}/api/ai-chat`
pub struct HttpReasoningClient {
    client: Client,
    endpoint: String,
}

impl HttpReasoningClient {
    pub fn new(config: ReasoningConfig) -> Result<Self> {
        let client = Client::builder()
            .no_proxy()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/ai-chat", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ReasoningBackend for HttpReasoningClient {
    async fn reply(&self, request: ReasoningRequest) -> Result<String> {
        debug!("Sending reasoning request to {}", self.endpoint);

        let res = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(None, format!("Failed to reach reasoning backend: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(Error::upstream(
                Some(status.as_u16()),
                format!("Reasoning backend returned error: {}", body),
            ));
        }

        let reply: ReasoningReply = res
            .json()
            .await
            .map_err(|e| Error::upstream(Some(status.as_u16()), format!("Invalid reasoning reply: {}", e)))?;
        Ok(reply.content().to_string())
    }
}
