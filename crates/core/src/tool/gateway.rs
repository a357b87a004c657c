//! Tool executor HTTP proxy
//!
//! Forwards a named tool call to `{base_url}/api/tools/{name}` and hands the
//! downstream status and body back untouched.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{required, Error};
use crate::Result;

/// Header carrying the shared secret on calls to the tool executor
pub const TOKEN_HEADER: &str = "X-TW-Token";

pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Body of a proxied tool call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    pub name: Option<String>,
    #[serde(default)]
    pub args: Option<Value>,
}

/// Raw downstream response
#[derive(Debug, Clone)]
pub struct ToolResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl ToolResponse {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

#[derive(Debug, Clone)]
pub struct ToolGatewayConfig {
    pub base_url: String,
    pub shared_token: String,
    pub timeout: Duration,
}

impl ToolGatewayConfig {
    pub fn new(base_url: impl Into<String>, shared_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            shared_token: shared_token.into(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }
}

/// Stateless proxy to the downstream tool executor
#[derive(Clone)]
pub struct ToolGateway {
    client: Client,
    base_url: String,
    shared_token: String,
}

impl ToolGateway {
    pub fn new(config: ToolGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .no_proxy()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            shared_token: config.shared_token,
        })
    }

    /// Validate and forward a tool call. Missing args are sent as `{}`.
    pub async fn call(&self, call: ToolCall) -> Result<ToolResponse> {
        let name = required(call.name.as_deref(), "name")?;
        let args = match call.args {
            None | Some(Value::Null) => json!({}),
            Some(args) => args,
        };
        self.invoke(name, &args).await
    }

    /// Forward `args` to the named tool. Only transport failures are errors;
    /// any HTTP status is returned as a response.
    pub async fn invoke(&self, name: &str, args: &Value) -> Result<ToolResponse> {
        let url = format!(
            "{}/api/tools/{}",
            self.base_url,
            urlencoding::encode(name)
        );
        debug!("Forwarding tool call to {}", url);

        let res = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.shared_token)
            .json(args)
            .send()
            .await
            .map_err(|e| {
                warn!("Tool executor unreachable for {}: {}", name, e);
                Error::upstream(None, format!("Failed to reach tool executor: {}", e))
            })?;

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res
            .bytes()
            .await
            .map_err(|e| Error::upstream(Some(status), format!("Failed to read tool response: {}", e)))?;

        debug!("Tool {} answered with status {}", name, status);
        Ok(ToolResponse {
            status,
            content_type,
            body,
        })
    }
}
