//! Helpers shared by route tests

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, Response},
    Router,
};
use futures::StreamExt;
use serde_json::Value;

use crate::config::SidecarConfig;
use crate::state::AppState;

pub const TEST_TOKEN: &str = "test-token";

/// Config with short timings and the reasoning backend switched off
pub fn test_config() -> SidecarConfig {
    SidecarConfig {
        shared_token: TEST_TOKEN.to_string(),
        node_url: "http://127.0.0.1:9".to_string(),
        act_grace: Duration::from_millis(300),
        stream_poll_interval: Duration::from_millis(20),
        reasoning_enabled: false,
        ..Default::default()
    }
}

pub fn build_app(config: SidecarConfig) -> (Router, AppState) {
    let state = AppState::new(config).unwrap();
    (super::app(state.clone()), state)
}

/// Serve a router on an ephemeral local port, returning its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn post_json(uri: &str, token: Option<&str>, body: impl Into<Body>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("X-TW-Token", token);
    }
    builder.body(body.into()).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("X-TW-Token", token);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// One parsed server-sent event
#[derive(Debug, Clone)]
pub struct SseMessage {
    pub event: String,
    pub data: String,
}

impl SseMessage {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.data).unwrap()
    }

    /// `type` or `type:status`, for compact order assertions
    pub fn label(&self) -> String {
        if self.event == "heartbeat" {
            return self.event.clone();
        }
        match self.json().get("status").and_then(Value::as_str) {
            Some(status) => format!("{}:{}", self.event, status),
            None => self.event.clone(),
        }
    }
}

/// Incremental reader over an SSE response body
pub struct SseReader {
    stream: axum::body::BodyDataStream,
    buffer: String,
}

impl SseReader {
    pub fn new(response: Response<Body>) -> Self {
        Self {
            stream: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    /// Next event, skipping keep-alive comments. Panics after `timeout`.
    pub async fn next_message(&mut self, timeout: Duration) -> SseMessage {
        tokio::time::timeout(timeout, async {
            loop {
                if let Some(message) = self.take_buffered() {
                    return message;
                }
                let chunk = self
                    .stream
                    .next()
                    .await
                    .expect("event stream ended")
                    .unwrap();
                self.buffer.push_str(&String::from_utf8_lossy(&chunk));
            }
        })
        .await
        .expect("timed out waiting for event")
    }

    /// Read events until one satisfies `stop`, returning all of them
    pub async fn read_until(&mut self, stop: impl Fn(&SseMessage) -> bool) -> Vec<SseMessage> {
        let mut seen = Vec::new();
        loop {
            let message = self.next_message(Duration::from_secs(5)).await;
            let done = stop(&message);
            seen.push(message);
            if done {
                return seen;
            }
        }
    }

    fn take_buffered(&mut self) -> Option<SseMessage> {
        while let Some(end) = self.buffer.find("\n\n") {
            let frame: String = self.buffer.drain(..end + 2).collect();
            let mut event = String::from("message");
            let mut data = Vec::new();
            for line in frame.lines() {
                if let Some(value) = line.strip_prefix("event:") {
                    event = value.trim_start().to_string();
                } else if let Some(value) = line.strip_prefix("data:") {
                    data.push(value.trim_start().to_string());
                }
            }
            if data.is_empty() {
                // comment-only frame (keep-alive)
                continue;
            }
            return Some(SseMessage {
                event,
                data: data.join("\n"),
            });
        }
        None
    }
}
