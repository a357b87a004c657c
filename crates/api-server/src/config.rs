//! Sidecar configuration from environment variables

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tw_core::run::DEFAULT_QUEUE_CAPACITY;

#[derive(Debug, Clone)]
pub struct SidecarConfig {
    /// Shared secret expected in `X-TW-Token`
    pub shared_token: String,
    /// Base URL of the reasoning backend and tool executor
    pub node_url: String,
    pub bind_addr: SocketAddr,
    pub default_model: String,
    pub reasoning_timeout: Duration,
    pub tool_timeout: Duration,
    pub queue_capacity: usize,
    pub act_grace: Duration,
    pub stream_poll_interval: Duration,
    pub reasoning_enabled: bool,
}

impl Default for SidecarConfig {
    fn default() -> Self {
        Self {
            shared_token: "replace-me".to_string(),
            node_url: "http://127.0.0.1:8080".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8765)),
            default_model: "gpt-4".to_string(),
            reasoning_timeout: Duration::from_secs(20),
            tool_timeout: Duration::from_secs(30),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            act_grace: Duration::from_millis(500),
            stream_poll_interval: Duration::from_millis(200),
            reasoning_enabled: true,
        }
    }
}

impl SidecarConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from any variable lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let string = |name: &str, default: String| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        Self {
            shared_token: string("TW_SHARED_TOKEN", defaults.shared_token),
            node_url: string("NODE_URL", defaults.node_url),
            bind_addr: parsed(&lookup, "TW_BIND_ADDR", defaults.bind_addr),
            default_model: string("TW_DEFAULT_MODEL", defaults.default_model),
            reasoning_timeout: Duration::from_secs(parsed(
                &lookup,
                "TW_REASONING_TIMEOUT_SECS",
                defaults.reasoning_timeout.as_secs(),
            )),
            tool_timeout: Duration::from_secs(parsed(
                &lookup,
                "TW_TOOL_TIMEOUT_SECS",
                defaults.tool_timeout.as_secs(),
            )),
            queue_capacity: parsed(&lookup, "TW_QUEUE_CAPACITY", defaults.queue_capacity).max(1),
            act_grace: Duration::from_millis(parsed(
                &lookup,
                "TW_ACT_GRACE_MS",
                defaults.act_grace.as_millis() as u64,
            )),
            stream_poll_interval: Duration::from_millis(parsed(
                &lookup,
                "TW_STREAM_POLL_MS",
                defaults.stream_poll_interval.as_millis() as u64,
            )),
            reasoning_enabled: flag(&lookup, "TW_ENABLE_REASONING", defaults.reasoning_enabled),
        }
    }
}

fn parsed<T, F>(lookup: &F, name: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid value {:?} for {}", raw, name);
                default
            }
        },
        None => default,
    }
}

fn flag<F>(lookup: &F, name: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                tracing::warn!("Ignoring invalid value {:?} for {}", raw, name);
                default
            }
        },
        None => default,
    }
}
