//! Typed tool handlers
//!
//! Thin wrappers over [`ToolGateway`] for tools the sidecar knows about. They
//! check arguments before calling downstream and turn failures into a
//! structured `{ok: false, error: {code, title, hint}}` body instead of an
//! HTTP error.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::gateway::ToolGateway;
use crate::Result;

pub const BAD_ARGS_CODE: &str = "E_BAD_ARGS";
pub const HTTP_ERROR_CODE: &str = "E_HTTP";

/// Structured failure body returned to the caller with HTTP 200
pub fn tool_failure(code: &str, title: impl Into<String>, hint: Option<String>) -> Value {
    let mut error = Map::new();
    error.insert("code".into(), json!(code));
    error.insert("title".into(), json!(title.into()));
    if let Some(hint) = hint {
        error.insert("hint".into(), json!(hint));
    }
    json!({ "ok": false, "error": error })
}

/// A named tool with its own argument rules
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, gateway: &ToolGateway, args: Value) -> Result<Value>;
}

/// Call downstream and wrap error statuses
async fn forward(gateway: &ToolGateway, tool: &str, body: &Value) -> Result<Value> {
    let response = gateway.invoke(tool, body).await?;
    if response.status >= 400 {
        return Ok(tool_failure(
            HTTP_ERROR_CODE,
            response.status.to_string(),
            Some(response.text()),
        ));
    }
    response.json()
}

/// Non-empty string argument
fn string_arg<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

/// Numeric argument that may arrive as a number or a numeric string
fn number_arg(args: &Value, key: &str, default: f64) -> std::result::Result<f64, Value> {
    let bad = || tool_failure(BAD_ARGS_CODE, format!("{} must be a number", key), None);
    match args.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Number(n)) => n.as_f64().ok_or_else(bad),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| bad()),
        Some(_) => Err(bad()),
    }
}

pub struct DoorPlace;

#[async_trait]
impl ToolHandler for DoorPlace {
    fn name(&self) -> &'static str {
        "door.place"
    }

    async fn handle(&self, gateway: &ToolGateway, args: Value) -> Result<Value> {
        let width = match number_arg(&args, "width", 0.9) {
            Ok(width) => width,
            Err(failure) => return Ok(failure),
        };
        let Some(wall_id) = string_arg(&args, "wallId") else {
            return Ok(tool_failure(
                BAD_ARGS_CODE,
                "wallId required",
                Some("Provide wallId".to_string()),
            ));
        };
        forward(
            gateway,
            self.name(),
            &json!({ "width": width, "wallId": wall_id }),
        )
        .await
    }
}

pub struct WallCutOpening;

#[async_trait]
impl ToolHandler for WallCutOpening {
    fn name(&self) -> &'static str {
        "wall.cutOpening"
    }

    async fn handle(&self, gateway: &ToolGateway, args: Value) -> Result<Value> {
        let Some(wall_id) = string_arg(&args, "wallId") else {
            return Ok(tool_failure(BAD_ARGS_CODE, "wallId required", None));
        };
        let width = match number_arg(&args, "width", 1.0) {
            Ok(width) => width,
            Err(failure) => return Ok(failure),
        };
        let height = match number_arg(&args, "height", 2.1) {
            Ok(height) => height,
            Err(failure) => return Ok(failure),
        };
        forward(
            gateway,
            self.name(),
            &json!({ "wallId": wall_id, "width": width, "height": height }),
        )
        .await
    }
}

pub struct TransformMove;

#[async_trait]
impl ToolHandler for TransformMove {
    fn name(&self) -> &'static str {
        "transform.move"
    }

    async fn handle(&self, gateway: &ToolGateway, args: Value) -> Result<Value> {
        forward(gateway, self.name(), &args).await
    }
}

/// Lookup table of handlers by tool name
#[derive(Clone)]
pub struct ToolHandlers {
    gateway: ToolGateway,
    handlers: HashMap<&'static str, Arc<dyn ToolHandler>>,
}

impl ToolHandlers {
    pub fn new(gateway: ToolGateway) -> Self {
        Self {
            gateway,
            handlers: HashMap::new(),
        }
    }

    /// Registry with every built-in handler
    pub fn with_defaults(gateway: ToolGateway) -> Self {
        Self::new(gateway)
            .register(Arc::new(DoorPlace))
            .register(Arc::new(WallCutOpening))
            .register(Arc::new(TransformMove))
    }

    pub fn register(mut self, handler: Arc<dyn ToolHandler>) -> Self {
        self.handlers.insert(handler.name(), handler);
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run the named handler. `None` when no handler is registered.
    pub async fn dispatch(&self, name: &str, args: Value) -> Option<Result<Value>> {
        let handler = self.handlers.get(name)?;
        let args = if args.is_null() { json!({}) } else { args };
        Some(handler.handle(&self.gateway, args).await)
    }
}
