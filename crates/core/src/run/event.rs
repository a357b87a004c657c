//! Event types emitted into a run's queue

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Well-known event type tags. The set is open; tools may emit other tags.
pub mod kind {
    pub const ASSISTANT: &str = "assistant";
    pub const PLAN: &str = "plan";
    pub const ACT: &str = "act";
    pub const DONE: &str = "done";
    pub const ERROR: &str = "error";
}

/// Values of the `status` field on `act` and `done` events
pub mod status {
    pub const START: &str = "start";
    pub const RESULT: &str = "result";
    pub const SUCCESS: &str = "success";
}

/// Error code carried by a failed background sequence
pub const RUNTIME_ERROR_CODE: &str = "E_RUNTIME";

/// A typed, immutable record in a run's event stream.
///
/// Serializes as one flat JSON object: `{"type": "...", ...payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

impl RunEvent {
    /// Build an event from a type tag and a JSON object payload.
    ///
    /// Non-object payloads are stored under a `data` key. A `type` key inside
    /// the payload is dropped so it cannot shadow the tag.
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        let mut payload = match payload {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        payload.remove("type");
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(kind::ASSISTANT, json!({ "content": content.into() }))
    }

    pub fn plan(summary: impl Into<String>, steps: Vec<String>) -> Self {
        Self::new(
            kind::PLAN,
            json!({ "summary": summary.into(), "steps": steps }),
        )
    }

    pub fn act_start(tool: impl Into<String>, args: Value) -> Self {
        Self::new(
            kind::ACT,
            json!({ "status": status::START, "tool": tool.into(), "args": args }),
        )
    }

    pub fn act_result(tool: impl Into<String>, result: Value) -> Self {
        Self::new(
            kind::ACT,
            json!({ "status": status::RESULT, "tool": tool.into(), "result": result }),
        )
    }

    pub fn done_success() -> Self {
        Self::new(kind::DONE, json!({ "status": status::SUCCESS }))
    }

    pub fn error(
        code: impl Into<String>,
        title: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        Self::new(
            kind::ERROR,
            json!({ "code": code.into(), "title": title.into(), "hint": hint.into() }),
        )
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    /// Shorthand for a string field in the payload
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.field_str("status")
    }

    pub fn is_terminal(&self) -> bool {
        self.event_type == kind::DONE || self.event_type == kind::ERROR
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
