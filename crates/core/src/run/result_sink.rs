//! Injection point for out-of-band tool results

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::event::RunEvent;
use super::queue::EventQueueStore;
use crate::error::required;
use crate::Result;

/// Report sent by whoever executed a tool
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultReport {
    pub run_id: Option<String>,
    pub tool: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
}

/// Writes `act(status=result)` events into the reporting run's queue
#[derive(Clone)]
pub struct ToolResultSink {
    store: EventQueueStore,
}

impl ToolResultSink {
    pub fn new(store: EventQueueStore) -> Self {
        Self { store }
    }

    /// Validate and enqueue a report. A missing or null result is recorded as
    /// `{"ok": true}`.
    pub async fn report(&self, report: ToolResultReport) -> Result<()> {
        let run_id = required(report.run_id.as_deref(), "runId")?;
        let tool = required(report.tool.as_deref(), "tool")?;
        let result = match report.result {
            None | Some(Value::Null) => json!({ "ok": true }),
            Some(value) => value,
        };

        info!("Tool result for run {} ({})", run_id, tool);
        self.store
            .enqueue(run_id, RunEvent::act_result(tool, result))
            .await;
        Ok(())
    }
}
