//! Tool selection for actionable goals
//!
//! The planner is a decision point: given a goal and its context it chooses
//! which client-executable tools to invoke. The default implementation always
//! picks a single room-creation tool.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool chosen by [`FixedToolPlanner`]
pub const DEFAULT_TOOL: &str = "geometry.createRoom";

/// One tool invocation the client is asked to perform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub tool: String,
    #[serde(default)]
    pub args: Value,
}

impl PlannedStep {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }
}

/// Ordered steps plus a human-readable summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub summary: String,
    pub steps: Vec<PlannedStep>,
}

impl Plan {
    /// Tool names in step order, as carried by the `plan` event
    pub fn tool_names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.tool.clone()).collect()
    }

    /// Keep at most `max_steps` steps (never fewer than one)
    pub fn truncate(&mut self, max_steps: usize) {
        self.steps.truncate(max_steps.max(1));
    }
}

/// Chooses the tools to run for an actionable goal
pub trait Planner: Send + Sync {
    fn plan(&self, goal: &str, context: &Value) -> Plan;
}

/// Planner that always selects one fixed tool with fixed arguments
#[derive(Debug, Clone)]
pub struct FixedToolPlanner {
    tool: String,
    args: Value,
}

impl FixedToolPlanner {
    pub fn new(tool: impl Into<String>, args: Value) -> Self {
        Self {
            tool: tool.into(),
            args,
        }
    }
}

impl Default for FixedToolPlanner {
    fn default() -> Self {
        Self::new(
            DEFAULT_TOOL,
            json!({ "width": 4, "depth": 5, "height": 2.7 }),
        )
    }
}

impl Planner for FixedToolPlanner {
    fn plan(&self, goal: &str, _context: &Value) -> Plan {
        Plan {
            summary: format!("Plan for: {}", goal),
            steps: vec![PlannedStep::new(self.tool.clone(), self.args.clone())],
        }
    }
}
