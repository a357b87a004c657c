//! Run coordinator
//!
//! Validates a run-start request and drives one run from its first
//! `assistant` event to a terminal `done` or `error` event. Everything after
//! the `plan` event happens on a spawned task; the caller gets its answer as
//! soon as the plan is queued.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use super::classifier;
use super::event::{RunEvent, RUNTIME_ERROR_CODE};
use super::planner::{FixedToolPlanner, Plan, Planner};
use super::queue::EventQueueStore;
use crate::agent::{ReasoningBackend, ReasoningRequest, DEFAULT_REASONING_TIMEOUT};
use crate::error::{required, Error};
use crate::Result;

/// Assistant line used when the reasoning backend cannot be reached
pub const FALLBACK_REPLY: &str = "Got it. I'll help with that.";

/// Assistant line emitted after the planned steps have been cued
pub const FOLLOW_UP_QUESTION: &str =
    "First step completed. Would you like me to partition into two bedrooms and add doors/windows?";

/// Step cap applied when a request does not set `maxSteps`
pub const DEFAULT_MAX_STEPS: u32 = 12;

/// Body of a run-start request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub run_id: Option<String>,
    pub goal: Option<String>,
    #[serde(default)]
    pub context: Option<Value>,
    pub model: Option<String>,
    /// Step cap; values below 1 are treated as 1
    pub max_steps: Option<i64>,
}

impl RunRequest {
    pub fn new(run_id: impl Into<String>, goal: impl Into<String>) -> Self {
        Self {
            run_id: Some(run_id.into()),
            goal: Some(goal.into()),
            ..Default::default()
        }
    }
}

/// Response to an accepted run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunAccepted {
    pub run_id: String,
}

/// Tunables for [`RunCoordinator`]
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Model sent to the backend when the request names none
    pub default_model: String,
    /// Upper bound on the advisory backend call
    pub reasoning_timeout: Duration,
    /// Pause after each `act(start)` to let the executor pick it up
    pub act_grace: Duration,
    pub default_max_steps: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            default_model: "gpt-4".to_string(),
            reasoning_timeout: DEFAULT_REASONING_TIMEOUT,
            act_grace: Duration::from_millis(500),
            default_max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Drives run lifecycles against a shared [`EventQueueStore`]
#[derive(Clone)]
pub struct RunCoordinator {
    store: EventQueueStore,
    backend: Option<Arc<dyn ReasoningBackend>>,
    planner: Arc<dyn Planner>,
    config: CoordinatorConfig,
}

impl RunCoordinator {
    /// Create a coordinator with the fixed default planner.
    ///
    /// Without a backend every run gets the fallback assistant line.
    pub fn new(
        store: EventQueueStore,
        backend: Option<Arc<dyn ReasoningBackend>>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            backend,
            planner: Arc::new(FixedToolPlanner::default()),
            config,
        }
    }

    /// Replace the planner
    pub fn with_planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn store(&self) -> &EventQueueStore {
        &self.store
    }

    /// Start a run.
    ///
    /// Returns once the run is either finished (non-actionable goal) or its
    /// plan is queued and background execution has been spawned.
    pub async fn start_run(&self, request: RunRequest) -> Result<RunAccepted> {
        let run_id = required(request.run_id.as_deref(), "runId")?.to_string();
        let goal = required(request.goal.as_deref(), "goal")?.to_string();
        let context = match request.context {
            None | Some(Value::Null) => json!({}),
            Some(context) => context,
        };
        let model = request
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.default_model.clone());

        info!("Starting run {} (model={})", run_id, model);

        let reply = self.advisory_reply(&run_id, &goal, &model, &context).await;
        self.store.enqueue(&run_id, RunEvent::assistant(reply)).await;

        let Some(keyword) = classifier::matched_keyword(&goal) else {
            info!("Run {} goal is not actionable, finishing as chat", run_id);
            self.store.enqueue(&run_id, RunEvent::done_success()).await;
            return Ok(RunAccepted { run_id });
        };
        debug!("Run {} goal matched keyword {:?}", run_id, keyword);

        let mut plan = self.planner.plan(&goal, &context);
        let max_steps = match request.max_steps {
            Some(n) => usize::try_from(n.max(1)).unwrap_or(usize::MAX),
            None => self.config.default_max_steps as usize,
        };
        plan.truncate(max_steps);
        self.store
            .enqueue(&run_id, RunEvent::plan(plan.summary.clone(), plan.tool_names()))
            .await;

        self.spawn_execution(run_id.clone(), plan);
        Ok(RunAccepted { run_id })
    }

    /// Ask the backend for a reply, masking every failure with the fallback
    async fn advisory_reply(&self, run_id: &str, goal: &str, model: &str, context: &Value) -> String {
        let Some(backend) = &self.backend else {
            return FALLBACK_REPLY.to_string();
        };

        let request = ReasoningRequest::agent(goal, model, context.clone());
        match tokio::time::timeout(self.config.reasoning_timeout, backend.reply(request)).await {
            Ok(Ok(content)) => {
                let preview: String = content.trim().replace('\n', " ").chars().take(120).collect();
                info!(
                    "Run {} reasoning reply OK ({} chars): {}",
                    run_id,
                    content.len(),
                    preview
                );
                content
            }
            Ok(Err(e)) => {
                warn!("Run {} reasoning call failed: {}", run_id, e);
                FALLBACK_REPLY.to_string()
            }
            Err(_) => {
                warn!(
                    "Run {} reasoning call timed out after {:?}",
                    run_id, self.config.reasoning_timeout
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }

    /// Spawn the background sequence for a planned run.
    ///
    /// The sequence runs on its own task so that both returned errors and
    /// panics end the run with an `error` event.
    fn spawn_execution(&self, run_id: String, plan: Plan) {
        let store = self.store.clone();
        let grace = self.config.act_grace;

        tokio::spawn(async move {
            let sequence = tokio::spawn(execute_plan(store.clone(), run_id.clone(), plan, grace));

            let failure = match sequence.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(e) => Some(format!("background task aborted: {}", e)),
            };

            if let Some(hint) = failure {
                error!("Run {} failed: {}", run_id, hint);
                store
                    .enqueue(&run_id, RunEvent::error(RUNTIME_ERROR_CODE, "Runtime error", hint))
                    .await;
            } else {
                debug!("Run {} background sequence finished", run_id);
            }
        });
    }
}

/// Cue each planned step, then close the run
async fn execute_plan(
    store: EventQueueStore,
    run_id: String,
    plan: Plan,
    grace: Duration,
) -> Result<()> {
    for step in plan.steps {
        if step.tool.trim().is_empty() {
            return Err(Error::runtime("planned step has no tool name"));
        }
        store
            .enqueue(&run_id, RunEvent::act_start(step.tool, step.args))
            .await;
        tokio::time::sleep(grace).await;
    }

    store
        .enqueue(&run_id, RunEvent::assistant(FOLLOW_UP_QUESTION))
        .await;
    store.enqueue(&run_id, RunEvent::done_success()).await;
    Ok(())
}
