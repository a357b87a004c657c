pub mod classifier;
mod coordinator;
pub mod event;
pub mod planner;
mod queue;
mod result_sink;

pub use coordinator::{
    CoordinatorConfig, RunAccepted, RunCoordinator, RunRequest, DEFAULT_MAX_STEPS, FALLBACK_REPLY,
    FOLLOW_UP_QUESTION,
};
pub use event::RunEvent;
pub use planner::{FixedToolPlanner, Plan, PlannedStep, Planner};
pub use queue::{EventQueueStore, QueueSubscription, DEFAULT_QUEUE_CAPACITY};
pub use result_sink::{ToolResultReport, ToolResultSink};
