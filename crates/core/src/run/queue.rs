//! In-memory per-run event queues
//!
//! Each run owns a bounded FIFO. When a push would exceed capacity the oldest
//! entry is evicted, never the newest. Queues are created on first reference
//! and live for the lifetime of the process.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock};
use tracing::{debug, warn};

use super::event::RunEvent;

/// Default number of events buffered per run
pub const DEFAULT_QUEUE_CAPACITY: usize = 500;

/// Bounded FIFO for a single run
pub struct RunQueue {
    events: Mutex<VecDeque<RunEvent>>,
    notify: Notify,
    capacity: usize,
}

impl RunQueue {
    fn new(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            notify: Notify::new(),
            capacity,
        }
    }

    /// Append an event, evicting the oldest entry when full.
    /// Returns true if an entry was evicted.
    async fn push(&self, event: RunEvent) -> bool {
        let evicted = {
            let mut events = self.events.lock().await;
            let evicted = if events.len() >= self.capacity {
                events.pop_front().is_some()
            } else {
                false
            };
            events.push_back(event);
            evicted
        };
        self.notify.notify_waiters();
        evicted
    }

    async fn drain(&self) -> Vec<RunEvent> {
        self.events.lock().await.drain(..).collect()
    }

    async fn len(&self) -> usize {
        self.events.lock().await.len()
    }
}

/// Concurrency-safe mapping from run identifier to its bounded event queue.
///
/// Cloning is cheap; all clones share the same queues.
#[derive(Clone)]
pub struct EventQueueStore {
    queues: Arc<RwLock<HashMap<String, Arc<RunQueue>>>>,
    capacity: usize,
}

impl EventQueueStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a store whose per-run queues hold at most `capacity` events
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queues: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Get the queue for a run, creating it if absent
    async fn queue(&self, run_id: &str) -> Arc<RunQueue> {
        if let Some(queue) = self.queues.read().await.get(run_id) {
            return Arc::clone(queue);
        }

        let mut queues = self.queues.write().await;
        let queue = queues
            .entry(run_id.to_string())
            .or_insert_with(|| {
                debug!("Creating event queue for run {}", run_id);
                Arc::new(RunQueue::new(self.capacity))
            });
        Arc::clone(queue)
    }

    /// Append an event to a run's queue
    pub async fn enqueue(&self, run_id: &str, event: RunEvent) {
        let event_type = event.event_type().to_string();
        let evicted = self.queue(run_id).await.push(event).await;
        if evicted {
            warn!(
                "Event queue for run {} is full ({}), dropped oldest event",
                run_id, self.capacity
            );
        }
        debug!("Enqueued {} event for run {}", event_type, run_id);
    }

    /// Remove and return every buffered event for a run, oldest first
    pub async fn drain_all(&self, run_id: &str) -> Vec<RunEvent> {
        self.queue(run_id).await.drain().await
    }

    /// Number of events currently buffered for a run
    pub async fn len(&self, run_id: &str) -> usize {
        match self.queues.read().await.get(run_id) {
            Some(queue) => queue.len().await,
            None => 0,
        }
    }

    /// Number of runs that have a queue
    pub async fn run_count(&self) -> usize {
        self.queues.read().await.len()
    }

    /// Bind a subscription to a run's queue, creating it if absent
    pub async fn subscribe(&self, run_id: &str) -> QueueSubscription {
        QueueSubscription {
            run_id: run_id.to_string(),
            queue: self.queue(run_id).await,
        }
    }
}

impl Default for EventQueueStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer handle for a single run's queue
pub struct QueueSubscription {
    run_id: String,
    queue: Arc<RunQueue>,
}

impl QueueSubscription {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Drain everything buffered right now
    pub async fn drain(&self) -> Vec<RunEvent> {
        self.queue.drain().await
    }

    /// Wait for the next batch of events.
    ///
    /// Returns as soon as something is buffered. Otherwise waits until the
    /// next enqueue or until `poll_interval` elapses, then drains again. The
    /// result may be empty when the interval passes with no activity.
    pub async fn next_batch(&self, poll_interval: Duration) -> Vec<RunEvent> {
        // Register for wakeups before checking so an enqueue between the
        // drain and the wait is not missed.
        let notified = self.queue.notify.notified();
        let batch = self.queue.drain().await;
        if !batch.is_empty() {
            return batch;
        }
        let _ = tokio::time::timeout(poll_interval, notified).await;
        self.queue.drain().await
    }
}
