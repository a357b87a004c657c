//! Live event stream for a run
//!
//! Each subscription starts with a `heartbeat`, then delivers the run's
//! queued events in order, each as an SSE message named after the event type.
//! Dropping the connection drops the stream, which ends the delivery loop.

use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use futures::Stream;
use tracing::{debug, info, warn};
use tw_core::run::RunEvent;

use crate::state::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Logs when the subscriber goes away and the stream is dropped
struct SubscriberGuard {
    run_id: String,
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        debug!("Subscriber for run {} disconnected", self.run_id);
    }
}

/// SSE event name for a run event; names cannot contain line breaks
fn sse_event_name(event: &RunEvent) -> &str {
    let name = event.event_type();
    if name.is_empty() || name.contains(['\n', '\r']) {
        "message"
    } else {
        name
    }
}

/// GET /tw/events/{run_id} - Subscribe to a run's events
async fn stream_events(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.store().subscribe(&run_id).await;
    let poll_interval = state.config().stream_poll_interval;
    info!("Subscriber attached to run {}", run_id);

    let event_stream = stream! {
        let _guard = SubscriberGuard { run_id: run_id.clone() };
        yield Ok(Event::default().event("heartbeat").data("ok"));

        loop {
            for event in subscription.next_batch(poll_interval).await {
                match event.to_json() {
                    Ok(data) => yield Ok(Event::default().event(sse_event_name(&event)).data(data)),
                    Err(e) => warn!("Dropping unserializable event for run {}: {}", run_id, e),
                }
            }
        }
    };

    Sse::new(event_stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keepalive"),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events/{run_id}", get(stream_events))
}
