//! Run start endpoint

use axum::{extract::State, routing::post, Json, Router};
use tw_core::run::{RunAccepted, RunRequest};

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

/// POST /tw/run - Start a run; returns before background work finishes
async fn start_run(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RunRequest>,
) -> Result<Json<RunAccepted>, ApiError> {
    let accepted = state.coordinator().start_run(req).await?;
    Ok(Json(accepted))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/run", post(start_run))
}
