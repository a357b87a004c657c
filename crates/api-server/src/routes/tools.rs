//! Tool call proxy, tool result injection and typed tool handlers

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tw_core::run::ToolResultReport;
use tw_core::tool::ToolCall;

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

const UPSTREAM_ERROR_CODE: &str = "E_UPSTREAM";

/// Map gateway failures, keeping a structured body when the executor gave
/// no response at all
fn map_gateway_error(err: tw_core::Error) -> Response {
    match err {
        tw_core::Error::Upstream { status: None, message } => (
            StatusCode::BAD_GATEWAY,
            Json(json!({
                "ok": false,
                "error": {
                    "code": UPSTREAM_ERROR_CODE,
                    "title": "Tool executor unreachable",
                    "hint": message,
                }
            })),
        )
            .into_response(),
        other => ApiError::from(other).into_response(),
    }
}

/// POST /tw/tool-call - Forward to the tool executor and relay its answer
async fn call_tool(State(state): State<AppState>, ApiJson(call): ApiJson<ToolCall>) -> Response {
    let response = match state.gateway().call(call).await {
        Ok(response) => response,
        Err(e) => return map_gateway_error(e),
    };

    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = response
        .content_type
        .unwrap_or_else(|| "application/json".to_string());
    (status, [(header::CONTENT_TYPE, content_type)], response.body).into_response()
}

/// POST /tw/tool-result - Inject a tool result into a run's stream
async fn report_tool_result(
    State(state): State<AppState>,
    ApiJson(report): ApiJson<ToolResultReport>,
) -> Result<Json<Value>, ApiError> {
    state.result_sink().report(report).await?;
    Ok(Json(json!({ "ok": true })))
}

/// POST /tw/tools/{name} - Run a typed handler. An empty body means no args.
async fn run_tool_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let args = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            tw_core::Error::invalid_request(format!("Invalid tool arguments: {}", e))
        })?
    };

    match state.tool_handlers().dispatch(&name, args).await {
        None => Err(ApiError::NotFound(format!("tool {}", name))),
        Some(Err(e)) => Err(ApiError::Internal(e.to_string())),
        Some(Ok(value)) => Ok(Json(value)),
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tool-call", post(call_tool))
        .route("/tool-result", post(report_tool_result))
        .route("/tools/{name}", post(run_tool_handler))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::HeaderMap;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    use crate::routes::test_support::*;

    type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    /// Fake executor recording calls; `fail.*` tools answer 418 in plain text
    async fn spawn_executor(seen: Seen) -> String {
        let app = Router::new().route(
            "/api/tools/{name}",
            post(
                move |Path(name): Path<String>, headers: HeaderMap, Json(body): Json<Value>| {
                    let seen = Arc::clone(&seen);
                    async move {
                        let token = headers
                            .get("x-tw-token")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        seen.lock().unwrap().push((name.clone(), token, body.clone()));
                        if name.starts_with("fail.") {
                            return (
                                StatusCode::IM_A_TEAPOT,
                                [(header::CONTENT_TYPE, "text/plain")],
                                "no walls here".to_string(),
                            )
                                .into_response();
                        }
                        Json(json!({ "ok": true, "tool": name, "echo": body })).into_response()
                    }
                },
            ),
        );
        spawn_server(app).await
    }

    async fn app_with_executor() -> (Router, AppState, Seen) {
        let seen: Seen = Arc::default();
        let mut config = test_config();
        config.node_url = spawn_executor(Arc::clone(&seen)).await;
        let (app, state) = build_app(config);
        (app, state, seen)
    }

    #[tokio::test]
    async fn tool_call_relays_downstream_success() {
        let (app, _state, seen) = app_with_executor().await;
        let response = app
            .oneshot(post_json(
                "/tw/tool-call",
                Some(TEST_TOKEN),
                json!({ "name": "geometry.createRoom", "args": { "width": 4 } }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["tool"], "geometry.createRoom");
        assert_eq!(body["echo"], json!({ "width": 4 }));

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].1.as_deref(), Some(TEST_TOKEN));
    }

    #[tokio::test]
    async fn tool_call_relays_downstream_failure_verbatim() {
        let (app, _state, seen) = app_with_executor().await;
        let response = app
            .oneshot(post_json(
                "/tw/tool-call",
                Some(TEST_TOKEN),
                json!({ "name": "fail.anything" }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"no walls here");

        // missing args are sent as an empty object
        assert_eq!(seen.lock().unwrap()[0].2, json!({}));
    }

    #[tokio::test]
    async fn tool_call_without_name_is_bad_request() {
        let (app, _state, seen) = app_with_executor().await;
        let response = app
            .oneshot(post_json(
                "/tw/tool-call",
                Some(TEST_TOKEN),
                json!({ "args": {} }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_tool_bodies_are_json_bad_requests() {
        let (app, _state, seen) = app_with_executor().await;
        for uri in ["/tw/tool-call", "/tw/tool-result"] {
            let response = app
                .clone()
                .oneshot(post_json(uri, Some(TEST_TOKEN), r#"{"name": 42, "runId": ["x"]}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert!(json_body(response).await["error"].is_string());
        }
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unreachable_executor_is_structured_bad_gateway() {
        let (app, _state) = build_app(test_config());
        let response = app
            .oneshot(post_json(
                "/tw/tool-call",
                Some(TEST_TOKEN),
                json!({ "name": "geometry.createRoom" }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "E_UPSTREAM");
        assert_eq!(body["error"]["title"], "Tool executor unreachable");
        assert!(body["error"]["hint"].is_string());
    }

    #[tokio::test]
    async fn tool_result_is_queued_for_the_run() {
        let (app, state) = build_app(test_config());
        let response = app
            .oneshot(post_json(
                "/tw/tool-result",
                Some(TEST_TOKEN),
                json!({ "runId": "run-7", "tool": "door.place" }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "ok": true }));

        let events = state.store().drain_all("run-7").await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].status(), Some("result"));
        assert_eq!(events[0].payload()["result"], json!({ "ok": true }));
    }

    #[tokio::test]
    async fn tool_result_without_run_id_or_tool_is_bad_request() {
        let (app, state) = build_app(test_config());
        for body in [
            json!({ "tool": "door.place" }),
            json!({ "runId": "run-7" }),
            json!({ "runId": "run-7", "tool": "" }),
        ] {
            let response = app
                .clone()
                .oneshot(post_json("/tw/tool-result", Some(TEST_TOKEN), body.to_string()))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
        assert_eq!(state.store().run_count().await, 0);
    }

    #[tokio::test]
    async fn door_place_without_wall_is_bad_args() {
        let (app, _state, seen) = app_with_executor().await;
        let response = app
            .oneshot(post_json("/tw/tools/door.place", Some(TEST_TOKEN), "{}"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["error"]["code"], "E_BAD_ARGS");
        assert_eq!(body["error"]["title"], "wallId required");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn door_place_forwards_with_default_width() {
        let (app, _state, seen) = app_with_executor().await;
        let response = app
            .oneshot(post_json(
                "/tw/tools/door.place",
                Some(TEST_TOKEN),
                json!({ "wallId": "w1" }).to_string(),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ok"], true);

        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].0, "door.place");
        assert_eq!(seen[0].2["wallId"], "w1");
        assert_eq!(seen[0].2["width"], 0.9);
    }

    #[tokio::test]
    async fn unknown_tool_handler_is_not_found() {
        let (app, _state) = build_app(test_config());
        let response = app
            .oneshot(post_json("/tw/tools/roof.raise", Some(TEST_TOKEN), "{}"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreachable_executor_fails_typed_handler() {
        let (app, _state) = build_app(test_config());
        let response = app
            .oneshot(post_json("/tw/tools/transform.move", Some(TEST_TOKEN), ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_handler_args_are_bad_request() {
        let (app, _state) = build_app(test_config());
        let response = app
            .oneshot(post_json("/tw/tools/door.place", Some(TEST_TOKEN), "{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
