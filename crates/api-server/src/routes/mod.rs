//! Route handlers

pub mod events;
pub mod health;
pub mod run;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_support;

use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::require_shared_token;
use crate::state::AppState;

/// Full application router: token-gated `/tw` routes plus public health
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .merge(run::router())
        .merge(events::router())
        .merge(tools::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_shared_token,
        ));

    Router::new()
        .nest("/tw", protected)
        .merge(health::router())
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
