use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod api;
pub mod pages;

pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/stack", get(api::stack_html))
        .route("/stack.json", get(api::stack_json))
        .route("/threads", get(api::threads))
        .route("/status", get(api::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
