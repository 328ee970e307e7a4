use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse, Json};
use roast::render::{html, json};
use roast::sampler::StatusReport;
use serde::Serialize;

use crate::{error::AppError, state::AppState};

/// HTML fragment of every thread
pub(crate) async fn stack_html(State(st): State<AppState>) -> Html<String> {
    let calltree = st.calltree.read();
    Html(html::threads_html(&calltree, &st.symbols))
}

/// JSON array of every thread
pub(crate) async fn stack_json(State(st): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let body = {
        let calltree = st.calltree.read();
        json::threads_json(&calltree, &st.symbols)?
    };
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub(crate) struct ThreadSummary {
    name: String,
    #[serde(rename = "timeMs")]
    time_ms: u64,
}

pub(crate) async fn threads(State(st): State<AppState>) -> Json<Vec<ThreadSummary>> {
    let calltree = st.calltree.read();
    let threads = calltree
        .roots()
        .into_iter()
        .map(|id| {
            let node = calltree.get(id);
            ThreadSummary {
                name: node.name.clone(),
                time_ms: node.total_time,
            }
        })
        .collect();
    Json(threads)
}

pub(crate) async fn status(State(st): State<AppState>) -> Json<StatusReport> {
    Json(st.status.report())
}
