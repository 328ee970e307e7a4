use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::{error::Category, json};

pub enum AppError {
    /// the call tree could not be written out as JSON
    Render(serde_json::Error),
}

impl From<serde_json::Error> for AppError {
    fn from(inner: serde_json::Error) -> Self {
        AppError::Render(inner)
    }
}

fn category_name(category: Category) -> &'static str {
    match category {
        Category::Io => "io",
        Category::Syntax => "syntax",
        Category::Data => "data",
        Category::Eof => "eof",
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Render(inner) => {
                tracing::error!("unable to render the call tree: {}", inner);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("unable to render the call tree ({} error)", category_name(inner.classify())),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
