// JSON error bodies shared by the read-only HTTP routes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    /// 500 with `{"error": "<what> unavailable"}`.
    pub fn unavailable(what: &str) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self {
                error: format!("{what} unavailable"),
            }),
        )
            .into_response()
    }
}
