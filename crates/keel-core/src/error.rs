use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Build the JSON error body every service returns: `{"kind": ..., "message": ...}`.
///
/// Services keep their own error enums and call this from `IntoResponse`.
pub fn error_response(status: StatusCode, kind: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "kind": kind,
        "message": message,
    });
    (status, axum::Json(body)).into_response()
}
