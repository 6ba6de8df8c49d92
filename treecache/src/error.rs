use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use treecache_core::CoreError;

/// Wraps `treecache_core::CoreError` for the HTTP boundary, the way the
/// teacher's `web::error` module wraps its own domain error.
pub struct HttpError(pub CoreError);

impl From<CoreError> for HttpError {
    fn from(err: CoreError) -> Self {
        HttpError(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self.0, "request failed");

        match self.0 {
            CoreError::InvalidHierarchy(msg) => {
                (StatusCode::CONFLICT, Json(json!({"error": msg}))).into_response()
            }
            CoreError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({"error": msg}))).into_response()
            }
            CoreError::Unknown(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": msg})),
            )
                .into_response(),
        }
    }
}
