use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use marriage_common::AppError;

/// Wraps `AppError` so route handlers can return it directly from a `Result` and get the
/// error-taxonomy's HTTP status mapping for free.
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "success": false,
            "errorCode": self.0.error_code(),
            "error": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}
