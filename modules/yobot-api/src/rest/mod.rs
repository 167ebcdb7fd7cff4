pub mod leads;
pub mod mode;
pub mod scraping;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use yobot_common::ValidationError;

/// 400 with every field error, in the shape the dashboard expects.
pub(crate) fn validation_failed(err: ValidationError) -> Response {
    tracing::info!(error = %err, "Rejected request");
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "success": false,
            "errors": err.errors,
        })),
    )
        .into_response()
}
