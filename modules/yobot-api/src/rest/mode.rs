use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;

use yobot_common::{FieldError, SystemMode, ValidationError, Validator};

use super::validation_failed;
use crate::AppState;

const AUDIT_LIMIT: usize = 100;

#[derive(Deserialize)]
pub struct SetModeRequest {
    mode: Option<String>,
}

pub async fn api_set_mode(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetModeRequest>,
) -> Response {
    let raw = body.mode.as_deref().unwrap_or_default();
    let mut validator = Validator::new();
    validator.required("mode", Some(raw));
    if !raw.trim().is_empty() {
        validator.one_of("mode", raw, &["test", "live"]);
    }
    if let Err(e) = validator.finish() {
        return validation_failed(e);
    }

    let mode: SystemMode = match raw.parse() {
        Ok(mode) => mode,
        Err(message) => {
            return validation_failed(ValidationError {
                errors: vec![FieldError {
                    field: "mode".into(),
                    message,
                }],
            })
        }
    };

    let previous = state.pipeline.set_mode(mode);
    Json(serde_json::json!({
        "success": true,
        "mode": mode,
        "previous": previous,
    }))
    .into_response()
}

pub async fn api_get_mode(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "mode": state.pipeline.gate().mode() }))
}

pub async fn api_mode_audit(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({ "entries": state.pipeline.gate().recent_audit(AUDIT_LIMIT) }))
}
