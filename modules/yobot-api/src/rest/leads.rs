use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::warn;

use yobot_common::Validator;

use super::validation_failed;
use crate::AppState;

const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

#[derive(Deserialize)]
pub struct LeadsQuery {
    limit: Option<String>,
}

/// Absent means the default; anything else must be an integer in 1..=MAX_LIMIT.
fn parse_limit(raw: Option<&str>) -> Result<u32, yobot_common::ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(DEFAULT_LIMIT);
    };
    match raw.parse::<u32>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Validator::new()
            .error("limit", format!("must be an integer between 1 and {MAX_LIMIT}"))
            .finish()
            .map(|_| DEFAULT_LIMIT),
    }
}

pub async fn api_scraped_leads(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LeadsQuery>,
) -> Response {
    let limit = match parse_limit(q.limit.as_deref()) {
        Ok(limit) => limit,
        Err(e) => return validation_failed(e),
    };

    state.pipeline.gate().enforce_gate("scraped_leads.read", false);

    match state.pipeline.store().fetch_leads(limit as usize).await {
        Ok(leads) => Json(serde_json::json!({
            "success": true,
            "count": leads.len(),
            "leads": leads,
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to read scraped leads");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({
                    "success": false,
                    "leads": [],
                    "count": 0,
                    "error": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_bounds() {
        assert_eq!(parse_limit(None).unwrap(), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some(" ")).unwrap(), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("25")).unwrap(), 25);
        assert!(parse_limit(Some("0")).is_err());
        assert!(parse_limit(Some("5000")).is_err());
        assert!(parse_limit(Some("many")).is_err());
    }
}
