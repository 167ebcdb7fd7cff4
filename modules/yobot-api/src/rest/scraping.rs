use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use yobot_common::{FieldError, Filters, Lead, LeadSource, SystemMode, ValidationError, Validator};
use yobot_leads::ScrapeReport;

use super::validation_failed;
use crate::AppState;

const TOOLS: &[&str] = &["apollo", "apify", "phantombuster"];

#[derive(Deserialize, Default)]
pub struct ScrapeRequest {
    #[serde(default)]
    filters: Option<Value>,
}

#[derive(Deserialize)]
pub struct LaunchRequest {
    tool: Option<String>,
    #[serde(default)]
    filters: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub leads: Vec<Lead>,
    pub count: usize,
    pub mode: SystemMode,
    pub is_live_data: bool,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub outcome: &'static str,
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub stored: usize,
    pub duplicates_dropped: usize,
}

impl From<ScrapeReport> for ScrapeResponse {
    fn from(report: ScrapeReport) -> Self {
        let leads = report.leads().to_vec();
        Self {
            // Provider failures stay `success: true`; `degraded` tells them apart.
            success: true,
            count: leads.len(),
            leads,
            mode: report.mode,
            is_live_data: report.is_live_data(),
            timestamp: Utc::now(),
            outcome: report.outcome.kind(),
            degraded: report.outcome.is_degraded(),
            message: report.advisory(),
            job_id: report.job_id().map(str::to_string),
            stored: report.stored,
            duplicates_dropped: report.duplicates_dropped,
            session_id: report.session_id,
        }
    }
}

/// Filters must be a JSON object when given. Absent or null means no filters.
fn parse_filters(filters: Option<Value>) -> Result<Filters, ValidationError> {
    match filters {
        None | Some(Value::Null) => Ok(Filters::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Validator::new()
            .error("filters", "must be a JSON object")
            .finish()
            .map(|_| Filters::new()),
    }
}

async fn scrape(state: &AppState, source: LeadSource, filters: Option<Value>) -> Response {
    let filters = match parse_filters(filters) {
        Ok(f) => f,
        Err(e) => return validation_failed(e),
    };
    let report = state.pipeline.run(source, &filters).await;
    Json(ScrapeResponse::from(report)).into_response()
}

pub async fn api_scrape_apollo(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScrapeRequest>,
) -> Response {
    scrape(&state, LeadSource::Apollo, body.filters).await
}

pub async fn api_scrape_apify(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScrapeRequest>,
) -> Response {
    scrape(&state, LeadSource::Apify, body.filters).await
}

pub async fn api_scrape_phantombuster(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScrapeRequest>,
) -> Response {
    scrape(&state, LeadSource::Phantombuster, body.filters).await
}

pub async fn api_phantombuster_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Response {
    let report = state
        .pipeline
        .poll_job(LeadSource::Phantombuster, job_id.trim())
        .await;
    Json(ScrapeResponse::from(report)).into_response()
}

/// Dispatch by `tool` to one of the scraping endpoints.
pub async fn api_launch_scrape(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LaunchRequest>,
) -> Response {
    let tool = body.tool.as_deref().unwrap_or_default();
    let mut validator = Validator::new();
    validator.required("tool", Some(tool));
    if !tool.trim().is_empty() {
        validator.one_of("tool", tool, TOOLS);
    }

    let source = match (validator.finish(), tool.parse::<LeadSource>()) {
        (Ok(()), Ok(source)) => source,
        (Err(e), _) => return validation_failed(e),
        (Ok(()), Err(message)) => {
            return validation_failed(ValidationError {
                errors: vec![FieldError {
                    field: "tool".into(),
                    message,
                }],
            })
        }
    };
    scrape(&state, source, body.filters).await
}
