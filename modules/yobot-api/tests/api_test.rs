//! HTTP contract tests: drive the router with in-memory providers and tables.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use yobot_api::{router, AppState};
use yobot_common::{CircuitBreaker, LeadSource, SystemMode};
use yobot_leads::store::lead_to_fields;
use yobot_leads::testing::{lead, leads, MockProvider, MockTable};
use yobot_leads::{CampaignLogger, LeadPipeline, LeadStore, ModeGate, NoopBackend, ProviderSet};

const LEADS: &str = "Scraped Leads";

fn app_with(mode: SystemMode, table: Arc<MockTable>, providers: Vec<MockProvider>) -> Router {
    let mut set = ProviderSet::new(5, Duration::from_secs(60));
    for provider in providers {
        set = set.with(Arc::new(provider));
    }
    let store = LeadStore::new(
        table.clone(),
        LEADS,
        Duration::ZERO,
        CircuitBreaker::new("lead_store", 5, Duration::from_secs(60)),
    );
    let logger = CampaignLogger::new(
        Some(table),
        "Scraping Campaigns",
        "Integration Test Log",
        Arc::new(NoopBackend),
    );
    let pipeline = LeadPipeline::new(set, store, logger, Arc::new(ModeGate::new(mode)));
    router(AppState::new(pipeline))
}

fn app(mode: SystemMode) -> Router {
    app_with(
        mode,
        Arc::new(MockTable::new()),
        vec![
            MockProvider::new(LeadSource::Apollo).with_leads(leads(LeadSource::Apollo, 3)),
            MockProvider::new(LeadSource::Apify).failing("API error (status 503): upstream down"),
            MockProvider::new(LeadSource::Phantombuster).pending("container-9"),
        ],
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_check() {
    let response = app(SystemMode::Test).oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}

#[tokio::test]
async fn test_mode_scrape_returns_empty_success() {
    let (status, body) = send(
        app(SystemMode::Test),
        post("/api/scraping/apollo", json!({"filters": {"jobTitles": ["CEO"]}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
    assert_eq!(body["mode"], "test");
    assert_eq!(body["isLiveData"], false);
    assert_eq!(body["outcome"], "test_mode");
    assert_eq!(body["degraded"], false);
    assert!(body["sessionId"].as_str().unwrap().starts_with("apollo-"));
}

#[tokio::test]
async fn live_scrape_returns_scored_leads() {
    let (status, body) = send(
        app(SystemMode::Live),
        post("/api/scraping/apollo", json!({"filters": {}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
    assert_eq!(body["stored"], 3);
    assert_eq!(body["isLiveData"], true);
    assert_eq!(body["outcome"], "live_data");
    assert_eq!(body["leads"][0]["source"], "apollo");
    assert!(body["leads"][0]["score"].as_u64().unwrap() <= 100);
}

#[tokio::test]
async fn provider_failure_keeps_success_shape_but_is_degraded() {
    let (status, body) = send(
        app(SystemMode::Live),
        post("/api/scraping/apify", json!({"filters": {"searchTerms": "plumbers"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
    assert_eq!(body["degraded"], true);
    assert_eq!(body["outcome"], "provider_error");
    assert!(body["message"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn phantombuster_launch_is_advisory_not_error() {
    let (status, body) = send(
        app(SystemMode::Live),
        post("/api/scraping/phantombuster", json!({"filters": {"searchUrl": "https://linkedin.com/search"}})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
    assert_eq!(body["outcome"], "pending");
    assert_eq!(body["jobId"], "container-9");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn launch_scrape_dispatches_by_tool() {
    let (status, body) = send(
        app(SystemMode::Live),
        post("/api/launch-scrape", json!({"tool": "Apollo", "filters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn launch_scrape_rejects_unknown_tool_and_bad_filters() {
    let (status, body) = send(
        app(SystemMode::Live),
        post("/api/launch-scrape", json!({"tool": "zoominfo", "filters": {}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "tool");

    let (status, body) = send(
        app(SystemMode::Live),
        post("/api/launch-scrape", json!({"tool": "apify", "filters": "plumbers"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "filters");

    let (status, _) = send(app(SystemMode::Live), post("/api/launch-scrape", json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn set_mode_validates_and_reports_previous() {
    let app = app(SystemMode::Test);

    let (status, body) = send(app.clone(), post("/api/set-mode", json!({"mode": "production"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["errors"][0]["field"], "mode");

    let (status, body) = send(app.clone(), post("/api/set-mode", json!({"mode": "LIVE"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "live");
    assert_eq!(body["previous"], "test");

    let (_, body) = send(app.clone(), get("/api/get-mode")).await;
    assert_eq!(body["mode"], "live");

    let (_, body) = send(app, get("/api/mode-audit")).await;
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.last().unwrap()["verdict"], "mode_changed");
}

#[tokio::test]
async fn scraped_leads_lists_newest_first_with_duplicate_flags() {
    let older = lead(LeadSource::Apollo, "Jane Doe", "jane@acme.io", "Acme");
    let newer = lead(LeadSource::Apify, "Jane Doe", "jane@acme.io", "Acme");
    let table = Arc::new(MockTable::new().with_rows(LEADS, vec![lead_to_fields(&older), lead_to_fields(&newer)]));

    let (status, body) = send(
        app_with(SystemMode::Test, table, Vec::new()),
        get("/api/scraped-leads?limit=10"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["leads"][0]["source"], "apify");
    assert_eq!(body["leads"][0]["isDuplicate"], true);
    assert_eq!(body["leads"][1]["isDuplicate"], false);
}

#[tokio::test]
async fn scraped_leads_read_failure_is_bad_gateway() {
    let table = Arc::new(MockTable::new().failing_reads());
    let (status, body) = send(app_with(SystemMode::Live, table, Vec::new()), get("/api/scraped-leads")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["count"], 0);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn scraped_leads_rejects_bad_limit() {
    let (status, body) = send(app(SystemMode::Test), get("/api/scraped-leads?limit=0")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "limit");
}

#[tokio::test]
async fn polling_a_finished_job_twice_stores_leads_once() {
    let table = Arc::new(MockTable::new());
    let app = app_with(
        SystemMode::Live,
        table.clone(),
        vec![MockProvider::new(LeadSource::Phantombuster)
            .pending("container-9")
            .on_poll(leads(LeadSource::Phantombuster, 4))],
    );

    let (_, launch) = send(
        app.clone(),
        post("/api/scraping/phantombuster", json!({"filters": {"keywords": "founder"}})),
    )
    .await;
    let (status, first) = send(app.clone(), get("/api/scraping/phantombuster/container-9")).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = send(app, get("/api/scraping/phantombuster/container-9")).await;

    assert_eq!(first["count"], 4);
    assert_eq!(second["count"], 4);
    assert_eq!(first["sessionId"], launch["sessionId"]);
    assert_eq!(second["sessionId"], launch["sessionId"]);
    assert_eq!(table.rows(LEADS).len(), 4);
}
