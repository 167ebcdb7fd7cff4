use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use yobot_leads::LeadPipeline;

pub mod rest;

pub struct AppState {
    pub pipeline: LeadPipeline,
}

impl AppState {
    pub fn new(pipeline: LeadPipeline) -> Arc<Self> {
        Arc::new(Self { pipeline })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        // Scraping
        .route("/api/scraping/apollo", post(rest::scraping::api_scrape_apollo))
        .route("/api/scraping/apify", post(rest::scraping::api_scrape_apify))
        .route(
            "/api/scraping/phantombuster",
            post(rest::scraping::api_scrape_phantombuster),
        )
        .route(
            "/api/scraping/phantombuster/{job_id}",
            get(rest::scraping::api_phantombuster_status),
        )
        .route("/api/launch-scrape", post(rest::scraping::api_launch_scrape))
        // Leads
        .route("/api/scraped-leads", get(rest::leads::api_scraped_leads))
        // Mode
        .route("/api/set-mode", post(rest::mode::api_set_mode))
        .route("/api/get-mode", get(rest::mode::api_get_mode))
        .route("/api/mode-audit", get(rest::mode::api_mode_audit))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}
