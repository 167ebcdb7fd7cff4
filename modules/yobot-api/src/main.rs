use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use yobot_api::{router, AppState};
use yobot_common::Config;
use yobot_leads::LeadPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("yobot=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let pipeline = LeadPipeline::from_config(&config)?;
    info!(mode = %pipeline.gate().mode(), "Lead pipeline ready");

    let app = router(AppState::new(pipeline));

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("YoBot API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
