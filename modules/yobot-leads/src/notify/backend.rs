use async_trait::async_trait;

use yobot_common::CampaignRecord;

/// Pluggable notification backend for campaign summaries.
#[async_trait]
pub trait NotifyBackend: Send + Sync {
    /// Post a one-message summary of a scrape invocation.
    async fn send_campaign(&self, record: &CampaignRecord) -> anyhow::Result<()>;
}
