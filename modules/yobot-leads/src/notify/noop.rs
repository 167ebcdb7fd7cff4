use async_trait::async_trait;

use yobot_common::CampaignRecord;

use super::backend::NotifyBackend;

/// Used when no webhook is configured.
pub struct NoopBackend;

#[async_trait]
impl NotifyBackend for NoopBackend {
    async fn send_campaign(&self, _record: &CampaignRecord) -> anyhow::Result<()> {
        Ok(())
    }
}
