use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use yobot_common::{CampaignRecord, CampaignStatus, CircuitBreaker, YobotError};

use super::backend::NotifyBackend;

/// Slack incoming webhook notification backend.
pub struct SlackWebhook {
    webhook_url: String,
    http: reqwest::Client,
    breaker: CircuitBreaker,
}

impl SlackWebhook {
    pub fn new(webhook_url: String, http: reqwest::Client, failure_threshold: u32, recovery: Duration) -> Self {
        Self {
            webhook_url,
            http,
            breaker: CircuitBreaker::new("slack", failure_threshold, recovery),
        }
    }

    fn status_emoji(status: CampaignStatus) -> &'static str {
        match status {
            CampaignStatus::Success => ":white_check_mark:",
            CampaignStatus::Pending => ":hourglass_flowing_sand:",
            CampaignStatus::Skipped => ":pause_button:",
            CampaignStatus::Failed => ":rotating_light:",
        }
    }

    async fn post(&self, payload: serde_json::Value) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Slack webhook returned non-success");
            return Err(YobotError::Notify(format!("Slack webhook returned {status}")).into());
        }

        Ok(())
    }
}

pub fn campaign_text(record: &CampaignRecord) -> String {
    let mut text = format!(
        "{} *Lead scrape: {}*\n\
         *Status:* {}\n\
         *Mode:* {}\n\
         *Leads:* {}\n\
         *Session:* `{}`",
        SlackWebhook::status_emoji(record.status),
        record.tool,
        record.status,
        record.mode,
        record.lead_count,
        record.session_id,
    );
    if let Some(detail) = &record.detail {
        text.push_str(&format!("\n_{detail}_"));
    }
    text
}

#[async_trait]
impl NotifyBackend for SlackWebhook {
    async fn send_campaign(&self, record: &CampaignRecord) -> anyhow::Result<()> {
        let payload = json!({
            "text": campaign_text(record),
            "unfurl_links": false,
        });

        self.breaker
            .call(self.post(payload))
            .await
            .map_err(|e| YobotError::Notify(e.to_string()).into())
    }
}
