//! Fire-and-forget audit trail: one campaign record per scrape invocation,
//! plus integration events for mode changes and gate refusals.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use airtable_client::Fields;
use yobot_common::{CampaignRecord, SystemMode};

use crate::notify::NotifyBackend;
use crate::traits::{RecordTable, CREATED_AT_FIELD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrationEventKind {
    ModeChanged,
    GateBlocked,
    PollutionRejected,
}

impl IntegrationEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationEventKind::ModeChanged => "mode_changed",
            IntegrationEventKind::GateBlocked => "gate_blocked",
            IntegrationEventKind::PollutionRejected => "pollution_rejected",
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntegrationEvent {
    pub kind: IntegrationEventKind,
    pub operation: String,
    pub mode: SystemMode,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl IntegrationEvent {
    pub fn new(kind: IntegrationEventKind, operation: &str, mode: SystemMode, detail: impl Into<String>) -> Self {
        Self {
            kind,
            operation: operation.to_string(),
            mode,
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

pub struct CampaignLogger {
    table: Option<Arc<dyn RecordTable>>,
    campaign_table: String,
    integration_table: String,
    notifier: Arc<dyn NotifyBackend>,
}

impl CampaignLogger {
    pub fn new(
        table: Option<Arc<dyn RecordTable>>,
        campaign_table: impl Into<String>,
        integration_table: impl Into<String>,
        notifier: Arc<dyn NotifyBackend>,
    ) -> Self {
        Self {
            table,
            campaign_table: campaign_table.into(),
            integration_table: integration_table.into(),
            notifier,
        }
    }

    /// Write the record and post the summary concurrently in the background.
    /// Failures are logged, never returned.
    pub fn log(&self, record: CampaignRecord) -> JoinHandle<()> {
        let table = self.table.clone();
        let table_name = self.campaign_table.clone();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let write = async {
                let Some(table) = table else {
                    debug!(session = %record.session_id, "Campaign table not configured");
                    return;
                };
                if let Err(e) = table.create_records(&table_name, &[campaign_fields(&record)]).await {
                    warn!(error = %e, session = %record.session_id, "Failed to write campaign record");
                }
            };
            let notify = async {
                if let Err(e) = notifier.send_campaign(&record).await {
                    warn!(error = %e, session = %record.session_id, "Failed to send campaign notification");
                }
            };
            futures::join!(write, notify);
        })
    }

    /// Append an integration event in the background.
    pub fn log_event(&self, event: IntegrationEvent) -> JoinHandle<()> {
        let table = self.table.clone();
        let table_name = self.integration_table.clone();

        tokio::spawn(async move {
            let Some(table) = table else {
                return;
            };
            if let Err(e) = table.create_records(&table_name, &[event_fields(&event)]).await {
                warn!(error = %e, event = event.kind.as_str(), "Failed to write integration event");
            }
        })
    }
}

pub fn campaign_fields(record: &CampaignRecord) -> Fields {
    let mut fields = Fields::new();
    fields.insert("Tool".into(), Value::from(record.tool.as_str()));
    fields.insert("Timestamp".into(), Value::from(record.timestamp.to_rfc3339()));
    fields.insert(CREATED_AT_FIELD.into(), Value::from(record.timestamp.to_rfc3339()));
    fields.insert("Mode".into(), Value::from(record.mode.as_str()));
    fields.insert("Filters".into(), Value::from(record.filters.clone()));
    fields.insert("Lead Count".into(), Value::from(record.lead_count));
    fields.insert("Status".into(), Value::from(record.status.as_str()));
    fields.insert("Session ID".into(), Value::from(record.session_id.clone()));
    if let Some(detail) = &record.detail {
        fields.insert("Detail".into(), Value::from(detail.clone()));
    }
    fields
}

pub fn event_fields(event: &IntegrationEvent) -> Fields {
    let mut fields = Fields::new();
    fields.insert("Event".into(), Value::from(event.kind.as_str()));
    fields.insert("Operation".into(), Value::from(event.operation.clone()));
    fields.insert("Mode".into(), Value::from(event.mode.as_str()));
    fields.insert("Detail".into(), Value::from(event.detail.clone()));
    fields.insert(CREATED_AT_FIELD.into(), Value::from(event.timestamp.to_rfc3339()));
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTable, RecordingNotifier};
    use yobot_common::{CampaignStatus, LeadSource};

    fn record() -> CampaignRecord {
        CampaignRecord {
            tool: LeadSource::Apollo,
            timestamp: Utc::now(),
            mode: SystemMode::Test,
            filters: r#"{"jobTitles":["CEO"]}"#.into(),
            lead_count: 0,
            status: CampaignStatus::Skipped,
            session_id: "apollo-1".into(),
            detail: Some("test mode: provider not called".into()),
        }
    }

    #[tokio::test]
    async fn writes_record_and_notifies() {
        let table = Arc::new(MockTable::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let logger = CampaignLogger::new(Some(table.clone()), "Campaigns", "Events", notifier.clone());

        logger.log(record()).await.unwrap();

        let rows = table.rows("Campaigns");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Status"], "skipped");
        assert_eq!(rows[0]["Filters"], r#"{"jobTitles":["CEO"]}"#);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn table_failure_does_not_stop_notification() {
        let table = Arc::new(MockTable::new().failing_on(0));
        let notifier = Arc::new(RecordingNotifier::new());
        let logger = CampaignLogger::new(Some(table.clone()), "Campaigns", "Events", notifier.clone());

        logger.log(record()).await.unwrap();

        assert!(table.rows("Campaigns").is_empty());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn events_go_to_integration_table() {
        let table = Arc::new(MockTable::new());
        let logger = CampaignLogger::new(
            Some(table.clone()),
            "Campaigns",
            "Events",
            Arc::new(crate::notify::NoopBackend),
        );
        logger
            .log_event(IntegrationEvent::new(
                IntegrationEventKind::GateBlocked,
                "lead_store.write",
                SystemMode::Test,
                "3 leads not stored",
            ))
            .await
            .unwrap();
        let rows = table.rows("Events");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["Event"], "gate_blocked");
    }
}
