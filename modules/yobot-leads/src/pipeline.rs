use std::sync::Arc;

use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use airtable_client::AirtableClient;
use yobot_common::{CampaignRecord, CircuitBreaker, Config, Filters, Lead, LeadSource, SystemMode};

use crate::campaign::{CampaignLogger, IntegrationEvent, IntegrationEventKind};
use crate::gate::{ModeGate, ScrapeContext};
use crate::jobs::{CollectedJob, JobRegistry, JobTicket, PollStart};
use crate::normalize::normalize_batch;
use crate::notify::{NoopBackend, NotifyBackend, SlackWebhook};
use crate::providers::{ProviderSet, ScrapeOutcome};
use crate::store::LeadStore;
use crate::traits::RecordTable;

pub const STORE_WRITE_OP: &str = "lead_store.write";

/// What one scrape (or job poll) produced.
#[derive(Debug)]
pub struct ScrapeReport {
    pub session_id: String,
    pub source: LeadSource,
    pub mode: SystemMode,
    /// For `LiveData`, the normalized, deduplicated leads.
    pub outcome: ScrapeOutcome,
    pub stored: usize,
    pub duplicates_dropped: usize,
    pub rejected_as_test_data: usize,
    pub failed_chunks: usize,
    /// Background campaign write, when this call produced a campaign record.
    /// Dropping it detaches the task.
    pub campaign_log: Option<JoinHandle<()>>,
}

impl ScrapeReport {
    /// A report that stored nothing and wrote no campaign record.
    fn quiet(ctx: ScrapeContext, outcome: ScrapeOutcome) -> Self {
        Self {
            session_id: ctx.session_id,
            source: ctx.source,
            mode: ctx.mode,
            outcome,
            stored: 0,
            duplicates_dropped: 0,
            rejected_as_test_data: 0,
            failed_chunks: 0,
            campaign_log: None,
        }
    }

    /// Replay a job collected by an earlier poll.
    fn replayed(ticket: &JobTicket, done: CollectedJob) -> Self {
        Self {
            session_id: ticket.session_id.clone(),
            source: ticket.source,
            mode: done.mode,
            outcome: done.outcome,
            stored: done.stored,
            duplicates_dropped: done.duplicates_dropped,
            rejected_as_test_data: done.rejected_as_test_data,
            failed_chunks: done.failed_chunks,
            campaign_log: None,
        }
    }

    /// Wait for the background campaign write, if any.
    pub async fn wait_for_campaign_log(&mut self) {
        if let Some(handle) = self.campaign_log.take() {
            if let Err(e) = handle.await {
                warn!(session = %self.session_id, error = %e, "Campaign log task failed");
            }
        }
    }

    pub fn leads(&self) -> &[Lead] {
        match &self.outcome {
            ScrapeOutcome::LiveData(leads) => leads,
            _ => &[],
        }
    }

    pub fn advisory(&self) -> Option<String> {
        self.outcome.detail()
    }

    pub fn job_id(&self) -> Option<&str> {
        match &self.outcome {
            ScrapeOutcome::Pending { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    pub fn is_live_data(&self) -> bool {
        self.mode.is_live() && matches!(self.outcome, ScrapeOutcome::LiveData(_))
    }
}

/// Provider → normalizer → gate → store → campaign log.
pub struct LeadPipeline {
    providers: ProviderSet,
    store: LeadStore,
    logger: CampaignLogger,
    gate: Arc<ModeGate>,
    jobs: JobRegistry,
}

impl LeadPipeline {
    pub fn new(providers: ProviderSet, store: LeadStore, logger: CampaignLogger, gate: Arc<ModeGate>) -> Self {
        Self {
            providers,
            store,
            logger,
            gate,
            jobs: JobRegistry::new(),
        }
    }

    /// Wire every integration the configuration has credentials for.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()?;

        let table: Option<Arc<dyn RecordTable>> = config.airtable_credentials().map(|(key, base)| {
            Arc::new(AirtableClient::with_http(key.to_string(), base.to_string(), http.clone()))
                as Arc<dyn RecordTable>
        });

        let store = match &table {
            Some(table) => LeadStore::new(
                table.clone(),
                config.airtable_leads_table.clone(),
                config.store_batch_delay,
                CircuitBreaker::new(
                    "lead_store",
                    config.breaker_failure_threshold,
                    config.breaker_recovery,
                ),
            ),
            None => {
                warn!("Airtable not configured, leads will not be stored");
                LeadStore::disabled()
            }
        };

        let notifier: Arc<dyn NotifyBackend> = match &config.slack_webhook_url {
            Some(url) => Arc::new(SlackWebhook::new(
                url.clone(),
                http.clone(),
                config.breaker_failure_threshold,
                config.breaker_recovery,
            )),
            None => Arc::new(NoopBackend),
        };

        let logger = CampaignLogger::new(
            table,
            config.airtable_campaign_table.clone(),
            config.airtable_integration_log_table.clone(),
            notifier,
        );

        Ok(Self::new(
            ProviderSet::from_config(config, &http),
            store,
            logger,
            Arc::new(ModeGate::new(config.default_mode)),
        ))
    }

    pub fn gate(&self) -> &Arc<ModeGate> {
        &self.gate
    }

    pub fn store(&self) -> &LeadStore {
        &self.store
    }

    pub fn logger(&self) -> &CampaignLogger {
        &self.logger
    }

    /// Switch modes and append the change to the integration log.
    pub fn set_mode(&self, mode: SystemMode) -> SystemMode {
        let previous = self.gate.set_mode(mode);
        self.logger.log_event(IntegrationEvent::new(
            IntegrationEventKind::ModeChanged,
            "set_mode",
            mode,
            format!("{previous} -> {mode}"),
        ));
        previous
    }

    /// Run one provider with the given filters. An asynchronous launch is
    /// remembered so later polls reuse its session.
    pub async fn run(&self, source: LeadSource, filters: &Filters) -> ScrapeReport {
        let ctx = self.gate.begin(source);
        info!(source = %source, mode = %ctx.mode, session = %ctx.session_id, "Scrape started");

        let outcome = self.providers.scrape(&ctx, filters).await;
        let filters_json = serde_json::to_string(filters).unwrap_or_default();
        if let ScrapeOutcome::Pending { job_id, .. } = &outcome {
            self.jobs.track(JobTicket::launched(job_id, &ctx, &filters_json));
        }
        self.finish(ctx, outcome, filters_json).await
    }

    /// Check on an asynchronous provider job.
    ///
    /// The job's leads are stored and its campaign record written once, by
    /// the first poll that sees it finished. Later polls replay that result.
    pub async fn poll_job(&self, source: LeadSource, job_id: &str) -> ScrapeReport {
        let start = self.jobs.begin_poll(job_id, || {
            let ctx = self.gate.begin(source);
            let filters = serde_json::json!({ "jobId": job_id }).to_string();
            JobTicket::launched(job_id, &ctx, &filters)
        });

        let ticket = match start {
            PollStart::Poll(ticket) => ticket,
            PollStart::Collected(ticket, done) => {
                info!(job_id, session = %ticket.session_id, "Job already collected");
                return ScrapeReport::replayed(&ticket, done);
            }
            PollStart::Busy(ticket) => {
                return ScrapeReport::quiet(ticket.context(self.gate.mode()), collecting(job_id));
            }
        };

        let ctx = ticket.context(self.gate.mode());
        info!(source = %ctx.source, job_id, session = %ctx.session_id, "Polling scrape job");

        let polled = self.providers.poll(&ctx, job_id).await;
        if !polled.finished {
            return ScrapeReport::quiet(ctx, polled.outcome);
        }
        if !self.jobs.claim(job_id) {
            return ScrapeReport::quiet(ctx, collecting(job_id));
        }

        let report = self.finish(ctx, polled.outcome, ticket.filters).await;
        self.jobs.complete(
            job_id,
            CollectedJob {
                mode: report.mode,
                outcome: report.outcome.clone(),
                stored: report.stored,
                duplicates_dropped: report.duplicates_dropped,
                rejected_as_test_data: report.rejected_as_test_data,
                failed_chunks: report.failed_chunks,
            },
        );
        report
    }

    async fn finish(&self, ctx: ScrapeContext, outcome: ScrapeOutcome, filters_json: String) -> ScrapeReport {
        let mut stored = 0;
        let mut duplicates_dropped = 0;
        let mut rejected_as_test_data = 0;
        let mut failed_chunks = 0;

        let outcome = match outcome {
            ScrapeOutcome::LiveData(raw) => {
                let batch = normalize_batch(raw);
                duplicates_dropped = batch.duplicates_dropped;

                let admitted = self.gate.admit_leads(ctx.mode, STORE_WRITE_OP, batch.leads.clone());
                rejected_as_test_data = admitted.rejected;
                if admitted.blocked {
                    self.logger.log_event(IntegrationEvent::new(
                        IntegrationEventKind::GateBlocked,
                        STORE_WRITE_OP,
                        ctx.mode,
                        format!("{} leads not stored (session {})", batch.leads.len(), ctx.session_id),
                    ));
                }
                if admitted.rejected > 0 {
                    self.logger.log_event(IntegrationEvent::new(
                        IntegrationEventKind::PollutionRejected,
                        STORE_WRITE_OP,
                        ctx.mode,
                        format!("{} leads rejected as test data (session {})", admitted.rejected, ctx.session_id),
                    ));
                }

                if !admitted.leads.is_empty() {
                    let report = self.store.store_leads(&admitted.leads).await;
                    stored = report.stored;
                    failed_chunks = report.failures.len();
                }
                ScrapeOutcome::LiveData(batch.leads)
            }
            other => other,
        };

        let lead_count = match &outcome {
            ScrapeOutcome::LiveData(leads) => leads.len(),
            _ => 0,
        };
        let campaign_log = self.logger.log(CampaignRecord {
            tool: ctx.source,
            timestamp: ctx.started_at,
            mode: ctx.mode,
            filters: filters_json,
            lead_count,
            status: outcome.campaign_status(),
            session_id: ctx.session_id.clone(),
            detail: outcome.detail(),
        });

        info!(
            source = %ctx.source,
            session = %ctx.session_id,
            outcome = outcome.kind(),
            leads = lead_count,
            stored,
            duplicates_dropped,
            rejected_as_test_data,
            "Scrape finished"
        );

        ScrapeReport {
            session_id: ctx.session_id,
            source: ctx.source,
            mode: ctx.mode,
            outcome,
            stored,
            duplicates_dropped,
            rejected_as_test_data,
            failed_chunks,
            campaign_log: Some(campaign_log),
        }
    }
}

fn collecting(job_id: &str) -> ScrapeOutcome {
    ScrapeOutcome::Pending {
        job_id: job_id.to_string(),
        advisory: format!("Results for job {job_id} are being stored."),
    }
}
