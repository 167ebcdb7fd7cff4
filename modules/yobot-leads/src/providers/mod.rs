pub mod apify;
pub mod apollo;
pub mod phantombuster;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use yobot_common::{BreakerError, CampaignStatus, CircuitBreaker, Config, Filters, Lead, LeadSource, YobotError};

use crate::gate::ScrapeContext;

/// What a provider call produced.
#[derive(Debug, Clone)]
pub enum ProviderFetch {
    Leads(Vec<Lead>),
    /// The provider accepted an asynchronous job; results come later.
    Pending { job_id: String, advisory: String },
    /// The asynchronous job ended without results. Final, unlike a failed call.
    JobFailed(String),
}

/// One adapter per scraping service: filters in, common `Lead`s out.
#[async_trait]
pub trait LeadProvider: Send + Sync {
    fn source(&self) -> LeadSource;

    /// False when the API key (or other required credential) is absent.
    fn has_credentials(&self) -> bool;

    /// Make exactly one provider call. No retry.
    async fn fetch(&self, filters: &Filters, session_id: &str) -> Result<ProviderFetch>;

    /// Check on a job previously returned as `Pending`.
    async fn poll(&self, job_id: &str, session_id: &str) -> Result<ProviderFetch> {
        let _ = (job_id, session_id);
        Err(YobotError::Unsupported {
            provider: self.source().to_string(),
            operation: "poll",
        }
        .into())
    }
}

/// Result of one adapter invocation. Keeps "nothing found", "misconfigured",
/// and "provider down" apart instead of collapsing them into an empty list.
#[derive(Debug, Clone)]
pub enum ScrapeOutcome {
    LiveData(Vec<Lead>),
    Pending { job_id: String, advisory: String },
    NoCredentials,
    TestMode,
    ProviderError(String),
}

impl ScrapeOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeOutcome::LiveData(_) => "live_data",
            ScrapeOutcome::Pending { .. } => "pending",
            ScrapeOutcome::NoCredentials => "no_credentials",
            ScrapeOutcome::TestMode => "test_mode",
            ScrapeOutcome::ProviderError(_) => "provider_error",
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ScrapeOutcome::ProviderError(_))
    }

    pub fn campaign_status(&self) -> CampaignStatus {
        match self {
            ScrapeOutcome::LiveData(_) => CampaignStatus::Success,
            ScrapeOutcome::Pending { .. } => CampaignStatus::Pending,
            ScrapeOutcome::NoCredentials | ScrapeOutcome::TestMode => CampaignStatus::Skipped,
            ScrapeOutcome::ProviderError(_) => CampaignStatus::Failed,
        }
    }

    /// Human-readable explanation for anything other than live data.
    pub fn detail(&self) -> Option<String> {
        match self {
            ScrapeOutcome::LiveData(_) => None,
            ScrapeOutcome::Pending { advisory, .. } => Some(advisory.clone()),
            ScrapeOutcome::NoCredentials => Some("provider credentials not configured".to_string()),
            ScrapeOutcome::TestMode => Some("test mode: provider not called".to_string()),
            ScrapeOutcome::ProviderError(e) => Some(e.clone()),
        }
    }
}

struct Registered {
    provider: Arc<dyn LeadProvider>,
    breaker: CircuitBreaker,
}

/// What polling an asynchronous job produced.
#[derive(Debug, Clone)]
pub struct PolledJob {
    pub outcome: ScrapeOutcome,
    /// The job reached a final state; polling it again cannot change the result.
    pub finished: bool,
}

/// The configured adapters, each behind its own circuit breaker.
pub struct ProviderSet {
    providers: HashMap<LeadSource, Registered>,
    failure_threshold: u32,
    recovery: Duration,
}

impl ProviderSet {
    pub fn new(failure_threshold: u32, recovery: Duration) -> Self {
        Self {
            providers: HashMap::new(),
            failure_threshold,
            recovery,
        }
    }

    pub fn with(mut self, provider: Arc<dyn LeadProvider>) -> Self {
        let source = provider.source();
        let breaker = CircuitBreaker::new(source.as_str(), self.failure_threshold, self.recovery);
        self.providers.insert(source, Registered { provider, breaker });
        self
    }

    /// All three adapters. Those without credentials stay registered and
    /// report `NoCredentials`.
    pub fn from_config(config: &Config, http: &reqwest::Client) -> Self {
        Self::new(config.breaker_failure_threshold, config.breaker_recovery)
            .with(Arc::new(apollo::ApolloProvider::new(
                config.apollo_api_key.clone(),
                http.clone(),
            )))
            .with(Arc::new(apify::ApifyProvider::new(
                config.apify_api_key.clone(),
                config.apify_actor_id.clone(),
                config.provider_timeout.as_secs(),
                http.clone(),
            )))
            .with(Arc::new(phantombuster::PhantomBusterProvider::new(
                config.phantombuster_api_key.clone(),
                config.phantombuster_agent_id.clone(),
                config.linkedin_session_cookie.clone(),
                http.clone(),
            )))
    }

    /// Run one adapter for a request.
    pub async fn scrape(&self, ctx: &ScrapeContext, filters: &Filters) -> ScrapeOutcome {
        let Some(registered) = self.ready(ctx) else {
            return self.skip_reason(ctx);
        };

        info!(source = %ctx.source, session = %ctx.session_id, "Calling provider");
        let result = registered
            .breaker
            .call(registered.provider.fetch(filters, &ctx.session_id))
            .await;
        into_outcome(ctx, result)
    }

    /// Check on an asynchronous job for a request.
    pub async fn poll(&self, ctx: &ScrapeContext, job_id: &str) -> PolledJob {
        let Some(registered) = self.ready(ctx) else {
            return PolledJob {
                outcome: self.skip_reason(ctx),
                finished: false,
            };
        };

        info!(source = %ctx.source, job_id, "Polling provider job");
        let result = registered
            .breaker
            .call(registered.provider.poll(job_id, &ctx.session_id))
            .await;
        let finished = matches!(result, Ok(ProviderFetch::Leads(_) | ProviderFetch::JobFailed(_)));
        PolledJob {
            outcome: into_outcome(ctx, result),
            finished,
        }
    }

    /// The adapter, if this request may call it.
    fn ready(&self, ctx: &ScrapeContext) -> Option<&Registered> {
        if !ctx.mode.is_live() {
            return None;
        }
        self.providers
            .get(&ctx.source)
            .filter(|r| r.provider.has_credentials())
    }

    fn skip_reason(&self, ctx: &ScrapeContext) -> ScrapeOutcome {
        if !ctx.mode.is_live() {
            info!(source = %ctx.source, "Test mode, provider not called");
            ScrapeOutcome::TestMode
        } else {
            info!(source = %ctx.source, "No credentials, provider not called");
            ScrapeOutcome::NoCredentials
        }
    }
}

fn into_outcome(ctx: &ScrapeContext, result: std::result::Result<ProviderFetch, BreakerError<anyhow::Error>>) -> ScrapeOutcome {
    match result {
        Ok(ProviderFetch::Leads(leads)) => {
            info!(source = %ctx.source, count = leads.len(), "Provider returned leads");
            ScrapeOutcome::LiveData(leads)
        }
        Ok(ProviderFetch::Pending { job_id, advisory }) => {
            info!(source = %ctx.source, job_id = %job_id, "Provider job pending");
            ScrapeOutcome::Pending { job_id, advisory }
        }
        Ok(ProviderFetch::JobFailed(reason)) => {
            warn!(source = %ctx.source, session = %ctx.session_id, reason = %reason, "Provider job failed");
            ScrapeOutcome::ProviderError(reason)
        }
        Err(e) => {
            warn!(source = %ctx.source, session = %ctx.session_id, error = %e, "Provider call failed");
            ScrapeOutcome::ProviderError(e.to_string())
        }
    }
}

/// Trim and drop empty strings.
pub(crate) fn clean(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

pub(crate) fn clean_or_empty(value: Option<&str>) -> String {
    clean(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::ModeGate;
    use crate::testing::{lead, MockProvider};
    use yobot_common::SystemMode;

    fn set(provider: MockProvider) -> (ProviderSet, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let set = ProviderSet::new(2, Duration::from_secs(60)).with(provider.clone());
        (set, provider)
    }

    #[tokio::test]
    async fn test_mode_never_calls_provider() {
        let (set, provider) = set(MockProvider::new(LeadSource::Apollo).with_leads(vec![lead(
            LeadSource::Apollo,
            "Jane Doe",
            "jane@acme.io",
            "Acme",
        )]));
        let ctx = ModeGate::new(SystemMode::Test).begin(LeadSource::Apollo);
        let outcome = set.scrape(&ctx, &Filters::new()).await;
        assert!(matches!(outcome, ScrapeOutcome::TestMode));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn missing_credentials_never_calls_provider() {
        let (set, provider) = set(MockProvider::new(LeadSource::Apify).without_credentials());
        let ctx = ModeGate::new(SystemMode::Live).begin(LeadSource::Apify);
        let outcome = set.scrape(&ctx, &Filters::new()).await;
        assert!(matches!(outcome, ScrapeOutcome::NoCredentials));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn unregistered_provider_reports_no_credentials() {
        let set = ProviderSet::new(2, Duration::from_secs(60));
        let ctx = ModeGate::new(SystemMode::Live).begin(LeadSource::Phantombuster);
        assert!(matches!(set.scrape(&ctx, &Filters::new()).await, ScrapeOutcome::NoCredentials));
    }

    #[tokio::test]
    async fn provider_failure_degrades_and_trips_breaker() {
        let (set, provider) = set(MockProvider::new(LeadSource::Apollo).failing("503 upstream"));
        let ctx = ModeGate::new(SystemMode::Live).begin(LeadSource::Apollo);

        for _ in 0..2 {
            let outcome = set.scrape(&ctx, &Filters::new()).await;
            assert!(outcome.is_degraded());
            assert_eq!(outcome.campaign_status(), CampaignStatus::Failed);
        }
        let outcome = set.scrape(&ctx, &Filters::new()).await;
        match outcome {
            ScrapeOutcome::ProviderError(msg) => assert!(msg.contains("open")),
            other => panic!("expected provider error, got {other:?}"),
        }
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn poll_unsupported_is_a_provider_error() {
        let (set, _provider) = set(MockProvider::new(LeadSource::Apollo));
        let ctx = ModeGate::new(SystemMode::Live).begin(LeadSource::Apollo);
        let polled = set.poll(&ctx, "job-1").await;
        assert_eq!(polled.outcome.kind(), "provider_error");
        assert!(!polled.finished);
    }

    #[tokio::test]
    async fn failed_job_is_final_and_does_not_trip_breaker() {
        let (set, provider) = set(MockProvider::new(LeadSource::Phantombuster).job_failing("exit code 1"));
        let ctx = ModeGate::new(SystemMode::Live).begin(LeadSource::Phantombuster);

        for _ in 0..3 {
            let polled = set.poll(&ctx, "c-1").await;
            assert!(polled.finished);
            assert!(polled.outcome.is_degraded());
        }
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn running_job_is_not_final() {
        let (set, _provider) = set(MockProvider::new(LeadSource::Phantombuster).pending("c-1").still_running());
        let ctx = ModeGate::new(SystemMode::Live).begin(LeadSource::Phantombuster);
        let polled = set.poll(&ctx, "c-1").await;
        assert_eq!(polled.outcome.kind(), "pending");
        assert!(!polled.finished);
    }
}
