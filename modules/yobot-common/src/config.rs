use std::time::Duration;

use tracing::{info, warn};

use crate::types::SystemMode;
use crate::validation::is_valid_url;

pub const DEFAULT_APIFY_ACTOR: &str = "compass~crawler-google-places";
pub const DEFAULT_LEADS_TABLE: &str = "Scraped Leads";
pub const DEFAULT_CAMPAIGN_TABLE: &str = "Scraping Campaigns";
pub const DEFAULT_INTEGRATION_LOG_TABLE: &str = "Integration Test Log";

/// Application configuration loaded from environment variables.
///
/// Nothing is required. A missing credential disables the integration that
/// needs it, which degrades to "no live data" instead of failing startup.
#[derive(Debug, Clone)]
pub struct Config {
    // Providers
    pub apollo_api_key: Option<String>,
    pub apify_api_key: Option<String>,
    pub apify_actor_id: String,
    pub phantombuster_api_key: Option<String>,
    pub phantombuster_agent_id: Option<String>,
    pub linkedin_session_cookie: Option<String>,

    // Lead store
    pub airtable_api_key: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_leads_table: String,
    pub airtable_campaign_table: String,
    pub airtable_integration_log_table: String,
    pub store_batch_delay: Duration,

    // Notifications
    pub slack_webhook_url: Option<String>,

    // Behaviour
    pub default_mode: SystemMode,
    pub breaker_failure_threshold: u32,
    pub breaker_recovery: Duration,
    pub provider_timeout: Duration,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as absent.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let default_mode = match get("YOBOT_DEFAULT_MODE") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                warn!(error = %e, "Invalid YOBOT_DEFAULT_MODE, starting in test mode");
                SystemMode::Test
            }),
            None => SystemMode::Test,
        };

        let slack_webhook_url = get("SLACK_WEBHOOK_URL").filter(|url| {
            let ok = is_valid_url(url);
            if !ok {
                warn!("SLACK_WEBHOOK_URL is not an http(s) URL, notifications disabled");
            }
            ok
        });

        Self {
            apollo_api_key: get("APOLLO_API_KEY"),
            apify_api_key: get("APIFY_API_KEY"),
            apify_actor_id: get("APIFY_ACTOR_ID").unwrap_or_else(|| DEFAULT_APIFY_ACTOR.to_string()),
            phantombuster_api_key: get("PHANTOMBUSTER_API_KEY"),
            phantombuster_agent_id: get("PHANTOMBUSTER_AGENT_ID"),
            linkedin_session_cookie: get("LINKEDIN_SESSION_COOKIE"),
            airtable_api_key: get("AIRTABLE_API_KEY"),
            airtable_base_id: get("AIRTABLE_BASE_ID"),
            airtable_leads_table: get("AIRTABLE_LEADS_TABLE")
                .unwrap_or_else(|| DEFAULT_LEADS_TABLE.to_string()),
            airtable_campaign_table: get("AIRTABLE_CAMPAIGN_TABLE")
                .unwrap_or_else(|| DEFAULT_CAMPAIGN_TABLE.to_string()),
            airtable_integration_log_table: get("AIRTABLE_INTEGRATION_LOG_TABLE")
                .unwrap_or_else(|| DEFAULT_INTEGRATION_LOG_TABLE.to_string()),
            store_batch_delay: Duration::from_millis(parse_or(&get, "STORE_BATCH_DELAY_MS", 200)),
            slack_webhook_url,
            default_mode,
            breaker_failure_threshold: parse_or(&get, "BREAKER_FAILURE_THRESHOLD", 5),
            breaker_recovery: Duration::from_secs(parse_or(&get, "BREAKER_RECOVERY_SECS", 60)),
            provider_timeout: Duration::from_secs(parse_or(&get, "PROVIDER_TIMEOUT_SECS", 120)),
            api_host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            api_port: parse_or(&get, "API_PORT", 3000),
        }
    }

    /// Airtable needs both the key and the base.
    pub fn airtable_credentials(&self) -> Option<(&str, &str)> {
        Some((self.airtable_api_key.as_deref()?, self.airtable_base_id.as_deref()?))
    }

    /// Log which integrations are configured, never the secrets themselves.
    pub fn log_redacted(&self) {
        info!(
            apollo = self.apollo_api_key.is_some(),
            apify = self.apify_api_key.is_some(),
            apify_actor = %self.apify_actor_id,
            phantombuster = self.phantombuster_api_key.is_some() && self.phantombuster_agent_id.is_some(),
            linkedin_cookie = self.linkedin_session_cookie.is_some(),
            airtable = self.airtable_credentials().is_some(),
            slack = self.slack_webhook_url.is_some(),
            default_mode = %self.default_mode,
            "Configuration loaded"
        );
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, default = %default, "Unparseable value, using default");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let c = config(&[]);
        assert!(c.apollo_api_key.is_none());
        assert!(c.airtable_credentials().is_none());
        assert_eq!(c.default_mode, SystemMode::Test);
        assert_eq!(c.store_batch_delay, Duration::from_millis(200));
        assert_eq!(c.airtable_leads_table, DEFAULT_LEADS_TABLE);
        assert_eq!(c.apify_actor_id, DEFAULT_APIFY_ACTOR);
        assert_eq!(c.api_port, 3000);
    }

    #[test]
    fn blank_values_are_absent() {
        let c = config(&[("APOLLO_API_KEY", "   "), ("AIRTABLE_API_KEY", "key")]);
        assert!(c.apollo_api_key.is_none());
        assert!(c.airtable_credentials().is_none());
    }

    #[test]
    fn bad_numbers_and_modes_fall_back() {
        let c = config(&[
            ("API_PORT", "eighty"),
            ("STORE_BATCH_DELAY_MS", "50"),
            ("YOBOT_DEFAULT_MODE", "production"),
        ]);
        assert_eq!(c.api_port, 3000);
        assert_eq!(c.store_batch_delay, Duration::from_millis(50));
        assert_eq!(c.default_mode, SystemMode::Test);
    }

    #[test]
    fn invalid_webhook_is_dropped() {
        assert!(config(&[("SLACK_WEBHOOK_URL", "not-a-url")]).slack_webhook_url.is_none());
        assert!(config(&[("SLACK_WEBHOOK_URL", "https://hooks.slack.com/x")])
            .slack_webhook_url
            .is_some());
    }

    #[test]
    fn live_mode_can_be_default() {
        assert_eq!(config(&[("YOBOT_DEFAULT_MODE", "Live")]).default_mode, SystemMode::Live);
    }
}
