use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use phantombuster_client::{ContainerState, PhantomBusterClient, ProfileResult};
use yobot_common::{filter_str, filter_u32, Filters, Lead, LeadSource, YobotError};

use super::{clean, clean_or_empty, LeadProvider, ProviderFetch};

const DASHBOARD_URL: &str = "https://phantombuster.com/dashboard";

/// Keys consumed to build the agent argument. Anything else passes through.
const CONSUMED_KEYS: &[&str] = &["searchUrl", "keywords", "limit"];

pub struct PhantomBusterProvider {
    client: Option<PhantomBusterClient>,
    agent_id: Option<String>,
    session_cookie: Option<String>,
}

impl PhantomBusterProvider {
    pub fn new(
        api_key: Option<String>,
        agent_id: Option<String>,
        session_cookie: Option<String>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            client: api_key.map(|key| PhantomBusterClient::with_http(key, http)),
            agent_id,
            session_cookie,
        }
    }

    fn client(&self) -> Result<&PhantomBusterClient> {
        self.client
            .as_ref()
            .ok_or_else(|| YobotError::Config("PhantomBuster API key not configured".into()).into())
    }
}

#[async_trait]
impl LeadProvider for PhantomBusterProvider {
    fn source(&self) -> LeadSource {
        LeadSource::Phantombuster
    }

    fn has_credentials(&self) -> bool {
        self.client.is_some() && self.agent_id.is_some()
    }

    async fn fetch(&self, filters: &Filters, _session_id: &str) -> Result<ProviderFetch> {
        let client = self.client()?;
        let Some(agent_id) = self.agent_id.as_deref() else {
            return Err(YobotError::Config("PhantomBuster agent id not configured".into()).into());
        };

        let argument = build_argument(filters, self.session_cookie.as_deref());
        let launched = client
            .launch_agent(agent_id, &argument)
            .await
            .map_err(|e| YobotError::Provider(format!("PhantomBuster: {e}")))?;

        Ok(ProviderFetch::Pending {
            advisory: advisory(&launched.container_id),
            job_id: launched.container_id,
        })
    }

    async fn poll(&self, job_id: &str, session_id: &str) -> Result<ProviderFetch> {
        let client = self.client()?;
        let container = client
            .fetch_container(job_id)
            .await
            .map_err(|e| YobotError::Provider(format!("PhantomBuster: {e}")))?;

        match container.state() {
            ContainerState::Running => Ok(ProviderFetch::Pending {
                job_id: job_id.to_string(),
                advisory: format!("PhantomBuster job {job_id} is still running ({}).", container.status),
            }),
            ContainerState::Failed(code) => Ok(ProviderFetch::JobFailed(
                phantombuster_client::PhantomBusterError::ContainerFailed {
                    container_id: job_id.to_string(),
                    exit_code: code,
                }
                .to_string(),
            )),
            ContainerState::Finished => {
                let profiles = client
                    .fetch_profiles(job_id)
                    .await
                    .map_err(|e| YobotError::Provider(format!("PhantomBuster: {e}")))?;
                let received = profiles.len();
                let leads = map_profiles(profiles, session_id);
                info!(job_id, received, kept = leads.len(), "Mapped PhantomBuster profiles");
                Ok(ProviderFetch::Leads(leads))
            }
        }
    }
}

/// Agent argument: session cookie, search, profile count, then any other
/// filter keys untouched.
pub fn build_argument(filters: &Filters, session_cookie: Option<&str>) -> Value {
    let mut argument = serde_json::Map::new();

    for (key, value) in filters {
        if !CONSUMED_KEYS.contains(&key.as_str()) {
            argument.insert(key.clone(), value.clone());
        }
    }
    if let Some(cookie) = session_cookie {
        argument.insert("sessionCookie".into(), Value::String(cookie.to_string()));
    }
    if let Some(search) = filter_str(filters, "searchUrl").or_else(|| filter_str(filters, "keywords")) {
        argument.insert("search".into(), Value::String(search));
    }
    if let Some(limit) = filter_u32(filters, "limit") {
        argument.insert("numberOfProfiles".into(), Value::from(limit));
    }

    Value::Object(argument)
}

pub fn advisory(container_id: &str) -> String {
    format!(
        "PhantomBuster runs asynchronously. Results are not available yet; \
         check GET /api/scraping/phantombuster/{container_id} or the PhantomBuster dashboard ({DASHBOARD_URL})."
    )
}

/// Keep profiles with both a name and a company.
pub fn map_profiles(profiles: Vec<ProfileResult>, session_id: &str) -> Vec<Lead> {
    profiles
        .into_iter()
        .filter_map(|profile| {
            let full_name = clean(Some(&profile.display_name()))?;
            let company = clean(profile.company_name.as_deref())?;

            let mut lead = Lead::new(LeadSource::Phantombuster, session_id);
            lead.full_name = full_name;
            lead.company = company;
            lead.title = clean_or_empty(profile.title.as_deref());
            lead.location = clean_or_empty(profile.location.as_deref());
            lead.industry = clean_or_empty(profile.industry.as_deref());
            lead.website = clean_or_empty(profile.company_url.as_deref());
            lead.linkedin_url = clean_or_empty(profile.profile_url.as_deref());
            lead.email = clean(profile.email.as_deref());
            lead.phone = clean(profile.phone_number.as_deref());
            Some(lead)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(name: Option<&str>, company: Option<&str>) -> ProfileResult {
        ProfileResult {
            full_name: name.map(Into::into),
            company_name: company.map(Into::into),
            title: Some("Head of Ops".into()),
            profile_url: Some("https://linkedin.com/in/a".into()),
            ..Default::default()
        }
    }

    #[test]
    fn requires_name_and_company() {
        let leads = map_profiles(
            vec![
                profile(Some("Ann Lee"), Some("Globex")),
                profile(Some("No Company"), None),
                profile(None, Some("Nameless Inc")),
            ],
            "phantombuster-1",
        );
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].full_name, "Ann Lee");
        assert_eq!(leads[0].linkedin_url, "https://linkedin.com/in/a");
        assert_eq!(leads[0].source, LeadSource::Phantombuster);
    }

    #[test]
    fn argument_carries_cookie_search_and_passthrough() {
        let filters = json!({"searchUrl": "https://linkedin.com/search?q=cto", "limit": "40", "circles": ["2nd"]});
        let argument = build_argument(filters.as_object().unwrap(), Some("li_at=abc"));
        assert_eq!(argument["sessionCookie"], "li_at=abc");
        assert_eq!(argument["search"], "https://linkedin.com/search?q=cto");
        assert_eq!(argument["numberOfProfiles"], 40);
        assert_eq!(argument["circles"], json!(["2nd"]));
        assert!(argument.get("searchUrl").is_none());
    }

    #[test]
    fn keywords_used_when_no_search_url() {
        let filters = json!({"keywords": "founder saas"});
        let argument = build_argument(filters.as_object().unwrap(), None);
        assert_eq!(argument["search"], "founder saas");
        assert!(argument.get("sessionCookie").is_none());
    }

    #[test]
    fn advisory_names_status_endpoint_and_dashboard() {
        let text = advisory("c-42");
        assert!(text.contains("/api/scraping/phantombuster/c-42"));
        assert!(text.contains("dashboard"));
    }

    #[test]
    fn credentials_need_key_and_agent() {
        let http = reqwest::Client::new();
        assert!(!PhantomBusterProvider::new(Some("k".into()), None, None, http.clone()).has_credentials());
        assert!(PhantomBusterProvider::new(Some("k".into()), Some("a".into()), None, http).has_credentials());
    }
}
