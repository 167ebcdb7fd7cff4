use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use apollo_client::{ApolloClient, PeopleSearchRequest, Person};
use yobot_common::{filter_list, filter_str, filter_u32, Filters, Lead, LeadSource, YobotError};

use super::{clean, clean_or_empty, LeadProvider, ProviderFetch};

const DEFAULT_PER_PAGE: u32 = 25;
const MAX_PER_PAGE: u32 = 100;

pub struct ApolloProvider {
    client: Option<ApolloClient>,
}

impl ApolloProvider {
    pub fn new(api_key: Option<String>, http: reqwest::Client) -> Self {
        Self {
            client: api_key.map(|key| ApolloClient::with_http(key, http)),
        }
    }
}

#[async_trait]
impl LeadProvider for ApolloProvider {
    fn source(&self) -> LeadSource {
        LeadSource::Apollo
    }

    fn has_credentials(&self) -> bool {
        self.client.is_some()
    }

    async fn fetch(&self, filters: &Filters, session_id: &str) -> Result<ProviderFetch> {
        let Some(client) = &self.client else {
            return Err(YobotError::Config("Apollo API key not configured".into()).into());
        };

        let request = build_request(filters);
        let response = client
            .search_people(&request)
            .await
            .map_err(|e| YobotError::Provider(format!("Apollo: {e}")))?;
        let received = response.people.len();
        let leads = map_people(response.people, session_id);
        info!(received, kept = leads.len(), "Mapped Apollo people");

        Ok(ProviderFetch::Leads(leads))
    }
}

/// Translate dashboard filters into an Apollo people search.
pub fn build_request(filters: &Filters) -> PeopleSearchRequest {
    let per_page = filter_u32(filters, "limit")
        .unwrap_or(DEFAULT_PER_PAGE)
        .clamp(1, MAX_PER_PAGE);

    PeopleSearchRequest {
        person_titles: filter_list(filters, "jobTitles"),
        person_locations: filter_list(filters, "locations"),
        q_organization_keyword_tags: filter_list(filters, "industries"),
        // Apollo wants "11,50" where the dashboard sends "11-50".
        organization_num_employees_ranges: filter_list(filters, "companySizes")
            .into_iter()
            .map(|range| range.replace('-', ",").replace('+', ",").replace(' ', ""))
            .collect(),
        q_keywords: filter_str(filters, "keywords"),
        page: filter_u32(filters, "page").unwrap_or(1).max(1),
        per_page,
    }
}

/// Keep people with both a name and an email.
pub fn map_people(people: Vec<Person>, session_id: &str) -> Vec<Lead> {
    people
        .into_iter()
        .filter_map(|person| map_person(&person, session_id))
        .collect()
}

fn map_person(person: &Person, session_id: &str) -> Option<Lead> {
    let full_name = clean(Some(&person.display_name()))?;
    let email = clean(person.email.as_deref())?;

    let org = person.organization.as_ref();
    let mut lead = Lead::new(LeadSource::Apollo, session_id);
    lead.full_name = full_name;
    lead.email = Some(email);
    lead.phone = person.primary_phone();
    lead.title = clean_or_empty(person.title.as_deref());
    lead.company = clean_or_empty(org.and_then(|o| o.name.as_deref()));
    lead.industry = clean_or_empty(org.and_then(|o| o.industry.as_deref()));
    lead.website = clean_or_empty(org.and_then(|o| o.website_url.as_deref()));
    lead.employee_count = org
        .and_then(|o| o.estimated_num_employees)
        .map(employee_bucket)
        .unwrap_or_default()
        .to_string();
    lead.linkedin_url = clean_or_empty(person.linkedin_url.as_deref());
    lead.location = [&person.city, &person.state, &person.country]
        .into_iter()
        .filter_map(|part| clean(part.as_deref()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(lead)
}

pub fn employee_bucket(count: u64) -> &'static str {
    match count {
        0 => "",
        1..=10 => "1-10",
        11..=50 => "11-50",
        51..=200 => "51-200",
        201..=500 => "201-500",
        501..=1000 => "501-1000",
        1001..=5000 => "1001-5000",
        _ => "5001+",
    }
}
