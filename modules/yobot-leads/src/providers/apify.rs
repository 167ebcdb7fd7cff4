use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use apify_client::{ApifyClient, Place, PlacesScraperInput};
use yobot_common::{filter_list, filter_str, filter_u32, Filters, Lead, LeadSource, YobotError};

use super::{clean, clean_or_empty, LeadProvider, ProviderFetch};

const DEFAULT_LIMIT: u32 = 50;

pub struct ApifyProvider {
    client: Option<ApifyClient>,
    actor_id: String,
    timeout_secs: u64,
}

impl ApifyProvider {
    pub fn new(api_key: Option<String>, actor_id: String, timeout_secs: u64, http: reqwest::Client) -> Self {
        Self {
            client: api_key.map(|key| ApifyClient::with_http(key, http)),
            actor_id,
            timeout_secs,
        }
    }
}

#[async_trait]
impl LeadProvider for ApifyProvider {
    fn source(&self) -> LeadSource {
        LeadSource::Apify
    }

    fn has_credentials(&self) -> bool {
        self.client.is_some()
    }

    async fn fetch(&self, filters: &Filters, session_id: &str) -> Result<ProviderFetch> {
        let Some(client) = &self.client else {
            return Err(YobotError::Config("Apify API key not configured".into()).into());
        };

        let input = build_input(filters);
        if input.search_strings_array.is_empty() {
            info!("No Apify search terms, skipping actor run");
            return Ok(ProviderFetch::Leads(Vec::new()));
        }

        let places = client
            .scrape_places(&self.actor_id, &input, self.timeout_secs)
            .await
            .map_err(|e| YobotError::Provider(format!("Apify: {e}")))?;
        let received = places.len();
        let leads = map_places(places, session_id);
        info!(received, kept = leads.len(), "Mapped Apify places");

        Ok(ProviderFetch::Leads(leads))
    }
}

pub fn build_input(filters: &Filters) -> PlacesScraperInput {
    PlacesScraperInput {
        search_strings_array: filter_list(filters, "searchTerms"),
        location_query: filter_str(filters, "location"),
        max_crawled_places_per_search: filter_u32(filters, "limit").unwrap_or(DEFAULT_LIMIT).max(1),
        language: filter_str(filters, "language"),
        scrape_contacts: true,
    }
}

/// Keep places that name a business.
pub fn map_places(places: Vec<Place>, session_id: &str) -> Vec<Lead> {
    places
        .into_iter()
        .filter_map(|place| map_place(&place, session_id))
        .collect()
}

fn map_place(place: &Place, session_id: &str) -> Option<Lead> {
    let company = clean(place.title.as_deref())?;

    let mut lead = Lead::new(LeadSource::Apify, session_id);
    lead.company = company;
    lead.email = place.emails.iter().find_map(|e| clean(Some(e)));
    lead.phone = clean(place.phone.as_deref());
    lead.location = place.display_location();
    lead.industry = clean_or_empty(place.category_name.as_deref());
    lead.website = clean_or_empty(place.website.as_deref());
    lead.linkedin_url = place
        .linkedins
        .iter()
        .find_map(|l| clean(Some(l)))
        .unwrap_or_default();
    Some(lead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn place(title: Option<&str>) -> Place {
        Place {
            title: title.map(Into::into),
            category_name: Some("Plumber".into()),
            address: Some("12 Main St, Minneapolis, MN".into()),
            phone: Some("+1 612-555-0100".into()),
            website: Some("https://joesplumbing.com".into()),
            emails: vec!["".into(), "joe@joesplumbing.com".into()],
            linkedins: vec!["https://linkedin.com/company/joes".into()],
            ..Default::default()
        }
    }

    #[test]
    fn places_without_title_are_dropped() {
        let leads = map_places(vec![place(Some("Joe's Plumbing")), place(Some("  ")), place(None)], "apify-1");
        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].company, "Joe's Plumbing");
        assert_eq!(leads[0].source, LeadSource::Apify);
    }

    #[test]
    fn contact_arrays_fill_email_and_linkedin() {
        let lead = &map_places(vec![place(Some("Joe's Plumbing"))], "s")[0];
        assert_eq!(lead.email.as_deref(), Some("joe@joesplumbing.com"));
        assert_eq!(lead.linkedin_url, "https://linkedin.com/company/joes");
        assert_eq!(lead.industry, "Plumber");
        assert_eq!(lead.location, "12 Main St, Minneapolis, MN");
        assert!(lead.full_name.is_empty());
    }

    #[test]
    fn builds_input_from_filters() {
        let filters = json!({"searchTerms": "plumbers, electricians", "location": "Minneapolis", "limit": 10});
        let input = build_input(filters.as_object().unwrap());
        assert_eq!(input.search_strings_array, vec!["plumbers", "electricians"]);
        assert_eq!(input.location_query.as_deref(), Some("Minneapolis"));
        assert_eq!(input.max_crawled_places_per_search, 10);
        assert!(input.scrape_contacts);
        assert_eq!(build_input(&Filters::new()).max_crawled_places_per_search, DEFAULT_LIMIT);
    }
}
