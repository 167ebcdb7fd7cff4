pub mod error;
pub mod types;

pub use error::{ApolloError, Result};
pub use types::{Organization, PeopleSearchRequest, PeopleSearchResponse, Person, PhoneNumber};

const BASE_URL: &str = "https://api.apollo.io/v1";

pub struct ApolloClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ApolloClient {
    pub fn new(api_key: String) -> Self {
        Self::with_http(api_key, reqwest::Client::new())
    }

    pub fn with_http(api_key: String, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Search Apollo's people database. One request, one page.
    pub async fn search_people(&self, request: &PeopleSearchRequest) -> Result<PeopleSearchResponse> {
        tracing::info!(
            titles = request.person_titles.len(),
            locations = request.person_locations.len(),
            page = request.page,
            per_page = request.per_page,
            "Searching Apollo people"
        );

        let url = format!("{}/mixed_people/search", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .header("Cache-Control", "no-cache")
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ApolloError::Unauthorized);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApolloError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let parsed: PeopleSearchResponse = serde_json::from_str(&body)?;
        tracing::info!(count = parsed.people.len(), "Fetched Apollo people");

        Ok(parsed)
    }
}
