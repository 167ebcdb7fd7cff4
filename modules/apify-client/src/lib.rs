pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{Place, PlacesScraperInput, DEFAULT_PLACES_ACTOR};

use serde::de::DeserializeOwned;
use serde::Serialize;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Server-side cap Apify applies to synchronous runs.
const MAX_SYNC_TIMEOUT_SECS: u64 = 300;

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self::with_http(token, reqwest::Client::new())
    }

    pub fn with_http(token: String, client: reqwest::Client) -> Self {
        Self {
            client,
            token,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Run an actor and return its default dataset in one request.
    ///
    /// Apify answers 408 when the run outlives `timeout_secs`; that is reported as
    /// `RunTimedOut` rather than a generic API error.
    pub async fn run_sync<I, T>(&self, actor_id: &str, input: &I, timeout_secs: u64) -> Result<Vec<T>>
    where
        I: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let timeout_secs = timeout_secs.min(MAX_SYNC_TIMEOUT_SECS);
        let url = format!(
            "{}/acts/{}/run-sync-get-dataset-items?format=json&timeout={}",
            self.base_url, actor_id, timeout_secs
        );
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if status.as_u16() == 408 {
            return Err(ApifyError::RunTimedOut {
                actor: actor_id.to_string(),
                timeout_secs,
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = resp.text().await?;
        let items: Vec<T> = serde_json::from_str(&body)?;
        Ok(items)
    }

    /// Scrape business places for the given search terms.
    pub async fn scrape_places(
        &self,
        actor_id: &str,
        input: &PlacesScraperInput,
        timeout_secs: u64,
    ) -> Result<Vec<Place>> {
        tracing::info!(
            actor_id,
            searches = input.search_strings_array.len(),
            limit = input.max_crawled_places_per_search,
            "Starting Apify places scrape"
        );

        let places: Vec<Place> = self.run_sync(actor_id, input, timeout_secs).await?;
        tracing::info!(count = places.len(), "Fetched Apify places");

        Ok(places)
    }
}
