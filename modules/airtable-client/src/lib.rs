pub mod error;
pub mod types;

pub use error::{AirtableError, Result};
pub use types::{Fields, ListOptions, Record, RecordPage, SortDirection};

use types::{CreateRecordsRequest, NewRecord, RecordsResponse};

const BASE_URL: &str = "https://api.airtable.com/v0";

/// Airtable rejects create requests carrying more records than this.
pub const MAX_RECORDS_PER_REQUEST: usize = 10;

pub struct AirtableClient {
    client: reqwest::Client,
    api_key: String,
    base_id: String,
    base_url: String,
}

impl AirtableClient {
    pub fn new(api_key: String, base_id: String) -> Self {
        Self::with_http(api_key, base_id, reqwest::Client::new())
    }

    pub fn with_http(api_key: String, base_id: String, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key,
            base_id,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn base_id(&self) -> &str {
        &self.base_id
    }

    /// Table names contain spaces; push them as an encoded path segment.
    fn table_url(&self, table: &str) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| AirtableError::Url(self.base_url.clone()))?
            .push(&self.base_id)
            .push(table);
        Ok(url)
    }

    /// Create up to ten records in one request.
    pub async fn create_records(&self, table: &str, records: &[Fields]) -> Result<Vec<Record>> {
        if records.len() > MAX_RECORDS_PER_REQUEST {
            return Err(AirtableError::TooManyRecords {
                got: records.len(),
                max: MAX_RECORDS_PER_REQUEST,
            });
        }
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let body = CreateRecordsRequest {
            records: records.iter().map(|fields| NewRecord { fields }).collect(),
            typecast: true,
        };

        let resp = self
            .client
            .post(self.table_url(table)?)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AirtableError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let created: RecordsResponse = resp.json().await?;
        tracing::debug!(table, count = created.records.len(), "Airtable records created");
        Ok(created.records)
    }

    /// Fetch one page of records.
    pub async fn list_page(&self, table: &str, options: &ListOptions) -> Result<RecordPage> {
        let resp = self
            .client
            .get(self.table_url(table)?)
            .bearer_auth(&self.api_key)
            .query(&options.query_pairs())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AirtableError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let page: RecordsResponse = resp.json().await?;
        Ok(RecordPage {
            records: page.records,
            offset: page.offset,
        })
    }

    /// Follow the offset cursor until `max_records` rows have been read or the table ends.
    pub async fn list_records(
        &self,
        table: &str,
        max_records: usize,
        sort: Option<(String, SortDirection)>,
    ) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut options = ListOptions {
            page_size: Some(100),
            max_records: Some(max_records as u32),
            offset: None,
            sort,
        };

        loop {
            let page = self.list_page(table, &options).await?;
            records.extend(page.records);
            match page.offset {
                Some(next) if records.len() < max_records => options.offset = Some(next),
                _ => break,
            }
        }

        records.truncate(max_records);
        tracing::debug!(table, count = records.len(), "Airtable records listed");
        Ok(records)
    }
}
