// RecordTable is the seam between the lead store / campaign logger and the
// backing table service. Production uses Airtable; tests use MockTable.

use anyhow::Result;
use async_trait::async_trait;

use airtable_client::{AirtableClient, Fields, SortDirection, MAX_RECORDS_PER_REQUEST};

/// Column every writer stamps; listing sorts on it.
pub const CREATED_AT_FIELD: &str = "Created At";

#[async_trait]
pub trait RecordTable: Send + Sync {
    /// Write at most ten records in one request. Returns how many were accepted.
    async fn create_records(&self, table: &str, records: &[Fields]) -> Result<usize>;

    /// Most recent records first, at most `limit`.
    async fn list_records(&self, table: &str, limit: usize) -> Result<Vec<Fields>>;
}

#[async_trait]
impl RecordTable for AirtableClient {
    async fn create_records(&self, table: &str, records: &[Fields]) -> Result<usize> {
        debug_assert!(records.len() <= MAX_RECORDS_PER_REQUEST);
        let created = AirtableClient::create_records(self, table, records).await?;
        Ok(created.len())
    }

    async fn list_records(&self, table: &str, limit: usize) -> Result<Vec<Fields>> {
        let records = AirtableClient::list_records(
            self,
            table,
            limit,
            Some((CREATED_AT_FIELD.to_string(), SortDirection::Desc)),
        )
        .await?;
        Ok(records.into_iter().map(|r| r.fields).collect())
    }
}
