//! Batched persistence of leads into the backing table.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use airtable_client::{Fields, MAX_RECORDS_PER_REQUEST};
use yobot_common::{BreakerError, CircuitBreaker, Lead, LeadSource, YobotError};

use crate::normalize::mark_duplicates;
use crate::traits::{RecordTable, CREATED_AT_FIELD};

pub const FULL_NAME_FIELD: &str = "Full Name";
pub const EMAIL_FIELD: &str = "Email";
pub const PHONE_FIELD: &str = "Phone";
pub const COMPANY_FIELD: &str = "Company";
pub const TITLE_FIELD: &str = "Title";
pub const LOCATION_FIELD: &str = "Location";
pub const INDUSTRY_FIELD: &str = "Industry";
pub const WEBSITE_FIELD: &str = "Website";
pub const LINKEDIN_FIELD: &str = "LinkedIn URL";
pub const SOURCE_FIELD: &str = "Source";
pub const SCORE_FIELD: &str = "Score";
pub const SESSION_FIELD: &str = "Scrape Session ID";

/// Lead fields the table does not keep. `is_duplicate` is recomputed on read.
pub const STORE_OMITTED_FIELDS: &[&str] = &["employeeCount", "isDuplicate"];

#[derive(Debug, Clone)]
pub struct ChunkFailure {
    pub chunk_index: usize,
    pub attempted: usize,
    pub error: String,
}

#[derive(Debug, Clone, Default)]
pub struct StoreReport {
    pub attempted: usize,
    pub stored: usize,
    pub write_calls: usize,
    pub failures: Vec<ChunkFailure>,
    /// No table configured; nothing was attempted.
    pub disabled: bool,
}

impl StoreReport {
    pub fn any_stored(&self) -> bool {
        self.stored > 0
    }
}

pub struct LeadStore {
    table: Option<Arc<dyn RecordTable>>,
    table_name: String,
    batch_delay: Duration,
    breaker: CircuitBreaker,
    /// Separate so failing reads cannot block writes.
    read_breaker: CircuitBreaker,
}

impl LeadStore {
    pub fn new(
        table: Arc<dyn RecordTable>,
        table_name: impl Into<String>,
        batch_delay: Duration,
        breaker: CircuitBreaker,
    ) -> Self {
        let read_breaker = breaker.sibling(format!("{}.read", breaker.name()));
        Self {
            table: Some(table),
            table_name: table_name.into(),
            batch_delay,
            breaker,
            read_breaker,
        }
    }

    /// A store with no backing table: writes report `disabled`, reads are empty.
    pub fn disabled() -> Self {
        Self {
            table: None,
            table_name: String::new(),
            batch_delay: Duration::ZERO,
            breaker: CircuitBreaker::new("lead_store", 1, Duration::ZERO),
            read_breaker: CircuitBreaker::new("lead_store.read", 1, Duration::ZERO),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.table.is_some()
    }

    /// Write leads in chunks of ten with a fixed pause between chunks.
    ///
    /// A failed chunk is logged and skipped. There is no retry and no
    /// rollback of chunks already written.
    pub async fn store_leads(&self, leads: &[Lead]) -> StoreReport {
        let Some(table) = &self.table else {
            info!(count = leads.len(), "Lead store not configured, skipping write");
            return StoreReport {
                disabled: true,
                ..Default::default()
            };
        };

        let mut report = StoreReport {
            attempted: leads.len(),
            ..Default::default()
        };

        for (chunk_index, chunk) in leads.chunks(MAX_RECORDS_PER_REQUEST).enumerate() {
            if chunk_index > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }

            let records: Vec<Fields> = chunk.iter().map(lead_to_fields).collect();
            let result = self
                .breaker
                .call(table.create_records(&self.table_name, &records))
                .await;

            match result {
                Ok(written) => {
                    report.write_calls += 1;
                    report.stored += written.min(chunk.len());
                }
                Err(e) => {
                    if !matches!(e, BreakerError::Open { .. }) {
                        report.write_calls += 1;
                    }
                    warn!(
                        table = %self.table_name,
                        chunk_index,
                        records = chunk.len(),
                        error = %e,
                        "Lead chunk write failed, skipping"
                    );
                    report.failures.push(ChunkFailure {
                        chunk_index,
                        attempted: chunk.len(),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            table = %self.table_name,
            attempted = report.attempted,
            stored = report.stored,
            write_calls = report.write_calls,
            failed_chunks = report.failures.len(),
            "Stored leads"
        );
        report
    }

    /// Most recent leads first, with `is_duplicate` computed against older rows.
    pub async fn fetch_leads(&self, limit: usize) -> Result<Vec<Lead>> {
        let Some(table) = &self.table else {
            return Ok(Vec::new());
        };

        let rows = self
            .read_breaker
            .call(table.list_records(&self.table_name, limit))
            .await
            .map_err(|e| YobotError::Store(format!("listing {}: {e}", self.table_name)))?;

        let total = rows.len();
        let mut leads: Vec<Lead> = rows.iter().rev().filter_map(fields_to_lead).collect();
        if leads.len() < total {
            warn!(skipped = total - leads.len(), "Skipped rows without source or session id");
        }

        mark_duplicates(&mut leads);
        leads.reverse();
        Ok(leads)
    }
}

pub fn lead_to_fields(lead: &Lead) -> Fields {
    let mut fields = Fields::new();
    let mut put = |key: &str, value: &str| {
        if !value.is_empty() {
            fields.insert(key.to_string(), Value::String(value.to_string()));
        }
    };

    put(FULL_NAME_FIELD, &lead.full_name);
    put(EMAIL_FIELD, lead.email.as_deref().unwrap_or_default());
    put(PHONE_FIELD, lead.phone.as_deref().unwrap_or_default());
    put(COMPANY_FIELD, &lead.company);
    put(TITLE_FIELD, &lead.title);
    put(LOCATION_FIELD, &lead.location);
    put(INDUSTRY_FIELD, &lead.industry);
    put(WEBSITE_FIELD, &lead.website);
    put(LINKEDIN_FIELD, &lead.linkedin_url);
    put(SOURCE_FIELD, lead.source.as_str());
    put(SESSION_FIELD, &lead.scrape_session_id);
    put(CREATED_AT_FIELD, &lead.created_at.to_rfc3339());

    fields.insert(SCORE_FIELD.to_string(), Value::from(lead.score));
    fields
}

/// Rows without a recognizable source or session id are not leads.
pub fn fields_to_lead(fields: &Fields) -> Option<Lead> {
    let text = |key: &str| {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
            .to_string()
    };

    let source: LeadSource = text(SOURCE_FIELD).parse().ok()?;
    let session = text(SESSION_FIELD);
    if session.is_empty() {
        return None;
    }

    let mut lead = Lead::new(source, session);
    lead.full_name = text(FULL_NAME_FIELD);
    lead.email = Some(text(EMAIL_FIELD)).filter(|s| !s.is_empty());
    lead.phone = Some(text(PHONE_FIELD)).filter(|s| !s.is_empty());
    lead.company = text(COMPANY_FIELD);
    lead.title = text(TITLE_FIELD);
    lead.location = text(LOCATION_FIELD);
    lead.industry = text(INDUSTRY_FIELD);
    lead.website = text(WEBSITE_FIELD);
    lead.linkedin_url = text(LINKEDIN_FIELD);
    lead.score = fields
        .get(SCORE_FIELD)
        .and_then(Value::as_f64)
        .map(|s| s.clamp(0.0, 100.0) as u8)
        .unwrap_or_default();
    lead.created_at = DateTime::parse_from_rfc3339(&text(CREATED_AT_FIELD))
        .map(|at| at.with_timezone(&Utc))
        .unwrap_or_default();
    Some(lead)
}
