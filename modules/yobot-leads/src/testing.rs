// Test mocks for the lead pipeline.
//
// Three mocks matching the trait boundaries:
// - MockProvider (LeadProvider): canned fetch/poll responses, counts calls
// - MockTable (RecordTable): in-memory tables, records every write call
// - RecordingNotifier (NotifyBackend): keeps every campaign it was sent
//
// Plus lead fixtures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::{bail, Result};
use async_trait::async_trait;

use airtable_client::Fields;
use yobot_common::{CampaignRecord, Filters, Lead, LeadSource, YobotError};

use crate::notify::NotifyBackend;
use crate::providers::{LeadProvider, ProviderFetch};
use crate::traits::RecordTable;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A lead with the fields every provider tends to fill.
pub fn lead(source: LeadSource, name: &str, email: &str, company: &str) -> Lead {
    let mut lead = Lead::new(source, format!("{source}-fixture"));
    lead.full_name = name.to_string();
    lead.email = Some(email.to_string()).filter(|e| !e.is_empty());
    lead.company = company.to_string();
    lead
}

/// `count` distinct leads.
pub fn leads(source: LeadSource, count: usize) -> Vec<Lead> {
    (0..count)
        .map(|i| lead(source, &format!("Person {i}"), &format!("person{i}@acme.io"), "Acme"))
        .collect()
}

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum Canned {
    Leads(Vec<Lead>),
    Pending(String),
    Fail(String),
    JobFailed(String),
}

impl Canned {
    fn respond(&self, session_id: &str) -> Result<ProviderFetch> {
        match self {
            Canned::Leads(leads) => Ok(ProviderFetch::Leads(
                leads
                    .iter()
                    .cloned()
                    .map(|mut l| {
                        l.scrape_session_id = session_id.to_string();
                        l
                    })
                    .collect(),
            )),
            Canned::Pending(job_id) => Ok(ProviderFetch::Pending {
                job_id: job_id.clone(),
                advisory: format!("job {job_id} running"),
            }),
            Canned::Fail(message) => bail!("{message}"),
            Canned::JobFailed(reason) => Ok(ProviderFetch::JobFailed(reason.clone())),
        }
    }
}

/// Provider with canned responses. Builder pattern:
/// `.with_leads()`, `.failing()`, `.pending()`, `.without_credentials()`,
/// `.on_poll()`, `.still_running()`, `.job_failing()`.
pub struct MockProvider {
    source: LeadSource,
    credentials: bool,
    fetch: Canned,
    poll: Option<Canned>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(source: LeadSource) -> Self {
        Self {
            source,
            credentials: true,
            fetch: Canned::Leads(Vec::new()),
            poll: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_leads(mut self, leads: Vec<Lead>) -> Self {
        self.fetch = Canned::Leads(leads);
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fetch = Canned::Fail(message.to_string());
        self
    }

    pub fn pending(mut self, job_id: &str) -> Self {
        self.fetch = Canned::Pending(job_id.to_string());
        self
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    /// Leads returned when a job is polled.
    pub fn on_poll(mut self, leads: Vec<Lead>) -> Self {
        self.poll = Some(Canned::Leads(leads));
        self
    }

    /// Polls report the launched job as still running.
    pub fn still_running(mut self) -> Self {
        let job_id = match &self.fetch {
            Canned::Pending(job_id) => job_id.clone(),
            _ => "job".to_string(),
        };
        self.poll = Some(Canned::Pending(job_id));
        self
    }

    /// Polls report the job as ended without results.
    pub fn job_failing(mut self, reason: &str) -> Self {
        self.poll = Some(Canned::JobFailed(reason.to_string()));
        self
    }

    /// Fetch and poll calls that reached the provider.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadProvider for MockProvider {
    fn source(&self) -> LeadSource {
        self.source
    }

    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn fetch(&self, _filters: &Filters, session_id: &str) -> Result<ProviderFetch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.fetch.respond(session_id)
    }

    async fn poll(&self, _job_id: &str, session_id: &str) -> Result<ProviderFetch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.poll {
            Some(canned) => canned.respond(session_id),
            None => Err(YobotError::Unsupported {
                provider: self.source.to_string(),
                operation: "poll",
            }
            .into()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockTable
// ---------------------------------------------------------------------------

/// One `create_records` call as the table saw it.
#[derive(Debug, Clone)]
pub struct WriteCall {
    pub table: String,
    pub records: usize,
    pub at: Instant,
}

#[derive(Default)]
struct TableState {
    /// Rows per table, oldest first.
    tables: HashMap<String, Vec<Fields>>,
    writes: Vec<WriteCall>,
}

/// In-memory record tables. Lists newest first like the real service.
pub struct MockTable {
    state: Mutex<TableState>,
    fail_writes: HashSet<usize>,
    fail_reads: bool,
}

impl MockTable {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TableState::default()),
            fail_writes: HashSet::new(),
            fail_reads: false,
        }
    }

    /// Fail the write call with this zero-based index (across all tables).
    pub fn failing_on(mut self, call_index: usize) -> Self {
        self.fail_writes.insert(call_index);
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Seed rows, oldest first.
    pub fn with_rows(self, table: &str, rows: Vec<Fields>) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
        self
    }

    /// Rows in a table, oldest first.
    pub fn rows(&self, table: &str) -> Vec<Fields> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn writes(&self) -> Vec<WriteCall> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn writes_to(&self, table: &str) -> Vec<WriteCall> {
        self.writes().into_iter().filter(|w| w.table == table).collect()
    }
}

impl Default for MockTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordTable for MockTable {
    async fn create_records(&self, table: &str, records: &[Fields]) -> Result<usize> {
        let mut state = self.state.lock().unwrap();
        let index = state.writes.len();
        state.writes.push(WriteCall {
            table: table.to_string(),
            records: records.len(),
            at: Instant::now(),
        });
        if self.fail_writes.contains(&index) {
            bail!("mock write {index} failed");
        }
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(records.iter().cloned());
        Ok(records.len())
    }

    async fn list_records(&self, table: &str, limit: usize) -> Result<Vec<Fields>> {
        if self.fail_reads {
            bail!("mock read failed");
        }
        let state = self.state.lock().unwrap();
        Ok(state
            .tables
            .get(table)
            .map(|rows| rows.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<CampaignRecord>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<CampaignRecord> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotifyBackend for RecordingNotifier {
    async fn send_campaign(&self, record: &CampaignRecord) -> Result<()> {
        self.sent.lock().unwrap().push(record.clone());
        Ok(())
    }
}
