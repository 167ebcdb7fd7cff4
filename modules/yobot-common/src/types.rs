use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Enums ---

/// Third-party scraping service a lead came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadSource {
    Apollo,
    Apify,
    Phantombuster,
}

impl LeadSource {
    pub const ALL: [LeadSource; 3] = [LeadSource::Apollo, LeadSource::Apify, LeadSource::Phantombuster];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadSource::Apollo => "apollo",
            LeadSource::Apify => "apify",
            LeadSource::Phantombuster => "phantombuster",
        }
    }
}

impl fmt::Display for LeadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeadSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apollo" => Ok(LeadSource::Apollo),
            "apify" => Ok(LeadSource::Apify),
            "phantombuster" | "phantom" => Ok(LeadSource::Phantombuster),
            other => Err(format!("unknown lead source '{other}'")),
        }
    }
}

/// Whether production writes are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SystemMode {
    #[default]
    Test,
    Live,
}

impl SystemMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SystemMode::Test => "test",
            SystemMode::Live => "live",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, SystemMode::Live)
    }
}

impl fmt::Display for SystemMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "test" => Ok(SystemMode::Test),
            "live" => Ok(SystemMode::Live),
            other => Err(format!("mode must be 'test' or 'live', got '{other}'")),
        }
    }
}

// --- Lead ---

/// A scraped contact or business record.
///
/// `source` and `scrape_session_id` are always set; every other field is
/// best-effort and may be empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: String,
    pub title: String,
    pub location: String,
    pub industry: String,
    /// Bucket such as "11-50".
    pub employee_count: String,
    pub website: String,
    pub linkedin_url: String,
    pub source: LeadSource,
    /// 0..=100, assigned by the normalizer.
    pub score: u8,
    pub scrape_session_id: String,
    pub created_at: DateTime<Utc>,
    /// Computed when listing stored leads; never persisted.
    #[serde(default)]
    pub is_duplicate: bool,
}

impl Lead {
    /// An empty lead tagged with its provider and session.
    pub fn new(source: LeadSource, scrape_session_id: impl Into<String>) -> Self {
        Self {
            full_name: String::new(),
            email: None,
            phone: None,
            company: String::new(),
            title: String::new(),
            location: String::new(),
            industry: String::new(),
            employee_count: String::new(),
            website: String::new(),
            linkedin_url: String::new(),
            source,
            score: 0,
            scrape_session_id: scrape_session_id.into(),
            created_at: Utc::now(),
            is_duplicate: false,
        }
    }

    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    pub fn has_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(|p| !p.trim().is_empty())
    }
}

/// Session ids group the leads of one provider invocation.
pub fn new_session_id(source: LeadSource) -> String {
    format!("{}-{}", source, Uuid::new_v4().simple())
}

// --- Campaign record ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    /// The provider answered with leads (possibly zero).
    Success,
    /// The provider accepted an asynchronous job.
    Pending,
    /// No call was made: test mode or missing credentials.
    Skipped,
    /// The provider call failed.
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Success => "success",
            CampaignStatus::Pending => "pending",
            CampaignStatus::Skipped => "skipped",
            CampaignStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit record for one scrape invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRecord {
    pub tool: LeadSource,
    pub timestamp: DateTime<Utc>,
    pub mode: SystemMode,
    /// Filter object serialized as JSON.
    pub filters: String,
    pub lead_count: usize,
    pub status: CampaignStatus,
    pub session_id: String,
    pub detail: Option<String>,
}

// --- Filters ---

/// Free-form filter object posted by the dashboard.
pub type Filters = serde_json::Map<String, serde_json::Value>;

/// Read a list filter given either as a JSON array or a comma-separated string.
pub fn filter_list(filters: &Filters, key: &str) -> Vec<String> {
    match filters.get(key) {
        Some(serde_json::Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                serde_json::Value::String(s) => Some(s.trim().to_string()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Some(serde_json::Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

pub fn filter_str(filters: &Filters, key: &str) -> Option<String> {
    match filters.get(key) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a positive integer given as a number or numeric string.
pub fn filter_u32(filters: &Filters, key: &str) -> Option<u32> {
    match filters.get(key) {
        Some(serde_json::Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}
