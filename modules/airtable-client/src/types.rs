use serde::{Deserialize, Serialize};

pub type Fields = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateRecordsRequest<'a> {
    pub records: Vec<NewRecord<'a>>,
    pub typecast: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct NewRecord<'a> {
    pub fields: &'a Fields,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RecordsResponse {
    #[serde(default)]
    pub records: Vec<Record>,
    pub offset: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime")]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Options for one page of `GET /{base}/{table}`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// 1..=100, Airtable's default is 100.
    pub page_size: Option<u32>,
    pub max_records: Option<u32>,
    pub offset: Option<String>,
    pub sort: Option<(String, SortDirection)>,
}

impl ListOptions {
    pub(crate) fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(size) = self.page_size {
            pairs.push(("pageSize".to_string(), size.clamp(1, 100).to_string()));
        }
        if let Some(max) = self.max_records {
            pairs.push(("maxRecords".to_string(), max.to_string()));
        }
        if let Some(offset) = &self.offset {
            pairs.push(("offset".to_string(), offset.clone()));
        }
        if let Some((field, direction)) = &self.sort {
            pairs.push(("sort[0][field]".to_string(), field.clone()));
            pairs.push(("sort[0][direction]".to_string(), direction.as_str().to_string()));
        }
        pairs
    }
}

/// One page of records plus the cursor for the next page.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub offset: Option<String>,
}
