use serde::{Deserialize, Serialize};

/// Body for `POST /mixed_people/search`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PeopleSearchRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub person_titles: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub person_locations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub q_organization_keyword_tags: Vec<String>,
    /// Ranges in Apollo's "min,max" form, e.g. "11,50".
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub organization_num_employees_ranges: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q_keywords: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeopleSearchResponse {
    #[serde(default)]
    pub people: Vec<Person>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub total_entries: Option<u64>,
    pub total_pages: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Person {
    pub id: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    pub organization: Option<Organization>,
}

impl Person {
    /// `name` when present, otherwise "first last".
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn primary_phone(&self) -> Option<String> {
        self.phone_numbers.iter().find_map(|p| {
            p.sanitized_number
                .as_deref()
                .or(p.raw_number.as_deref())
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhoneNumber {
    pub raw_number: Option<String>,
    pub sanitized_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Organization {
    pub name: Option<String>,
    pub website_url: Option<String>,
    pub industry: Option<String>,
    pub estimated_num_employees: Option<u64>,
}
