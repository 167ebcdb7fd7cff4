use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LaunchRequest<'a> {
    pub id: &'a str,
    pub argument: &'a serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LaunchResponse {
    #[serde(rename = "containerId")]
    pub container_id: String,
}

/// Status of one agent execution.
#[derive(Debug, Clone, Deserialize)]
pub struct Container {
    pub id: String,
    pub status: String,
    #[serde(rename = "exitCode")]
    pub exit_code: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Running,
    Finished,
    Failed(i64),
}

impl Container {
    pub fn state(&self) -> ContainerState {
        match self.status.as_str() {
            "finished" => match self.exit_code {
                Some(code) if code != 0 => ContainerState::Failed(code),
                _ => ContainerState::Finished,
            },
            _ => ContainerState::Running,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ResultObjectResponse {
    #[serde(rename = "resultObject")]
    pub result_object: Option<String>,
}

/// One LinkedIn profile row from a search-export agent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileResult {
    pub full_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company_name: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub profile_url: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub industry: Option<String>,
    pub company_url: Option<String>,
}

impl ProfileResult {
    /// Read a row. Column names differ between agents (and some agents emit
    /// several of them at once), so each field takes the first non-empty key.
    pub fn from_row(row: &serde_json::Map<String, serde_json::Value>) -> Self {
        let pick = |keys: &[&str]| {
            keys.iter().find_map(|k| {
                row.get(*k)
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        };
        Self {
            full_name: pick(&["fullName", "name"]),
            first_name: pick(&["firstName"]),
            last_name: pick(&["lastName"]),
            company_name: pick(&["companyName", "company"]),
            title: pick(&["title", "job", "jobTitle"]),
            location: pick(&["location"]),
            profile_url: pick(&["profileUrl", "linkedInProfileUrl", "url"]),
            email: pick(&["email", "mail"]),
            phone_number: pick(&["phoneNumber", "phone"]),
            industry: pick(&["industry", "companyIndustry"]),
            company_url: pick(&["companyUrl", "companyWebsite"]),
        }
    }

    pub fn display_name(&self) -> String {
        if let Some(name) = self.full_name.as_deref() {
            return name.to_string();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}
