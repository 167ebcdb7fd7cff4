pub mod error;
pub mod types;

pub use error::{PhantomBusterError, Result};
pub use types::{Container, ContainerState, LaunchResponse, ProfileResult};

use types::{LaunchRequest, ResultObjectResponse};

const BASE_URL: &str = "https://api.phantombuster.com/api/v2";

pub struct PhantomBusterClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PhantomBusterClient {
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

    /// Launch an agent. Returns immediately with the container that will run it.
    pub async fn launch_agent(
        &self,
        agent_id: &str,
        argument: &serde_json::Value,
    ) -> Result<LaunchResponse> {
        let url = format!("{}/agents/launch", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("X-Phantombuster-Key-1", &self.api_key)
            .json(&LaunchRequest {
                id: agent_id,
                argument,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PhantomBusterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let launched: LaunchResponse = resp.json().await?;
        tracing::info!(agent_id, container_id = %launched.container_id, "PhantomBuster agent launched");
        Ok(launched)
    }

    pub async fn fetch_container(&self, container_id: &str) -> Result<Container> {
        let url = format!("{}/containers/fetch", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("X-Phantombuster-Key-1", &self.api_key)
            .query(&[("id", container_id)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PhantomBusterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    /// Fetch and decode the container's result object.
    /// An absent result object yields an empty list.
    pub async fn fetch_profiles(&self, container_id: &str) -> Result<Vec<ProfileResult>> {
        let url = format!("{}/containers/fetch-result-object", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("X-Phantombuster-Key-1", &self.api_key)
            .query(&[("id", container_id)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PhantomBusterError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let wrapper: ResultObjectResponse = resp.json().await?;
        let profiles = parse_result_object(wrapper.result_object.as_deref())?;
        tracing::info!(container_id, count = profiles.len(), "Fetched PhantomBuster profiles");
        Ok(profiles)
    }
}

/// The result object is a JSON document serialized into a string.
/// Agents emit either a bare array or `{ "results": [...] }`.
pub fn parse_result_object(raw: Option<&str>) -> Result<Vec<ProfileResult>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(Vec::new());
    };
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(mut map) => match map.remove("results") {
            Some(serde_json::Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    Ok(rows
        .iter()
        .filter_map(|row| row.as_object())
        .map(ProfileResult::from_row)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_result_object_handles_shapes() {
        assert!(parse_result_object(None).unwrap().is_empty());
        assert!(parse_result_object(Some("  ")).unwrap().is_empty());

        let bare = r#"[{"fullName": "A B", "companyName": "Acme"}]"#;
        assert_eq!(parse_result_object(Some(bare)).unwrap().len(), 1);

        let wrapped = r#"{"results": [{"fullName": "A B"}, {"fullName": "C D"}]}"#;
        assert_eq!(parse_result_object(Some(wrapped)).unwrap().len(), 2);
    }

    #[test]
    fn parse_result_object_rejects_garbage() {
        assert!(matches!(
            parse_result_object(Some("not json")),
            Err(PhantomBusterError::Parse(_))
        ));
    }
}
