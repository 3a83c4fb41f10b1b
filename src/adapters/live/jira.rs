//! Live adapter for the `IssueTracker` port using the Jira REST API (v2).

use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::parse_url;
use crate::error::{Error, PortError};
use crate::ports::issues::{IssueTracker, TrackerIssue, Version};
use crate::ports::vcs::PortFuture;

/// Jira client authenticated with username and API token.
pub struct JiraClient {
    client: Client,
    base: Url,
    username: String,
    token: String,
}

/// Issue as returned by `GET /rest/api/2/issue/{key}`.
#[derive(Deserialize)]
struct IssueBody {
    key: String,
    fields: Map<String, Value>,
}

#[derive(Deserialize)]
struct SearchBody {
    issues: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    key: String,
}

/// Error body Jira sends with non-success statuses.
#[derive(Deserialize)]
struct JiraError {
    #[serde(rename = "errorMessages", default)]
    error_messages: Vec<String>,
}

impl JiraClient {
    /// Creates a client for the Jira site at `site_url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if `site_url` is not an absolute URL.
    pub fn new(site_url: &str, username: &str, token: &str) -> Result<Self, Error> {
        Ok(Self {
            client: Client::new(),
            base: parse_url("jira_api", site_url)?,
            username: username.into(),
            token: token.into(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, PortError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| PortError::from(format!("Jira URL cannot be a base: {}", self.base)))?
            .pop_if_empty()
            .extend(["rest", "api", "2"])
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, PortError> {
        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.username, Some(&self.token))
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| -> PortError { format!("Jira request failed: {e}").into() })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| -> PortError { format!("Failed to read Jira response: {e}").into() })?;

        if status == StatusCode::NOT_FOUND {
            return Err(format!("Not found: {}", url.path()).into());
        }
        if !status.is_success() {
            let msg = serde_json::from_str::<JiraError>(&text)
                .ok()
                .filter(|e| !e.error_messages.is_empty())
                .map_or(text, |e| e.error_messages.join("; "));
            return Err(format!("Jira API error ({}): {msg}", status.as_u16()).into());
        }

        serde_json::from_str(&text)
            .map_err(|e| -> PortError { format!("Failed to parse Jira response: {e}").into() })
    }
}

impl IssueTracker for JiraClient {
    fn find_issue<'a>(&'a self, key: &'a str) -> PortFuture<'a, TrackerIssue> {
        Box::pin(async move {
            let url = self.endpoint(&["issue", key])?;
            let body: IssueBody = self.get(url).await?;
            Ok(tracker_issue(body))
        })
    }

    fn search<'a>(&'a self, query: &'a str) -> PortFuture<'a, Vec<String>> {
        Box::pin(async move {
            let mut url = self.endpoint(&["search"])?;
            url.query_pairs_mut().append_pair("jql", query).append_pair("fields", "key");
            let body: SearchBody = self.get(url).await?;
            Ok(body.issues.into_iter().map(|hit| hit.key).collect())
        })
    }

    fn versions<'a>(&'a self, project_key: &'a str) -> PortFuture<'a, Vec<Version>> {
        Box::pin(async move {
            let url = self.endpoint(&["project", project_key, "versions"])?;
            self.get(url).await
        })
    }

    fn browse_url(&self, key: &str) -> String {
        browse_url(&self.base, key)
    }
}

fn tracker_issue(body: IssueBody) -> TrackerIssue {
    let text = |value: Option<&Value>| value.and_then(Value::as_str).unwrap_or_default().to_string();
    let summary = text(body.fields.get("summary"));
    let issue_type = text(body.fields.get("issuetype").and_then(|t| t.get("name")));
    TrackerIssue { key: body.key, summary, issue_type, fields: body.fields }
}

/// `{scheme}://{host}/browse/{key}`, ignoring any path on the site URL.
fn browse_url(base: &Url, key: &str) -> String {
    let host = base.host_str().unwrap_or_default();
    match base.port() {
        Some(port) => format!("{}://{host}:{port}/browse/{key}", base.scheme()),
        None => format!("{}://{host}/browse/{key}", base.scheme()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn browse_url_uses_scheme_and_host() {
        let base = Url::parse("https://api.example.com/some/path").unwrap();
        assert_eq!(browse_url(&base, "HC-123"), "https://api.example.com/browse/HC-123");

        let base = Url::parse("http://localhost:8080").unwrap();
        assert_eq!(browse_url(&base, "HC-1"), "http://localhost:8080/browse/HC-1");
    }

    #[test]
    fn endpoint_targets_rest_api_v2() {
        let client = JiraClient::new("https://jsw.atlassian.com", "u", "t").unwrap();
        let url = client.endpoint(&["project", "ABC", "versions"]).unwrap();
        assert_eq!(url.as_str(), "https://jsw.atlassian.com/rest/api/2/project/ABC/versions");
    }

    #[test]
    fn issue_body_is_normalized() {
        let body: IssueBody = serde_json::from_value(json!({
            "key": "HC-123",
            "fields": {
                "summary": "Fix login",
                "issuetype": {"name": "Bug"},
                "customfield_10200": "This is the detailed acceptance criteria."
            }
        }))
        .unwrap();

        let issue = tracker_issue(body);
        assert_eq!(issue.key, "HC-123");
        assert_eq!(issue.summary, "Fix login");
        assert_eq!(issue.issue_type, "Bug");
        assert!(issue.fields.contains_key("customfield_10200"));
    }

    #[test]
    fn versions_parse_flags() {
        let versions: Vec<Version> = serde_json::from_value(json!([
            {"name": "2.0", "released": false, "archived": false, "id": "1"},
            {"name": "1.0", "released": true}
        ]))
        .unwrap();
        assert_eq!(versions.len(), 2);
        assert!(versions[1].released);
        assert!(!versions[1].archived);
    }
}
