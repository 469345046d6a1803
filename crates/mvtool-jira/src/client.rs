//! Jira REST client.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::Agent;
use ureq::tls::TlsConfig;

use mvtool_core::jira::{JiraIssue, JiraIssueStatus, JiraProject};

use crate::error::{JiraError, Result};

/// Fields requested for every issue.
const ISSUE_FIELDS: &str = "summary,description,issuetype,project,status";

/// Operations mvtool needs from Jira.
pub trait JiraClient {
    /// Fetches a project by id or key.
    fn fetch_project(&self, id: &str) -> Result<JiraProject>;

    /// Lists every project visible to the configured user.
    fn list_projects(&self) -> Result<Vec<JiraProject>>;

    /// Fetches an issue by id or key.
    fn fetch_issue(&self, id_or_key: &str) -> Result<JiraIssue>;

    /// Returns the issues whose key or id is in `keys`. Unknown keys are
    /// silently left out.
    fn search_issues(&self, keys: &[String]) -> Result<Vec<JiraIssue>>;

    /// Returns `false` when calls can never succeed because no connection
    /// is configured.
    fn is_online(&self) -> bool {
        true
    }
}

/// Connection settings for [`HttpJiraClient`].
#[derive(Debug, Clone)]
pub struct JiraConnection {
    /// Base URL, e.g. `https://jira.example.com`.
    pub url: String,
    /// User name for basic auth; without one the token is sent as bearer.
    pub username: Option<String>,
    pub token: String,
    pub verify_ssl: bool,
    pub timeout: Duration,
}

/// Blocking HTTP client for the Jira REST API v2.
pub struct HttpJiraClient {
    agent: Agent,
    base_url: String,
    authorization: String,
}

impl HttpJiraClient {
    pub fn new(connection: &JiraConnection) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(connection.timeout))
            .tls_config(
                TlsConfig::builder()
                    .disable_verification(!connection.verify_ssl)
                    .build(),
            )
            .build();
        let authorization = match &connection.username {
            Some(username) => {
                let credentials = STANDARD.encode(format!("{username}:{}", connection.token));
                format!("Basic {credentials}")
            }
            None => format!("Bearer {}", connection.token),
        };
        Self {
            agent: config.into(),
            base_url: connection.url.trim_end_matches('/').to_owned(),
            authorization,
        }
    }

    fn browse_url(&self, key: &str) -> String {
        format!("{}/browse/{key}", self.base_url)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "GET");
        let mut request = self
            .agent
            .get(&url)
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        for &(name, value) in query {
            request = request.query(name, value);
        }
        let mut response = request.call()?;
        response
            .body_mut()
            .read_json::<T>()
            .map_err(|e| JiraError::Decode(e.to_string()))
    }

    fn project(&self, payload: ProjectPayload) -> JiraProject {
        JiraProject {
            url: self.browse_url(&payload.key),
            id: payload.id,
            key: payload.key,
            name: payload.name,
        }
    }

    fn issue(&self, payload: IssuePayload) -> JiraIssue {
        let fields = payload.fields;
        JiraIssue {
            url: self.browse_url(&payload.key),
            id: payload.id,
            key: payload.key,
            summary: fields.summary,
            description: fields.description,
            issuetype_id: fields.issuetype.id,
            project_id: fields.project.id,
            status: JiraIssueStatus {
                completed: fields.status.status_category.color_name.eq_ignore_ascii_case("green"),
                name: fields.status.name,
                color_name: fields.status.status_category.color_name,
            },
        }
    }
}

impl JiraClient for HttpJiraClient {
    fn fetch_project(&self, id: &str) -> Result<JiraProject> {
        let payload: ProjectPayload = self.get_json(&format!("/rest/api/2/project/{id}"), &[])?;
        Ok(self.project(payload))
    }

    fn list_projects(&self) -> Result<Vec<JiraProject>> {
        let payload: Vec<ProjectPayload> = self.get_json("/rest/api/2/project", &[])?;
        Ok(payload.into_iter().map(|p| self.project(p)).collect())
    }

    fn fetch_issue(&self, id_or_key: &str) -> Result<JiraIssue> {
        let payload: IssuePayload = self.get_json(
            &format!("/rest/api/2/issue/{id_or_key}"),
            &[("fields", ISSUE_FIELDS)],
        )?;
        Ok(self.issue(payload))
    }

    fn search_issues(&self, keys: &[String]) -> Result<Vec<JiraIssue>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let jql = issue_key_jql(keys);
        let max_results = keys.len().to_string();
        let issues = collect_search_pages(|start_at| {
            let start_at = start_at.to_string();
            self.get_json(
                "/rest/api/2/search",
                &[
                    ("jql", jql.as_str()),
                    ("fields", ISSUE_FIELDS),
                    ("startAt", start_at.as_str()),
                    ("maxResults", max_results.as_str()),
                    ("validateQuery", "false"),
                ],
            )
        })?;
        Ok(issues.into_iter().map(|i| self.issue(i)).collect())
    }
}

/// Requests search pages until `total` issues are collected. The server may
/// cap the page size below the requested `maxResults`.
fn collect_search_pages<F>(mut fetch_page: F) -> Result<Vec<IssuePayload>>
where
    F: FnMut(usize) -> Result<SearchPayload>,
{
    let mut issues = Vec::new();
    loop {
        let page = fetch_page(issues.len())?;
        let received = page.issues.len();
        issues.extend(page.issues);
        if received == 0 || issues.len() >= page.total {
            break;
        }
        debug!(collected = issues.len(), total = page.total, "fetching next search page");
    }
    Ok(issues)
}

impl std::fmt::Debug for HttpJiraClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJiraClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Client used when no Jira connection is configured. Every call fails with
/// [`JiraError::NotConfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineJira;

impl JiraClient for OfflineJira {
    fn fetch_project(&self, _id: &str) -> Result<JiraProject> {
        Err(JiraError::NotConfigured)
    }

    fn list_projects(&self) -> Result<Vec<JiraProject>> {
        Err(JiraError::NotConfigured)
    }

    fn fetch_issue(&self, _id_or_key: &str) -> Result<JiraIssue> {
        Err(JiraError::NotConfigured)
    }

    fn search_issues(&self, _keys: &[String]) -> Result<Vec<JiraIssue>> {
        Err(JiraError::NotConfigured)
    }

    fn is_online(&self) -> bool {
        false
    }
}

/// Builds `issuekey in ("A-1", "A-2")`. Jira accepts ids there as well.
pub(crate) fn issue_key_jql(keys: &[String]) -> String {
    let quoted: Vec<String> = keys
        .iter()
        .map(|k| format!("\"{}\"", k.replace('\\', "\\\\").replace('"', "\\\"")))
        .collect();
    format!("issuekey in ({})", quoted.join(", "))
}

// ---------------------------------------------------------------------------
// Wire payloads
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ProjectPayload {
    id: String,
    key: String,
    name: String,
}

#[derive(Deserialize)]
struct IssuePayload {
    id: String,
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    summary: String,
    #[serde(default)]
    description: Option<String>,
    issuetype: IdPayload,
    project: IdPayload,
    status: StatusPayload,
}

#[derive(Deserialize)]
struct IdPayload {
    id: String,
}

#[derive(Deserialize)]
struct StatusPayload {
    name: String,
    #[serde(rename = "statusCategory")]
    status_category: StatusCategoryPayload,
}

#[derive(Deserialize)]
struct StatusCategoryPayload {
    #[serde(rename = "colorName")]
    color_name: String,
}

#[derive(Deserialize)]
struct SearchPayload {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    issues: Vec<IssuePayload>,
}
