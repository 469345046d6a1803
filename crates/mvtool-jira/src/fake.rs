//! In-memory [`JiraClient`] for tests and demos.

use std::cell::{Cell, RefCell};

use mvtool_core::jira::{JiraIssue, JiraIssueStatus, JiraProject};

use crate::client::JiraClient;
use crate::error::{JiraError, Result};

/// Serves a fixed set of projects and issues and counts the calls made.
#[derive(Debug, Default)]
pub struct FakeJira {
    projects: Vec<JiraProject>,
    issues: Vec<JiraIssue>,
    /// Ids or keys answered with this status instead of a result.
    failures: Vec<(String, u16)>,
    calls: Cell<usize>,
    log: RefCell<Vec<String>>,
}

impl FakeJira {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project with a browse URL under `https://jira.test`.
    pub fn with_project(mut self, id: &str, key: &str, name: &str) -> Self {
        self.projects.push(JiraProject {
            id: id.to_owned(),
            key: key.to_owned(),
            name: name.to_owned(),
            url: format!("https://jira.test/browse/{key}"),
        });
        self
    }

    /// Adds an issue in the project with `project_id`.
    pub fn with_issue(mut self, id: &str, key: &str, project_id: &str, completed: bool) -> Self {
        self.issues.push(JiraIssue {
            id: id.to_owned(),
            key: key.to_owned(),
            summary: format!("Issue {key}"),
            description: None,
            issuetype_id: "1".to_owned(),
            project_id: project_id.to_owned(),
            status: JiraIssueStatus {
                name: if completed { "Done" } else { "Open" }.to_owned(),
                color_name: if completed { "green" } else { "blue-gray" }.to_owned(),
                completed,
            },
            url: format!("https://jira.test/browse/{key}"),
        });
        self
    }

    /// Makes single-entity fetches for `id_or_key` fail with `status`.
    pub fn failing(mut self, id_or_key: &str, status: u16) -> Self {
        self.failures.push((id_or_key.to_owned(), status));
        self
    }

    /// Total number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Calls made so far, e.g. `fetch_issue 10001`.
    pub fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.set(self.calls.get() + 1);
        self.log.borrow_mut().push(call);
    }

    fn check_failure(&self, id_or_key: &str) -> Result<()> {
        match self.failures.iter().find(|(k, _)| k == id_or_key) {
            Some(&(_, status)) => Err(JiraError::status(status)),
            None => Ok(()),
        }
    }
}

impl JiraClient for FakeJira {
    fn fetch_project(&self, id: &str) -> Result<JiraProject> {
        self.record(format!("fetch_project {id}"));
        self.check_failure(id)?;
        self.projects
            .iter()
            .find(|p| p.id == id || p.key == id)
            .cloned()
            .ok_or(JiraError::status(404))
    }

    fn list_projects(&self) -> Result<Vec<JiraProject>> {
        self.record("list_projects".to_owned());
        Ok(self.projects.clone())
    }

    fn fetch_issue(&self, id_or_key: &str) -> Result<JiraIssue> {
        self.record(format!("fetch_issue {id_or_key}"));
        self.check_failure(id_or_key)?;
        self.issues
            .iter()
            .find(|i| i.id == id_or_key || i.key == id_or_key)
            .cloned()
            .ok_or(JiraError::status(404))
    }

    fn search_issues(&self, keys: &[String]) -> Result<Vec<JiraIssue>> {
        self.record(format!("search_issues {}", keys.join(",")));
        Ok(self
            .issues
            .iter()
            .filter(|i| keys.iter().any(|k| *k == i.id || *k == i.key))
            .cloned()
            .collect())
    }
}
