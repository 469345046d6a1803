//! Jira access for mvtool.
//!
//! [`JiraClient`] is the seam to the remote system, with a blocking HTTP
//! implementation and an offline one. [`Jira`] wraps a client for the
//! duration of one request and keeps a cache of projects and issues, so a
//! listing can warm the cache with one batched call and then resolve every
//! row's link without further round trips.

pub mod cache;
pub mod client;
pub mod error;
pub mod fake;

use std::collections::HashMap;

use tracing::debug;

use mvtool_core::ExternalLookup;
use mvtool_core::jira::{JiraIssue, JiraProject};

pub use cache::ExternalRefCache;
pub use client::{HttpJiraClient, JiraClient, JiraConnection, OfflineJira};
pub use error::{JiraError, Result};
pub use fake::FakeJira;

/// Request-scoped view of Jira: a client plus project and issue caches.
pub struct Jira<'c> {
    client: &'c dyn JiraClient,
    projects: ExternalRefCache<JiraProject>,
    issues: ExternalRefCache<JiraIssue>,
}

impl<'c> Jira<'c> {
    pub fn new(client: &'c dyn JiraClient) -> Self {
        Self {
            client,
            projects: ExternalRefCache::new(),
            issues: ExternalRefCache::new(),
        }
    }

    pub fn client(&self) -> &'c dyn JiraClient {
        self.client
    }

    pub fn is_online(&self) -> bool {
        self.client.is_online()
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// Returns the project with `id`, `None` if it does not exist or is not
    /// visible. Only calls out on a cache miss with `try_fetch` set.
    pub fn lookup_project(&mut self, id: &str, try_fetch: bool) -> Result<Option<JiraProject>> {
        let client = self.client;
        self.projects
            .lookup_or_fetch(id, try_fetch, |id| client.fetch_project(id))
    }

    /// Fetches a project, bypassing the cache, and caches the result.
    pub fn get_project(&mut self, id: &str) -> Result<JiraProject> {
        let project = self.client.fetch_project(id)?;
        self.projects.insert(project.clone());
        Ok(project)
    }

    /// Lists all visible projects and caches them.
    pub fn list_projects(&mut self) -> Result<Vec<JiraProject>> {
        let projects = self.client.list_projects()?;
        for project in &projects {
            self.projects.insert(project.clone());
        }
        Ok(projects)
    }

    /// Resolves project keys or ids with a single listing call.
    pub fn batch_fetch_projects<'k, K>(&mut self, keys: K) -> Result<HashMap<String, JiraProject>>
    where
        K: IntoIterator<Item = &'k str>,
    {
        let client = self.client;
        self.projects.batch_fetch(keys, |_| client.list_projects())
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    /// Returns the issue with `id`, `None` if it does not exist or is not
    /// visible. Only calls out on a cache miss with `try_fetch` set.
    pub fn lookup_issue(&mut self, id: &str, try_fetch: bool) -> Result<Option<JiraIssue>> {
        let client = self.client;
        self.issues
            .lookup_or_fetch(id, try_fetch, |id| client.fetch_issue(id))
    }

    /// Fetches an issue, bypassing the cache, and caches the result.
    pub fn get_issue(&mut self, id_or_key: &str) -> Result<JiraIssue> {
        let issue = self.client.fetch_issue(id_or_key)?;
        self.issues.insert(issue.clone());
        Ok(issue)
    }

    /// Resolves issue keys or ids with a single search call.
    pub fn batch_fetch_issues<'k, K>(&mut self, keys: K) -> Result<HashMap<String, JiraIssue>>
    where
        K: IntoIterator<Item = &'k str>,
    {
        let client = self.client;
        let found = self
            .issues
            .batch_fetch(keys, |keys| client.search_issues(keys))?;
        debug!(found = found.len(), "resolved Jira issues");
        Ok(found)
    }
}

impl std::fmt::Debug for Jira<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jira")
            .field("projects", &self.projects.len())
            .field("issues", &self.issues.len())
            .finish_non_exhaustive()
    }
}

impl ExternalLookup<JiraProject> for Jira<'_> {
    type Error = JiraError;

    fn lookup_or_fetch(&mut self, id: &str, try_fetch: bool) -> Result<Option<JiraProject>> {
        self.lookup_project(id, try_fetch)
    }
}

impl ExternalLookup<JiraIssue> for Jira<'_> {
    type Error = JiraError;

    fn lookup_or_fetch(&mut self, id: &str, try_fetch: bool) -> Result<Option<JiraIssue>> {
        self.lookup_issue(id, try_fetch)
    }
}
