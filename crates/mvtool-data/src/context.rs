//! Per-call state shared by every reconciler and service.

use mvtool_core::FetchPolicy;
use mvtool_core::jira::{JiraIssue, JiraProject};
use mvtool_jira::{Jira, JiraClient};
use mvtool_storage::Session;

use crate::error::{DataError, Result};

/// The session and Jira caches of one call.
///
/// Nested reconcilers borrow the same context, so everything they add ends
/// up in one session and is written by one flush.
pub struct DataContext<'c> {
    pub session: Session<'c>,
    pub jira: Jira<'c>,
}

impl<'c> DataContext<'c> {
    pub fn new(session: Session<'c>, jira_client: &'c dyn JiraClient) -> Self {
        Self {
            session,
            jira: Jira::new(jira_client),
        }
    }

    /// Policy for links of rows handed out one at a time: fetch on demand
    /// when Jira is reachable at all.
    pub fn fetch_policy(&self) -> FetchPolicy {
        if self.jira.is_online() {
            FetchPolicy::TryFetch
        } else {
            FetchPolicy::CacheOnly
        }
    }

    /// Loads the Jira project with `id`, failing with NotFound if it does not
    /// exist or is hidden.
    pub fn check_jira_project_id(&mut self, id: &str) -> Result<JiraProject> {
        self.jira
            .lookup_project(id, true)?
            .ok_or_else(|| DataError::not_found("Jira project", "id", id))
    }

    /// Loads the Jira issue with `id`, failing with NotFound if it does not
    /// exist or is hidden.
    pub fn check_jira_issue_id(&mut self, id: &str) -> Result<JiraIssue> {
        self.jira
            .lookup_issue(id, true)?
            .ok_or_else(|| DataError::not_found("Jira issue", "id", id))
    }
}

impl std::fmt::Debug for DataContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataContext")
            .field("flushes", &self.session.flush_count())
            .field("jira", &self.jira)
            .finish()
    }
}
