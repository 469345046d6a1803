//! Jira models as seen by mvtool.

use serde::{Deserialize, Serialize};

use crate::external::ExternalEntity;

/// A Jira project a mvtool project can be linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraProject {
    pub id: String,
    pub key: String,
    pub name: String,
    /// Browser URL of the project.
    pub url: String,
}

/// Workflow status of a Jira issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraIssueStatus {
    pub name: String,
    pub color_name: String,
    /// `true` when the status belongs to the "done" category.
    pub completed: bool,
}

/// A Jira issue a measure can be linked to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraIssue {
    pub id: String,
    pub key: String,
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    pub issuetype_id: String,
    pub project_id: String,
    pub status: JiraIssueStatus,
    /// Browser URL of the issue.
    pub url: String,
}

/// Reference to a Jira project by key inside an import record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JiraProjectImport {
    pub key: String,
}

/// Reference to a Jira issue by key inside an import record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JiraIssueImport {
    pub key: String,
}

impl ExternalEntity for JiraProject {
    const KIND: &'static str = "Jira project";

    fn external_id(&self) -> &str {
        &self.id
    }

    fn external_key(&self) -> &str {
        &self.key
    }
}

impl ExternalEntity for JiraIssue {
    const KIND: &'static str = "Jira issue";

    fn external_id(&self) -> &str {
        &self.id
    }

    fn external_key(&self) -> &str {
        &self.key
    }
}
