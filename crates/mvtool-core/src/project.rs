//! Project hierarchy: a project owns requirements and documents, a
//! requirement owns measures.

use chrono::{DateTime, Utc};

use crate::catalog::CatalogRequirement;
use crate::enums::{ComplianceStatus, CompletionStatus, VerificationMethod, VerificationStatus};
use crate::external::ExternalRef;
use crate::jira::{JiraIssue, JiraProject};
use crate::key::Key;

/// A compliance project.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    /// Database id; `None` until the row has been flushed.
    pub id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    /// Linked Jira project, stored by Jira id.
    pub jira_project: ExternalRef<JiraProject>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Project {
    /// Creates an unsaved project with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            name: name.into(),
            description: None,
            jira_project: ExternalRef::default(),
            created: now,
            updated: now,
        }
    }
}

/// A document belonging to a project, referenced by measures.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: Option<i64>,
    pub reference: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub project: Key<Project>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Document {
    pub fn new(title: impl Into<String>, project: Key<Project>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            reference: None,
            title: title.into(),
            description: None,
            project,
            created: now,
            updated: now,
        }
    }
}

/// A requirement a project has to fulfil, optionally adopted from a catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub id: Option<i64>,
    pub reference: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub compliance_status: Option<ComplianceStatus>,
    pub compliance_comment: Option<String>,
    pub target_object: Option<String>,
    pub milestone: Option<String>,
    pub project: Key<Project>,
    /// Catalog requirement this one was adopted from. Not owned.
    pub catalog_requirement: Option<Key<CatalogRequirement>>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Requirement {
    pub fn new(summary: impl Into<String>, project: Key<Project>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            reference: None,
            summary: summary.into(),
            description: None,
            compliance_status: None,
            compliance_comment: None,
            target_object: None,
            milestone: None,
            project,
            catalog_requirement: None,
            created: now,
            updated: now,
        }
    }
}

/// A concrete measure implementing a requirement.
#[derive(Debug, Clone, PartialEq)]
pub struct Measure {
    pub id: Option<i64>,
    pub reference: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub compliance_status: Option<ComplianceStatus>,
    pub compliance_comment: Option<String>,
    pub completion_status: Option<CompletionStatus>,
    pub completion_comment: Option<String>,
    pub verification_method: Option<VerificationMethod>,
    pub verification_status: Option<VerificationStatus>,
    pub verification_comment: Option<String>,
    pub requirement: Key<Requirement>,
    /// Evidence document. Not owned; deleting the measure keeps it.
    pub document: Option<Key<Document>>,
    /// Linked Jira issue, stored by Jira id.
    pub jira_issue: ExternalRef<JiraIssue>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Measure {
    pub fn new(summary: impl Into<String>, requirement: Key<Requirement>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            reference: None,
            summary: summary.into(),
            description: None,
            compliance_status: None,
            compliance_comment: None,
            completion_status: None,
            completion_comment: None,
            verification_method: None,
            verification_status: None,
            verification_comment: None,
            requirement,
            document: None,
            jira_issue: ExternalRef::default(),
            created: now,
            updated: now,
        }
    }
}
