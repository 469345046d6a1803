//! Input DTOs for single-record create and update.
//!
//! Unlike import records, inputs refer to related rows by id. The parent of
//! a new entity is passed alongside the input, not inside it. Optional
//! fields follow the same `Option<Option<T>>` convention as imports so that
//! patch updates only touch what was sent.

use serde::{Deserialize, Serialize};

use crate::enums::{
    ComplianceStatus, CompletionStatus, GsAbsicherung, VerificationMethod, VerificationStatus,
};
use crate::imports::set_or_null;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogInput {
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub title: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogModuleInput {
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub title: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRequirementInput {
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub summary: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub gs_absicherung: Option<Option<GsAbsicherung>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub gs_verantwortliche: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    /// Jira project id, checked against Jira before it is stored.
    #[serde(default, deserialize_with = "set_or_null")]
    pub jira_project_id: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub title: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementInput {
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub summary: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub compliance_status: Option<Option<ComplianceStatus>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub compliance_comment: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub target_object: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub milestone: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub catalog_requirement_id: Option<Option<i64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureInput {
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub summary: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub compliance_status: Option<Option<ComplianceStatus>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub compliance_comment: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub completion_status: Option<Option<CompletionStatus>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub completion_comment: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub verification_method: Option<Option<VerificationMethod>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub verification_status: Option<Option<VerificationStatus>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub verification_comment: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub document_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub jira_issue_id: Option<Option<String>>,
}
