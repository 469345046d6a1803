//! Import records: the desired state of an entity, as read from a bulk file.
//!
//! An import without `id` asks for a new entity, one with `id` updates the
//! existing row. Nested imports describe parents (or weakly linked entities)
//! that are created or found by content within the same call.
//!
//! Optional fields are `Option<Option<T>>` so that patch mode can tell a
//! field that was left out (`None`) from one explicitly set to null
//! (`Some(None)`). Both serialize to `null`, so they share an etag.

use serde::{Deserialize, Deserializer, Serialize};

use crate::enums::{
    ComplianceStatus, CompletionStatus, GsAbsicherung, VerificationMethod, VerificationStatus,
};
use crate::etag::Etag;
use crate::jira::{JiraIssueImport, JiraProjectImport};

/// Behaviour shared by all import records.
pub trait ImportRecord: Clone + Serialize {
    /// Id of the row to update, `None` to create.
    fn id(&self) -> Option<i64>;

    /// Content key over the whole record, nested imports included.
    fn etag(&self) -> Etag {
        Etag::of(self)
    }
}

/// Deserializes a present field, `null` included, as `Some`.
///
/// Paired with `#[serde(default)]`, a missing field stays `None`.
pub fn set_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Returns the nested value of a field that was set to a non-null value.
pub fn set_value<T>(field: &Option<Option<T>>) -> Option<&T> {
    field.as_ref().and_then(Option::as_ref)
}

macro_rules! impl_import_record {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ImportRecord for $ty {
                fn id(&self) -> Option<i64> {
                    self.id
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// Catalog hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogImport {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub title: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogModuleImport {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub title: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    /// Owning catalog, created or found by content.
    #[serde(default)]
    pub catalog: Option<CatalogImport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRequirementImport {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub summary: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub gs_absicherung: Option<Option<GsAbsicherung>>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub gs_verantwortliche: Option<Option<String>>,
    #[serde(default)]
    pub catalog_module: Option<CatalogModuleImport>,
}

// ---------------------------------------------------------------------------
// Project hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectImport {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    /// Jira project by key; explicit `null` unlinks.
    #[serde(default, deserialize_with = "set_or_null")]
    pub jira_project: Option<Option<JiraProjectImport>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentImport {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "set_or_null")]
    pub reference: Option<Option<String>>,
    pub title: String,
    #[serde(default, deserialize_with = "set_or_null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub project: Option<ProjectImport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementImport {
    #[serde(default)]
    pub id: Option<i64>,
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
    #[serde(default)]
    pub project: Option<ProjectImport>,
    /// Weak link; explicit `null` unlinks.
    #[serde(default, deserialize_with = "set_or_null")]
    pub catalog_requirement: Option<Option<CatalogRequirementImport>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasureImport {
    #[serde(default)]
    pub id: Option<i64>,
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
    #[serde(default)]
    pub requirement: Option<RequirementImport>,
    /// Weak link; explicit `null` unlinks.
    #[serde(default, deserialize_with = "set_or_null")]
    pub document: Option<Option<DocumentImport>>,
    /// Jira issue by key; explicit `null` unlinks.
    #[serde(default, deserialize_with = "set_or_null")]
    pub jira_issue: Option<Option<JiraIssueImport>>,
}

impl_import_record!(
    CatalogImport,
    CatalogModuleImport,
    CatalogRequirementImport,
    ProjectImport,
    DocumentImport,
    RequirementImport,
    MeasureImport,
);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::{assert_eq, assert_ne};

    #[test]
    fn missing_and_null_fields_are_distinguished() {
        let missing: CatalogImport = serde_json::from_str(r#"{"title":"A"}"#).unwrap();
        let null: CatalogImport =
            serde_json::from_str(r#"{"title":"A","description":null}"#).unwrap();
        let set: CatalogImport =
            serde_json::from_str(r#"{"title":"A","description":"d"}"#).unwrap();

        assert_eq!(missing.description, None);
        assert_eq!(null.description, Some(None));
        assert_eq!(set.description, Some(Some("d".to_owned())));
    }

    #[test]
    fn missing_and_null_share_an_etag() {
        let missing: CatalogImport = serde_json::from_str(r#"{"title":"A"}"#).unwrap();
        let null: CatalogImport =
            serde_json::from_str(r#"{"title":"A","description":null,"reference":null}"#)
                .unwrap();
        assert_eq!(missing.etag(), null.etag());
    }

    #[test]
    fn etag_covers_nested_imports() {
        let module = |catalog_title: &str| CatalogModuleImport {
            title: "M".into(),
            catalog: Some(CatalogImport {
                title: catalog_title.into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(module("C").etag(), module("C").etag());
        assert_ne!(module("C").etag(), module("D").etag());
    }

    #[test]
    fn etag_covers_id() {
        let a = CatalogImport {
            title: "A".into(),
            ..Default::default()
        };
        let b = CatalogImport {
            id: Some(1),
            ..a.clone()
        };
        assert_ne!(a.etag(), b.etag());
    }

    #[test]
    fn nested_weak_link_parses() {
        let imp: MeasureImport = serde_json::from_str(
            r#"{"summary":"S","document":null,"jira_issue":{"key":"P-1"},
                "requirement":{"summary":"R","project":{"name":"Acme"}}}"#,
        )
        .unwrap();
        assert_eq!(imp.document, Some(None));
        assert_eq!(set_value(&imp.jira_issue).map(|j| j.key.as_str()), Some("P-1"));
        let requirement = imp.requirement.unwrap();
        assert_eq!(requirement.project.unwrap().name, "Acme");
    }
}
