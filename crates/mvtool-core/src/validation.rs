//! Field rules checked before an entity is written.

use crate::catalog::{Catalog, CatalogModule, CatalogRequirement};
use crate::enums::KnownValue;
use crate::project::{Document, Measure, Project, Requirement};

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("{field} cannot be set when {requires} is not set")]
    MissingDependency {
        field: &'static str,
        requires: &'static str,
    },
}

type Result = std::result::Result<(), ValidationError>;

pub fn validate_catalog(catalog: &Catalog) -> Result {
    require_text("title", &catalog.title)
}

pub fn validate_catalog_module(module: &CatalogModule) -> Result {
    require_text("title", &module.title)
}

pub fn validate_catalog_requirement(requirement: &CatalogRequirement) -> Result {
    require_text("summary", &requirement.summary)?;
    require_known("gs_absicherung", requirement.gs_absicherung.as_ref())
}

pub fn validate_project(project: &Project) -> Result {
    require_text("name", &project.name)
}

pub fn validate_document(document: &Document) -> Result {
    require_text("title", &document.title)
}

pub fn validate_requirement(requirement: &Requirement) -> Result {
    require_text("summary", &requirement.summary)?;
    require_known("compliance_status", requirement.compliance_status.as_ref())?;
    requires(
        "compliance_comment",
        requirement.compliance_comment.is_some(),
        "compliance_status",
        requirement.compliance_status.is_some(),
    )
}

pub fn validate_measure(measure: &Measure) -> Result {
    require_text("summary", &measure.summary)?;
    require_known("compliance_status", measure.compliance_status.as_ref())?;
    require_known("completion_status", measure.completion_status.as_ref())?;
    require_known("verification_method", measure.verification_method.as_ref())?;
    require_known("verification_status", measure.verification_status.as_ref())?;

    requires(
        "compliance_comment",
        measure.compliance_comment.is_some(),
        "compliance_status",
        measure.compliance_status.is_some(),
    )?;
    requires(
        "completion_comment",
        measure.completion_comment.is_some(),
        "completion_status",
        measure.completion_status.is_some(),
    )?;
    let has_method = measure.verification_method.is_some();
    requires(
        "verification_status",
        measure.verification_status.is_some(),
        "verification_method",
        has_method,
    )?;
    requires(
        "verification_comment",
        measure.verification_comment.is_some(),
        "verification_method",
        has_method,
    )
}

fn require_text(field: &'static str, value: &str) -> Result {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field });
    }
    Ok(())
}

fn require_known<E: KnownValue>(field: &'static str, value: Option<&E>) -> Result {
    match value {
        Some(v) if !v.is_builtin() => Err(ValidationError::InvalidValue {
            field,
            value: v.as_str().to_owned(),
        }),
        _ => Ok(()),
    }
}

fn requires(field: &'static str, present: bool, requires: &'static str, satisfied: bool) -> Result {
    if present && !satisfied {
        return Err(ValidationError::MissingDependency { field, requires });
    }
    Ok(())
}
