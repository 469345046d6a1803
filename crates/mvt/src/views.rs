//! Serializable views of stored records.
//!
//! Entities reference their parents by session key; views replace those with
//! database ids and resolve Jira links and status hints.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mvtool_core::Key;
use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::enums::KnownValue;
use mvtool_core::hints::ProgressCounts;
use mvtool_core::jira::{JiraIssue, JiraProject};
use mvtool_core::project::{Document, Measure, Project, Requirement};
use mvtool_data::DataContext;
use mvtool_data::measures::{measure_completion_hint, measure_jira_issue};
use mvtool_data::projects::{document_progress, project_jira_project, project_progress};
use mvtool_data::requirements::{
    requirement_compliance_alert, requirement_compliance_hint, requirement_progress,
};
use mvtool_storage::Record;
use serde::Serialize;

/// A record kind that can be shown.
pub trait Viewable: Record {
    type View: Serialize;

    /// Table header of the [`label`](Self::label) column.
    const LABEL: &'static str;

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<Self::View>;

    /// Short human label, e.g. a title.
    fn label(&self) -> &str;
}

fn id_of<R: Record>(cx: &DataContext<'_>, key: Key<R>) -> Result<i64> {
    cx.session
        .id_of(key)
        .with_context(|| format!("{} has not been stored", R::KIND))
}

/// Measure tallies plus the shares derived from them.
#[derive(Debug, Serialize)]
pub struct ProgressView {
    #[serde(flatten)]
    pub counts: ProgressCounts,
    pub completion_progress: Option<f64>,
    pub verification_progress: Option<f64>,
}

impl From<ProgressCounts> for ProgressView {
    fn from(counts: ProgressCounts) -> Self {
        Self {
            completion_progress: counts.completion_progress(),
            verification_progress: counts.verification_progress(),
            counts,
        }
    }
}

fn text<E: KnownValue>(value: Option<&E>) -> Option<String> {
    value.map(|v| v.as_str().to_owned())
}

// ---------------------------------------------------------------------------
// Catalogs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CatalogView {
    pub id: i64,
    pub reference: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Viewable for Catalog {
    type View = CatalogView;
    const LABEL: &'static str = "TITLE";

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<CatalogView> {
        let catalog = cx.session.get(key);
        Ok(CatalogView {
            id: id_of(cx, key)?,
            reference: catalog.reference.clone(),
            title: catalog.title.clone(),
            description: catalog.description.clone(),
            created: catalog.created,
            updated: catalog.updated,
        })
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogModuleView {
    pub id: i64,
    pub reference: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub catalog_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Viewable for CatalogModule {
    type View = CatalogModuleView;
    const LABEL: &'static str = "TITLE";

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<CatalogModuleView> {
        let module = cx.session.get(key);
        Ok(CatalogModuleView {
            id: id_of(cx, key)?,
            reference: module.reference.clone(),
            title: module.title.clone(),
            description: module.description.clone(),
            catalog_id: id_of(cx, module.catalog)?,
            created: module.created,
            updated: module.updated,
        })
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogRequirementView {
    pub id: i64,
    pub reference: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub gs_absicherung: Option<String>,
    pub gs_verantwortliche: Option<String>,
    pub catalog_module_id: i64,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Viewable for CatalogRequirement {
    type View = CatalogRequirementView;
    const LABEL: &'static str = "SUMMARY";

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<CatalogRequirementView> {
        let requirement = cx.session.get(key);
        Ok(CatalogRequirementView {
            id: id_of(cx, key)?,
            reference: requirement.reference.clone(),
            summary: requirement.summary.clone(),
            description: requirement.description.clone(),
            gs_absicherung: text(requirement.gs_absicherung.as_ref()),
            gs_verantwortliche: requirement.gs_verantwortliche.clone(),
            catalog_module_id: id_of(cx, requirement.catalog_module)?,
            created: requirement.created,
            updated: requirement.updated,
        })
    }

    fn label(&self) -> &str {
        &self.summary
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ProjectView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub jira_project_id: Option<String>,
    /// Resolved Jira project; absent when offline or not visible.
    pub jira_project: Option<JiraProject>,
    #[serde(flatten)]
    pub progress: ProgressView,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Viewable for Project {
    type View = ProjectView;
    const LABEL: &'static str = "NAME";

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<ProjectView> {
        let jira_project = project_jira_project(cx, key)?;
        let progress = project_progress(cx, key)?.into();
        let project = cx.session.get(key);
        Ok(ProjectView {
            id: id_of(cx, key)?,
            name: project.name.clone(),
            description: project.description.clone(),
            jira_project_id: project.jira_project.id().map(str::to_owned),
            jira_project,
            progress,
            created: project.created,
            updated: project.updated,
        })
    }

    fn label(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub id: i64,
    pub reference: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub project_id: i64,
    #[serde(flatten)]
    pub progress: ProgressView,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Viewable for Document {
    type View = DocumentView;
    const LABEL: &'static str = "TITLE";

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<DocumentView> {
        let progress = document_progress(cx, key)?.into();
        let document = cx.session.get(key);
        Ok(DocumentView {
            id: id_of(cx, key)?,
            reference: document.reference.clone(),
            title: document.title.clone(),
            description: document.description.clone(),
            project_id: id_of(cx, document.project)?,
            progress,
            created: document.created,
            updated: document.updated,
        })
    }

    fn label(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Serialize)]
pub struct RequirementView {
    pub id: i64,
    pub reference: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub compliance_status: Option<String>,
    pub compliance_status_hint: Option<String>,
    pub compliance_status_alert: Option<String>,
    pub compliance_comment: Option<String>,
    pub target_object: Option<String>,
    pub milestone: Option<String>,
    pub project_id: i64,
    pub catalog_requirement_id: Option<i64>,
    #[serde(flatten)]
    pub progress: ProgressView,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Viewable for Requirement {
    type View = RequirementView;
    const LABEL: &'static str = "SUMMARY";

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<RequirementView> {
        let hint = requirement_compliance_hint(cx, key)?;
        let alert = requirement_compliance_alert(cx, key)?;
        let progress = requirement_progress(cx, key)?.into();
        let requirement = cx.session.get(key);
        let catalog_requirement_id = match requirement.catalog_requirement {
            Some(linked) => Some(id_of(cx, linked)?),
            None => None,
        };
        Ok(RequirementView {
            id: id_of(cx, key)?,
            reference: requirement.reference.clone(),
            summary: requirement.summary.clone(),
            description: requirement.description.clone(),
            compliance_status: text(requirement.compliance_status.as_ref()),
            compliance_status_hint: text(hint.as_ref()),
            compliance_status_alert: text(alert.as_ref()),
            compliance_comment: requirement.compliance_comment.clone(),
            target_object: requirement.target_object.clone(),
            milestone: requirement.milestone.clone(),
            project_id: id_of(cx, requirement.project)?,
            catalog_requirement_id,
            progress,
            created: requirement.created,
            updated: requirement.updated,
        })
    }

    fn label(&self) -> &str {
        &self.summary
    }
}

#[derive(Debug, Serialize)]
pub struct MeasureView {
    pub id: i64,
    pub reference: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub compliance_status: Option<String>,
    pub compliance_comment: Option<String>,
    pub completion_status: Option<String>,
    pub completion_status_hint: Option<String>,
    pub completion_comment: Option<String>,
    pub verification_method: Option<String>,
    pub verification_status: Option<String>,
    pub verification_comment: Option<String>,
    pub requirement_id: i64,
    pub document_id: Option<i64>,
    pub jira_issue_id: Option<String>,
    /// Resolved Jira issue; absent when offline or not visible.
    pub jira_issue: Option<JiraIssue>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Viewable for Measure {
    type View = MeasureView;
    const LABEL: &'static str = "SUMMARY";

    fn view(cx: &mut DataContext<'_>, key: Key<Self>) -> Result<MeasureView> {
        let jira_issue = measure_jira_issue(cx, key)?;
        let hint = measure_completion_hint(cx, key)?;
        let measure = cx.session.get(key);
        let document_id = match measure.document {
            Some(document) => Some(id_of(cx, document)?),
            None => None,
        };
        Ok(MeasureView {
            id: id_of(cx, key)?,
            reference: measure.reference.clone(),
            summary: measure.summary.clone(),
            description: measure.description.clone(),
            compliance_status: text(measure.compliance_status.as_ref()),
            compliance_comment: measure.compliance_comment.clone(),
            completion_status: text(measure.completion_status.as_ref()),
            completion_status_hint: text(hint.as_ref()),
            completion_comment: measure.completion_comment.clone(),
            verification_method: text(measure.verification_method.as_ref()),
            verification_status: text(measure.verification_status.as_ref()),
            verification_comment: measure.verification_comment.clone(),
            requirement_id: id_of(cx, measure.requirement)?,
            document_id,
            jira_issue_id: measure.jira_issue.id().map(str::to_owned),
            jira_issue,
            created: measure.created,
            updated: measure.updated,
        })
    }

    fn label(&self) -> &str {
        &self.summary
    }
}
