//! Project requirements.

use mvtool_core::catalog::{CatalogModule, CatalogRequirement};
use mvtool_core::enums::ComplianceStatus;
use mvtool_core::hints::{ProgressCounts, compliance_status_alert, compliance_status_hint};
use mvtool_core::imports::{CatalogRequirementImport, ProjectImport, RequirementImport, set_value};
use mvtool_core::inputs::RequirementInput;
use mvtool_core::iteration::CachedIterable;
use mvtool_core::project::{Measure, Project, Requirement};
use mvtool_core::validation::{self, ValidationError};
use mvtool_core::Key;
use mvtool_storage::{ListFilter, Record};
use tracing::info;

use crate::context::DataContext;
use crate::error::{DataError, Result};
use crate::etag_map::EtagMap;
use crate::fallback::resolve_parent;
use crate::reconcile::{Reconcile, assign, convert_imports, nested_key, touches};
use crate::records;

/// Default parents for requirement imports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequirementFallback {
    pub project: Option<Key<Project>>,
    /// Module for nested catalog requirements that carry none.
    pub catalog_module: Option<Key<CatalogModule>>,
}

#[derive(Debug, Default)]
pub struct RequirementRefs {
    projects: EtagMap<Key<Project>>,
    catalog_requirements: EtagMap<Key<CatalogRequirement>>,
}

impl Reconcile for Requirement {
    type Import = RequirementImport;
    type Fallback = RequirementFallback;
    type Refs = RequirementRefs;

    fn resolve_refs<I>(
        cx: &mut DataContext<'_>,
        imports: &mut CachedIterable<RequirementImport, I>,
        fallback: &RequirementFallback,
        patch: bool,
    ) -> Result<RequirementRefs>
    where
        I: Iterator<Item = RequirementImport>,
    {
        let projects: Vec<ProjectImport> = imports.iter().filter_map(|r| r.project).collect();
        let projects = convert_imports::<Project, _>(cx, projects, (), patch)?;

        let catalog_requirements: Vec<CatalogRequirementImport> = imports
            .iter()
            .filter_map(|r| r.catalog_requirement.flatten())
            .collect();
        let catalog_requirements = convert_imports::<CatalogRequirement, _>(
            cx,
            catalog_requirements,
            fallback.catalog_module,
            patch,
        )?;

        Ok(RequirementRefs {
            projects,
            catalog_requirements,
        })
    }

    fn create(
        import: &RequirementImport,
        refs: &RequirementRefs,
        fallback: &RequirementFallback,
    ) -> Result<Self> {
        let project = resolve_parent(
            nested_key(&refs.projects, import.project.as_ref()),
            fallback.project,
            "project",
        )?;
        Ok(Requirement::new(import.summary.clone(), project))
    }

    fn apply(requirement: &mut Self, import: &RequirementImport, patch: bool) {
        requirement.summary = import.summary.clone();
        assign(&mut requirement.reference, &import.reference, patch);
        assign(&mut requirement.description, &import.description, patch);
        assign(&mut requirement.compliance_status, &import.compliance_status, patch);
        assign(&mut requirement.compliance_comment, &import.compliance_comment, patch);
        assign(&mut requirement.target_object, &import.target_object, patch);
        assign(&mut requirement.milestone, &import.milestone, patch);
    }

    fn reparent(requirement: &mut Self, import: &RequirementImport, refs: &RequirementRefs) {
        if let Some(project) = nested_key(&refs.projects, import.project.as_ref()) {
            requirement.project = project;
        }
    }

    fn link(
        requirement: &mut Self,
        import: &RequirementImport,
        refs: &RequirementRefs,
        patch: bool,
    ) -> Result<()> {
        if touches(&import.catalog_requirement, patch) {
            requirement.catalog_requirement = nested_key(
                &refs.catalog_requirements,
                set_value(&import.catalog_requirement),
            );
        }
        Ok(())
    }

    fn validate(requirement: &Self) -> std::result::Result<(), ValidationError> {
        validation::validate_requirement(requirement)
    }
}

// ---------------------------------------------------------------------------
// Single-record services
// ---------------------------------------------------------------------------

fn apply_requirement_input(
    cx: &mut DataContext<'_>,
    requirement: &mut Requirement,
    input: &RequirementInput,
    patch: bool,
) -> Result<()> {
    requirement.summary = input.summary.clone();
    assign(&mut requirement.reference, &input.reference, patch);
    assign(&mut requirement.description, &input.description, patch);
    assign(&mut requirement.compliance_status, &input.compliance_status, patch);
    assign(&mut requirement.compliance_comment, &input.compliance_comment, patch);
    assign(&mut requirement.target_object, &input.target_object, patch);
    assign(&mut requirement.milestone, &input.milestone, patch);
    if touches(&input.catalog_requirement_id, patch) {
        requirement.catalog_requirement = match set_value(&input.catalog_requirement_id) {
            Some(&id) => Some(records::get::<CatalogRequirement>(cx, id)?),
            None => None,
        };
    }
    Ok(())
}

pub fn create_requirement(
    cx: &mut DataContext<'_>,
    project: Key<Project>,
    input: &RequirementInput,
) -> Result<Key<Requirement>> {
    let mut requirement = Requirement::new(input.summary.clone(), project);
    apply_requirement_input(cx, &mut requirement, input, false)?;
    validation::validate_requirement(&requirement)?;
    let key = cx.session.add(requirement);
    cx.session.flush()?;
    Ok(key)
}

pub fn update_requirement(
    cx: &mut DataContext<'_>,
    key: Key<Requirement>,
    input: &RequirementInput,
    patch: bool,
) -> Result<()> {
    let mut requirement = cx.session.get(key).clone();
    apply_requirement_input(cx, &mut requirement, input, patch)?;
    validation::validate_requirement(&requirement)?;
    *cx.session.get_mut(key) = requirement;
    cx.session.flush()?;
    Ok(())
}

/// Suggests a compliance status for a stored requirement from its measures.
pub fn requirement_compliance_hint(
    cx: &mut DataContext<'_>,
    key: Key<Requirement>,
) -> Result<Option<ComplianceStatus>> {
    let measures = requirement_measures(cx, key)?;
    Ok(compliance_status_hint(measures.iter().filter_map(|&measure| {
        cx.session.get(measure).compliance_status.as_ref()
    })))
}

/// The compliance hint, when it disagrees with the status set on the
/// requirement.
pub fn requirement_compliance_alert(
    cx: &mut DataContext<'_>,
    key: Key<Requirement>,
) -> Result<Option<ComplianceStatus>> {
    let hint = requirement_compliance_hint(cx, key)?;
    Ok(compliance_status_alert(
        cx.session.get(key).compliance_status.as_ref(),
        hint,
    ))
}

/// Completion and verification counts over the requirement's measures.
pub fn requirement_progress(cx: &mut DataContext<'_>, key: Key<Requirement>) -> Result<ProgressCounts> {
    let measures = requirement_measures(cx, key)?;
    Ok(ProgressCounts::of_measures(
        measures.iter().map(|&measure| cx.session.get(measure)),
    ))
}

pub(crate) fn requirement_measures(
    cx: &mut DataContext<'_>,
    key: Key<Requirement>,
) -> Result<Vec<Key<Measure>>> {
    let id = cx
        .session
        .id_of(key)
        .ok_or_else(|| DataError::client_input("Requirement has not been stored yet."))?;
    records::list::<Measure>(cx, &ListFilter::parent(id))
}

/// Creates one requirement in `project` for each catalog requirement id,
/// copying its text and linking it.
///
/// Fails with NotFound if any id is unknown; nothing is written then.
pub fn bulk_create_requirements_from_catalog_requirements(
    cx: &mut DataContext<'_>,
    project: Key<Project>,
    catalog_requirement_ids: &[i64],
) -> Result<Vec<Key<Requirement>>> {
    let loaded = cx
        .session
        .load_many_by_id::<CatalogRequirement>(catalog_requirement_ids)?;

    let mut created = Vec::with_capacity(catalog_requirement_ids.len());
    for id in catalog_requirement_ids {
        let source_key = *loaded
            .get(id)
            .ok_or_else(|| DataError::not_found(CatalogRequirement::KIND, "id", id))?;
        let source = cx.session.get(source_key);
        let mut requirement = Requirement::new(source.summary.clone(), project);
        requirement.reference = source.reference.clone();
        requirement.description = source.description.clone();
        requirement.catalog_requirement = Some(source_key);
        validation::validate_requirement(&requirement)?;
        created.push(cx.session.add(requirement));
    }
    cx.session.flush()?;
    info!(count = created.len(), "created requirements from catalog");
    Ok(created)
}
