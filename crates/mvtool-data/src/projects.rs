//! Projects and their documents.

use std::collections::HashMap;

use mvtool_core::hints::{ProgressCounts, needs_completion};
use mvtool_core::imports::{DocumentImport, ProjectImport, set_value};
use mvtool_core::inputs::{DocumentInput, ProjectInput};
use mvtool_core::iteration::CachedIterable;
use mvtool_core::jira::JiraProject;
use mvtool_core::project::{Document, Measure, Project, Requirement};
use mvtool_core::validation::{self, ValidationError};
use mvtool_core::{FetchPolicy, Key};
use mvtool_storage::{ListFilter, Record};

use crate::context::DataContext;
use crate::error::{DataError, Result};
use crate::etag_map::EtagMap;
use crate::fallback::resolve_parent;
use crate::reconcile::{Reconcile, assign, convert_imports, nested_key, touches};
use crate::records;
use crate::requirements::requirement_measures;

// ---------------------------------------------------------------------------
// Import reconciliation
// ---------------------------------------------------------------------------

impl Reconcile for Project {
    type Import = ProjectImport;
    type Fallback = ();
    /// Jira projects named by the batch, by key.
    type Refs = HashMap<String, JiraProject>;

    fn resolve_refs<I>(
        cx: &mut DataContext<'_>,
        imports: &mut CachedIterable<ProjectImport, I>,
        _fallback: &(),
        _patch: bool,
    ) -> Result<HashMap<String, JiraProject>>
    where
        I: Iterator<Item = ProjectImport>,
    {
        let keys: Vec<String> = imports
            .iter()
            .filter_map(|p| p.jira_project.flatten().map(|j| j.key))
            .collect();
        Ok(cx.jira.batch_fetch_projects(keys.iter().map(String::as_str))?)
    }

    fn create(import: &ProjectImport, _refs: &Self::Refs, _fallback: &()) -> Result<Self> {
        Ok(Project::new(import.name.clone()))
    }

    fn apply(project: &mut Self, import: &ProjectImport, patch: bool) {
        project.name = import.name.clone();
        assign(&mut project.description, &import.description, patch);
    }

    fn link(
        project: &mut Self,
        import: &ProjectImport,
        refs: &Self::Refs,
        patch: bool,
    ) -> Result<()> {
        if !touches(&import.jira_project, patch) {
            return Ok(());
        }
        match set_value(&import.jira_project) {
            Some(jira_project) => {
                let found = refs
                    .get(&jira_project.key)
                    .ok_or_else(|| DataError::not_found("Jira project", "key", &jira_project.key))?;
                project.jira_project.assign(Some(found));
            }
            None => project.jira_project.assign(None),
        }
        Ok(())
    }

    fn validate(project: &Self) -> std::result::Result<(), ValidationError> {
        validation::validate_project(project)
    }
}

impl Reconcile for Document {
    type Import = DocumentImport;
    type Fallback = Option<Key<Project>>;
    type Refs = EtagMap<Key<Project>>;

    fn resolve_refs<I>(
        cx: &mut DataContext<'_>,
        imports: &mut CachedIterable<DocumentImport, I>,
        _fallback: &Option<Key<Project>>,
        patch: bool,
    ) -> Result<EtagMap<Key<Project>>>
    where
        I: Iterator<Item = DocumentImport>,
    {
        let projects: Vec<ProjectImport> = imports.iter().filter_map(|d| d.project).collect();
        convert_imports::<Project, _>(cx, projects, (), patch)
    }

    fn create(
        import: &DocumentImport,
        refs: &EtagMap<Key<Project>>,
        fallback: &Option<Key<Project>>,
    ) -> Result<Self> {
        let project = resolve_parent(
            nested_key(refs, import.project.as_ref()),
            *fallback,
            "project",
        )?;
        Ok(Document::new(import.title.clone(), project))
    }

    fn apply(document: &mut Self, import: &DocumentImport, patch: bool) {
        document.title = import.title.clone();
        assign(&mut document.reference, &import.reference, patch);
        assign(&mut document.description, &import.description, patch);
    }

    fn reparent(document: &mut Self, import: &DocumentImport, refs: &EtagMap<Key<Project>>) {
        if let Some(project) = nested_key(refs, import.project.as_ref()) {
            document.project = project;
        }
    }

    fn validate(document: &Self) -> std::result::Result<(), ValidationError> {
        validation::validate_document(document)
    }
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

fn apply_project_input(
    cx: &mut DataContext<'_>,
    project: &mut Project,
    input: &ProjectInput,
    patch: bool,
) -> Result<()> {
    project.name = input.name.clone();
    assign(&mut project.description, &input.description, patch);
    if touches(&input.jira_project_id, patch) {
        match set_value(&input.jira_project_id) {
            Some(id) => {
                let jira_project = cx.check_jira_project_id(id)?;
                project.jira_project.assign(Some(&jira_project));
            }
            None => project.jira_project.assign(None),
        }
    }
    project.jira_project.bind(FetchPolicy::CacheOnly);
    Ok(())
}

/// Creates a project. A Jira project id must name an existing project.
pub fn create_project(cx: &mut DataContext<'_>, input: &ProjectInput) -> Result<Key<Project>> {
    let mut project = Project::new(input.name.clone());
    apply_project_input(cx, &mut project, input, false)?;
    validation::validate_project(&project)?;
    let key = cx.session.add(project);
    cx.session.flush()?;
    Ok(key)
}

pub fn update_project(
    cx: &mut DataContext<'_>,
    key: Key<Project>,
    input: &ProjectInput,
    patch: bool,
) -> Result<()> {
    let mut project = cx.session.get(key).clone();
    apply_project_input(cx, &mut project, input, patch)?;
    validation::validate_project(&project)?;
    *cx.session.get_mut(key) = project;
    cx.session.flush()?;
    Ok(())
}

/// Loads a project whose Jira link resolves on demand when Jira is online.
pub fn get_project(cx: &mut DataContext<'_>, id: i64) -> Result<Key<Project>> {
    let key = records::get::<Project>(cx, id)?;
    cx.session.get(key).jira_project.bind(cx.fetch_policy());
    Ok(key)
}

/// Lists projects after fetching all their Jira projects in one call. The
/// links then resolve from the cache only.
pub fn list_projects(cx: &mut DataContext<'_>, filter: &ListFilter) -> Result<Vec<Key<Project>>> {
    let keys = records::list::<Project>(cx, filter)?;
    if cx.jira.is_online() {
        let ids: Vec<String> = keys
            .iter()
            .filter_map(|&key| cx.session.get(key).jira_project.id().map(str::to_owned))
            .collect();
        cx.jira.batch_fetch_projects(ids.iter().map(String::as_str))?;
    }
    for &key in &keys {
        cx.session.get(key).jira_project.bind(FetchPolicy::CacheOnly);
    }
    Ok(keys)
}

/// Resolves the Jira project linked to a loaded project.
pub fn project_jira_project(cx: &mut DataContext<'_>, key: Key<Project>) -> Result<Option<JiraProject>> {
    let DataContext { session, jira } = cx;
    Ok(session.get(key).jira_project.resolve(jira)?.cloned())
}

/// Completion and verification counts over the measures of the project's
/// requirements. Requirements that need no completion are skipped; one
/// without measures counts as a single open item.
pub fn project_progress(cx: &mut DataContext<'_>, key: Key<Project>) -> Result<ProgressCounts> {
    let id = stored_id(cx, key)?;
    let requirements = records::list::<Requirement>(cx, &ListFilter::parent(id))?;
    let mut counts = ProgressCounts::default();
    for requirement in requirements {
        if !needs_completion(cx.session.get(requirement).compliance_status.as_ref()) {
            continue;
        }
        let measures = requirement_measures(cx, requirement)?;
        if measures.is_empty() {
            counts.add_unplanned();
        }
        for measure in measures {
            counts.add(cx.session.get(measure));
        }
    }
    Ok(counts)
}

fn stored_id<R: Record>(cx: &DataContext<'_>, key: Key<R>) -> Result<i64> {
    cx.session
        .id_of(key)
        .ok_or_else(|| DataError::client_input(format!("{} has not been stored yet.", R::KIND)))
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Completion and verification counts over the measures linked to the
/// document.
pub fn document_progress(cx: &mut DataContext<'_>, key: Key<Document>) -> Result<ProgressCounts> {
    let id = stored_id(cx, key)?;
    let measures = cx.session.list_linked::<Measure>("document_id", id)?;
    Ok(ProgressCounts::of_measures(
        measures.iter().map(|&measure| cx.session.get(measure)),
    ))
}

fn apply_document_input(document: &mut Document, input: &DocumentInput, patch: bool) {
    document.title = input.title.clone();
    assign(&mut document.reference, &input.reference, patch);
    assign(&mut document.description, &input.description, patch);
}

pub fn create_document(
    cx: &mut DataContext<'_>,
    project: Key<Project>,
    input: &DocumentInput,
) -> Result<Key<Document>> {
    let mut document = Document::new(input.title.clone(), project);
    apply_document_input(&mut document, input, false);
    validation::validate_document(&document)?;
    let key = cx.session.add(document);
    cx.session.flush()?;
    Ok(key)
}

pub fn update_document(
    cx: &mut DataContext<'_>,
    key: Key<Document>,
    input: &DocumentInput,
    patch: bool,
) -> Result<()> {
    let document = cx.session.get_mut(key);
    apply_document_input(document, input, patch);
    validation::validate_document(document)?;
    cx.session.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mvtool_jira::FakeJira;
    use mvtool_storage::SqliteStore;
    use pretty_assertions::assert_eq;

    fn jira() -> FakeJira {
        FakeJira::new().with_project("10000", "ACME", "Acme")
    }

    #[test]
    fn create_project_checks_jira_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = jira();
        let err = store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                create_project(
                    &mut cx,
                    &ProjectInput {
                        name: "Acme".into(),
                        jira_project_id: Some(Some("99999".into())),
                        ..Default::default()
                    },
                )
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "No Jira project with id=99999.");
    }

    #[test]
    fn listing_warms_the_cache_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = jira();
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                for name in ["A", "B"] {
                    create_project(
                        &mut cx,
                        &ProjectInput {
                            name: name.into(),
                            jira_project_id: Some(Some("10000".into())),
                            ..Default::default()
                        },
                    )?;
                }
                Ok::<_, DataError>(())
            })
            .unwrap();

        let calls_before = jira.calls();
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let keys = list_projects(&mut cx, &ListFilter::default())?;
                assert_eq!(keys.len(), 2);
                for key in keys {
                    let linked = project_jira_project(&mut cx, key)?.unwrap();
                    assert_eq!(linked.key, "ACME");
                }
                Ok::<_, DataError>(())
            })
            .unwrap();
        assert_eq!(jira.calls() - calls_before, 1);
    }

    #[test]
    fn document_update_keeps_project() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = jira();
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let project = create_project(
                    &mut cx,
                    &ProjectInput {
                        name: "Acme".into(),
                        ..Default::default()
                    },
                )?;
                let document = create_document(
                    &mut cx,
                    project,
                    &DocumentInput {
                        title: "Policy".into(),
                        ..Default::default()
                    },
                )?;
                update_document(
                    &mut cx,
                    document,
                    &DocumentInput {
                        title: "Security policy".into(),
                        ..Default::default()
                    },
                    true,
                )?;
                let stored = cx.session.get(document);
                assert_eq!(stored.title, "Security policy");
                assert_eq!(stored.project, project);
                Ok::<_, DataError>(())
            })
            .unwrap();
    }

    #[test]
    fn project_update_patches_and_unlinks() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = jira();
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let project = create_project(
                    &mut cx,
                    &ProjectInput {
                        name: "Acme".into(),
                        jira_project_id: Some(Some("10000".into())),
                        ..Default::default()
                    },
                )?;

                update_project(
                    &mut cx,
                    project,
                    &ProjectInput {
                        name: "Acme".into(),
                        description: Some(Some("Main site".into())),
                        ..Default::default()
                    },
                    true,
                )?;
                assert_eq!(cx.session.get(project).jira_project.id(), Some("10000"));

                update_project(
                    &mut cx,
                    project,
                    &ProjectInput {
                        name: "Acme".into(),
                        jira_project_id: Some(None),
                        ..Default::default()
                    },
                    true,
                )?;
                let stored = cx.session.get(project);
                assert_eq!(stored.jira_project.id(), None);
                assert_eq!(stored.description.as_deref(), Some("Main site"));
                Ok::<_, DataError>(())
            })
            .unwrap();
    }

    #[test]
    fn project_and_document_progress() {
        use crate::measures::create_measure;
        use crate::requirements::create_requirement;
        use mvtool_core::enums::{ComplianceStatus, CompletionStatus};
        use mvtool_core::inputs::{MeasureInput, RequirementInput};

        let store = SqliteStore::open_in_memory().unwrap();
        let jira = FakeJira::new();
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let project = create_project(
                    &mut cx,
                    &ProjectInput {
                        name: "Acme".into(),
                        ..Default::default()
                    },
                )?;
                let document = create_document(
                    &mut cx,
                    project,
                    &DocumentInput {
                        title: "Policy".into(),
                        ..Default::default()
                    },
                )?;
                let document_id = cx.session.id_of(document);

                let requirement = |cx: &mut DataContext<'_>, status: Option<Option<ComplianceStatus>>| {
                    create_requirement(
                        cx,
                        project,
                        &RequirementInput {
                            summary: "R".into(),
                            compliance_status: status,
                            ..Default::default()
                        },
                    )
                };
                // Needs no completion, so its measure is ignored.
                let skipped = requirement(&mut cx, Some(Some(ComplianceStatus::NonCompliant)))?;
                // No measures yet: one open item.
                requirement(&mut cx, None)?;
                let planned = requirement(&mut cx, Some(Some(ComplianceStatus::Compliant)))?;

                let completed = MeasureInput {
                    summary: "M".into(),
                    completion_status: Some(Some(CompletionStatus::Completed)),
                    document_id: Some(document_id),
                    ..Default::default()
                };
                create_measure(&mut cx, skipped, &completed)?;
                create_measure(&mut cx, planned, &completed)?;
                create_measure(
                    &mut cx,
                    planned,
                    &MeasureInput {
                        summary: "M".into(),
                        compliance_status: Some(Some(ComplianceStatus::NotApplicable)),
                        ..Default::default()
                    },
                )?;

                let counts = project_progress(&mut cx, project)?;
                assert_eq!(
                    counts,
                    ProgressCounts {
                        completion_count: 2,
                        completed_count: 1,
                        verification_count: 0,
                        verified_count: 0,
                    }
                );
                assert_eq!(counts.verification_progress(), None);

                let counts = document_progress(&mut cx, document)?;
                assert_eq!(counts.completion_count, 2);
                assert_eq!(counts.completed_count, 2);
                Ok::<_, DataError>(())
            })
            .unwrap();
    }
}
