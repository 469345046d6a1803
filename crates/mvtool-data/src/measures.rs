//! Measures implementing requirements.

use std::collections::HashMap;

use mvtool_core::catalog::CatalogModule;
use mvtool_core::enums::CompletionStatus;
use mvtool_core::hints::completion_status_hint;
use mvtool_core::imports::{DocumentImport, MeasureImport, RequirementImport, set_value};
use mvtool_core::inputs::MeasureInput;
use mvtool_core::iteration::CachedIterable;
use mvtool_core::jira::JiraIssue;
use mvtool_core::project::{Document, Measure, Requirement};
use mvtool_core::validation::{self, ValidationError};
use mvtool_core::{FetchPolicy, Key};
use mvtool_storage::ListFilter;

use crate::context::DataContext;
use crate::error::{DataError, Result};
use crate::etag_map::EtagMap;
use crate::fallback::resolve_parent;
use crate::reconcile::{Reconcile, assign, convert_imports, nested_key, touches};
use crate::records;
use crate::requirements::RequirementFallback;

/// Default parents for measure imports.
///
/// The project of `requirement` also serves nested requirements and
/// documents that carry no project of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeasureFallback {
    pub requirement: Option<Key<Requirement>>,
    pub catalog_module: Option<Key<CatalogModule>>,
}

#[derive(Debug, Default)]
pub struct MeasureRefs {
    requirements: EtagMap<Key<Requirement>>,
    documents: EtagMap<Key<Document>>,
    /// Jira issues named by the batch, by key.
    jira_issues: HashMap<String, JiraIssue>,
}

impl Reconcile for Measure {
    type Import = MeasureImport;
    type Fallback = MeasureFallback;
    type Refs = MeasureRefs;

    fn resolve_refs<I>(
        cx: &mut DataContext<'_>,
        imports: &mut CachedIterable<MeasureImport, I>,
        fallback: &MeasureFallback,
        patch: bool,
    ) -> Result<MeasureRefs>
    where
        I: Iterator<Item = MeasureImport>,
    {
        let project = fallback
            .requirement
            .map(|requirement| cx.session.get(requirement).project);

        let requirements: Vec<RequirementImport> =
            imports.iter().filter_map(|m| m.requirement).collect();
        let requirements = convert_imports::<Requirement, _>(
            cx,
            requirements,
            RequirementFallback {
                project,
                catalog_module: fallback.catalog_module,
            },
            patch,
        )?;

        let documents: Vec<DocumentImport> =
            imports.iter().filter_map(|m| m.document.flatten()).collect();
        let documents = convert_imports::<Document, _>(cx, documents, project, patch)?;

        let keys: Vec<String> = imports
            .iter()
            .filter_map(|m| m.jira_issue.flatten().map(|j| j.key))
            .collect();
        let jira_issues = cx.jira.batch_fetch_issues(keys.iter().map(String::as_str))?;

        Ok(MeasureRefs {
            requirements,
            documents,
            jira_issues,
        })
    }

    fn create(
        import: &MeasureImport,
        refs: &MeasureRefs,
        fallback: &MeasureFallback,
    ) -> Result<Self> {
        let requirement = resolve_parent(
            nested_key(&refs.requirements, import.requirement.as_ref()),
            fallback.requirement,
            "requirement",
        )?;
        Ok(Measure::new(import.summary.clone(), requirement))
    }

    fn apply(measure: &mut Self, import: &MeasureImport, patch: bool) {
        measure.summary = import.summary.clone();
        assign(&mut measure.reference, &import.reference, patch);
        assign(&mut measure.description, &import.description, patch);
        assign(&mut measure.compliance_status, &import.compliance_status, patch);
        assign(&mut measure.compliance_comment, &import.compliance_comment, patch);
        assign(&mut measure.completion_status, &import.completion_status, patch);
        assign(&mut measure.completion_comment, &import.completion_comment, patch);
        assign(&mut measure.verification_method, &import.verification_method, patch);
        assign(&mut measure.verification_status, &import.verification_status, patch);
        assign(&mut measure.verification_comment, &import.verification_comment, patch);
    }

    fn reparent(measure: &mut Self, import: &MeasureImport, refs: &MeasureRefs) {
        if let Some(requirement) = nested_key(&refs.requirements, import.requirement.as_ref()) {
            measure.requirement = requirement;
        }
    }

    fn link(
        measure: &mut Self,
        import: &MeasureImport,
        refs: &MeasureRefs,
        patch: bool,
    ) -> Result<()> {
        if touches(&import.document, patch) {
            measure.document = nested_key(&refs.documents, set_value(&import.document));
        }
        if touches(&import.jira_issue, patch) {
            match set_value(&import.jira_issue) {
                Some(jira_issue) => {
                    let found = refs.jira_issues.get(&jira_issue.key).ok_or_else(|| {
                        DataError::not_found("Jira issue", "key", &jira_issue.key)
                    })?;
                    measure.jira_issue.assign(Some(found));
                }
                None => measure.jira_issue.assign(None),
            }
        }
        Ok(())
    }

    fn validate(measure: &Self) -> std::result::Result<(), ValidationError> {
        validation::validate_measure(measure)
    }
}

// ---------------------------------------------------------------------------
// Single-record services
// ---------------------------------------------------------------------------

fn apply_measure_input(
    cx: &mut DataContext<'_>,
    measure: &mut Measure,
    input: &MeasureInput,
    patch: bool,
) -> Result<()> {
    measure.summary = input.summary.clone();
    assign(&mut measure.reference, &input.reference, patch);
    assign(&mut measure.description, &input.description, patch);
    assign(&mut measure.compliance_status, &input.compliance_status, patch);
    assign(&mut measure.compliance_comment, &input.compliance_comment, patch);
    assign(&mut measure.completion_status, &input.completion_status, patch);
    assign(&mut measure.completion_comment, &input.completion_comment, patch);
    assign(&mut measure.verification_method, &input.verification_method, patch);
    assign(&mut measure.verification_status, &input.verification_status, patch);
    assign(&mut measure.verification_comment, &input.verification_comment, patch);

    if touches(&input.document_id, patch) {
        measure.document = match set_value(&input.document_id) {
            Some(&id) => Some(records::get::<Document>(cx, id)?),
            None => None,
        };
    }
    if touches(&input.jira_issue_id, patch) {
        match set_value(&input.jira_issue_id) {
            Some(id) => {
                let issue = cx.check_jira_issue_id(id)?;
                measure.jira_issue.assign(Some(&issue));
            }
            None => measure.jira_issue.assign(None),
        }
    }
    measure.jira_issue.bind(FetchPolicy::CacheOnly);
    Ok(())
}

/// Creates a measure. Document and Jira issue ids must name existing
/// entities.
pub fn create_measure(
    cx: &mut DataContext<'_>,
    requirement: Key<Requirement>,
    input: &MeasureInput,
) -> Result<Key<Measure>> {
    let mut measure = Measure::new(input.summary.clone(), requirement);
    apply_measure_input(cx, &mut measure, input, false)?;
    validation::validate_measure(&measure)?;
    let key = cx.session.add(measure);
    cx.session.flush()?;
    Ok(key)
}

pub fn update_measure(
    cx: &mut DataContext<'_>,
    key: Key<Measure>,
    input: &MeasureInput,
    patch: bool,
) -> Result<()> {
    let mut measure = cx.session.get(key).clone();
    apply_measure_input(cx, &mut measure, input, patch)?;
    validation::validate_measure(&measure)?;
    *cx.session.get_mut(key) = measure;
    cx.session.flush()?;
    Ok(())
}

/// Loads a measure whose Jira issue resolves on demand when Jira is online.
pub fn get_measure(cx: &mut DataContext<'_>, id: i64) -> Result<Key<Measure>> {
    let key = records::get::<Measure>(cx, id)?;
    cx.session.get(key).jira_issue.bind(cx.fetch_policy());
    Ok(key)
}

/// Lists measures after fetching all their Jira issues in one search. The
/// links then resolve from the cache only.
pub fn list_measures(cx: &mut DataContext<'_>, filter: &ListFilter) -> Result<Vec<Key<Measure>>> {
    let keys = records::list::<Measure>(cx, filter)?;
    if cx.jira.is_online() {
        let ids: Vec<String> = keys
            .iter()
            .filter_map(|&key| cx.session.get(key).jira_issue.id().map(str::to_owned))
            .collect();
        cx.jira.batch_fetch_issues(ids.iter().map(String::as_str))?;
    }
    for &key in &keys {
        cx.session.get(key).jira_issue.bind(FetchPolicy::CacheOnly);
    }
    Ok(keys)
}

/// Resolves the Jira issue linked to a loaded measure.
pub fn measure_jira_issue(cx: &mut DataContext<'_>, key: Key<Measure>) -> Result<Option<JiraIssue>> {
    let DataContext { session, jira } = cx;
    Ok(session.get(key).jira_issue.resolve(jira)?.cloned())
}

/// Suggests a completion status for a measure from its Jira issue.
pub fn measure_completion_hint(
    cx: &mut DataContext<'_>,
    key: Key<Measure>,
) -> Result<Option<CompletionStatus>> {
    let issue = measure_jira_issue(cx, key)?;
    Ok(completion_status_hint(cx.session.get(key), issue.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::{create_document, create_project};
    use crate::requirements::create_requirement;
    use mvtool_core::enums::ComplianceStatus;
    use mvtool_core::inputs::{DocumentInput, ProjectInput, RequirementInput};
    use mvtool_jira::FakeJira;
    use mvtool_storage::SqliteStore;
    use pretty_assertions::assert_eq;

    fn requirement(cx: &mut DataContext<'_>) -> Result<Key<Requirement>> {
        let project = create_project(
            cx,
            &ProjectInput {
                name: "Acme".into(),
                ..Default::default()
            },
        )?;
        create_requirement(
            cx,
            project,
            &RequirementInput {
                summary: "Encrypt data".into(),
                ..Default::default()
            },
        )
    }

    #[test]
    fn completed_issue_hints_completed() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = FakeJira::new()
            .with_project("10000", "ACME", "Acme")
            .with_issue("10001", "ACME-1", "10000", true);
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let requirement = requirement(&mut cx)?;
                let measure = create_measure(
                    &mut cx,
                    requirement,
                    &MeasureInput {
                        summary: "TLS".into(),
                        compliance_status: Some(Some(ComplianceStatus::Compliant)),
                        jira_issue_id: Some(Some("10001".into())),
                        ..Default::default()
                    },
                )?;
                assert_eq!(
                    measure_completion_hint(&mut cx, measure)?,
                    Some(CompletionStatus::Completed)
                );
                Ok::<_, DataError>(())
            })
            .unwrap();
    }

    #[test]
    fn unknown_document_id_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = FakeJira::new();
        let err = store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let requirement = requirement(&mut cx)?;
                create_measure(
                    &mut cx,
                    requirement,
                    &MeasureInput {
                        summary: "TLS".into(),
                        document_id: Some(Some(3)),
                        ..Default::default()
                    },
                )
            })
            .unwrap_err();
        assert_eq!(err.to_string(), "No document with id=3.");
    }

    #[test]
    fn hidden_issue_resolves_to_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = FakeJira::new()
            .with_project("10000", "ACME", "Acme")
            .with_issue("10001", "ACME-1", "10000", false);
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let requirement = requirement(&mut cx)?;
                create_measure(
                    &mut cx,
                    requirement,
                    &MeasureInput {
                        summary: "TLS".into(),
                        jira_issue_id: Some(Some("10001".into())),
                        ..Default::default()
                    },
                )?;
                Ok::<_, DataError>(())
            })
            .unwrap();

        let hidden = FakeJira::new().failing("10001", 403);
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &hidden);
                let key = get_measure(&mut cx, 1)?;
                assert_eq!(measure_jira_issue(&mut cx, key)?, None);
                Ok::<_, DataError>(())
            })
            .unwrap();
    }

    #[test]
    fn deleting_linked_document_unlinks_measure() {
        let store = SqliteStore::open_in_memory().unwrap();
        let jira = FakeJira::new();
        store
            .run_in_transaction(|session| {
                let mut cx = DataContext::new(session, &jira);
                let requirement = requirement(&mut cx)?;
                let project = cx.session.get(requirement).project;
                let document = create_document(
                    &mut cx,
                    project,
                    &DocumentInput {
                        title: "Crypto policy".into(),
                        ..Default::default()
                    },
                )?;
                let measure = create_measure(
                    &mut cx,
                    requirement,
                    &MeasureInput {
                        summary: "TLS".into(),
                        ..Default::default()
                    },
                )?;
                let document_id = cx.session.id_of(document).unwrap();
                update_measure(
                    &mut cx,
                    measure,
                    &MeasureInput {
                        summary: "TLS".into(),
                        document_id: Some(Some(document_id)),
                        ..Default::default()
                    },
                    true,
                )?;
                assert_eq!(cx.session.get(measure).document, Some(document));
                let measure_id = cx.session.id_of(measure).unwrap();

                records::delete(&mut cx, document)?;
                let reloaded = records::get::<Measure>(&mut cx, measure_id)?;
                assert_eq!(cx.session.get(reloaded).document, None);
                assert_eq!(cx.session.get(reloaded).summary, "TLS");
                Ok::<_, DataError>(())
            })
            .unwrap();
    }
}
