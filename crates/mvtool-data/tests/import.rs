//! End-to-end reconciliation of nested import records.

use mvtool_core::Key;
use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::imports::{
    CatalogImport, CatalogModuleImport, CatalogRequirementImport, MeasureImport, ProjectImport,
    RequirementImport,
};
use mvtool_core::project::{Document, Measure, Project, Requirement};
use mvtool_data::records;
use mvtool_data::{
    DataContext, DataError, MeasureFallback, Reconcile, RequirementFallback, bulk_create_update,
};
use mvtool_jira::FakeJira;
use mvtool_storage::{ListFilter, Record, SqliteStore};
use pretty_assertions::assert_eq;

fn import<R, S>(
    cx: &mut DataContext<'_>,
    imports: S,
    fallback: R::Fallback,
    patch: bool,
) -> Result<Vec<Key<R>>, DataError>
where
    R: Reconcile,
    S: IntoIterator<Item = R::Import>,
{
    bulk_create_update::<R, _>(cx, imports, fallback, patch, false)?.collect()
}

fn parse<T: serde::de::DeserializeOwned>(lines: &[&str]) -> Vec<T> {
    lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn with_cx<T>(
    store: &SqliteStore,
    jira: &FakeJira,
    f: impl FnOnce(&mut DataContext<'_>) -> Result<T, DataError>,
) -> Result<T, DataError> {
    store.run_in_transaction(|session| {
        let mut cx = DataContext::new(session, jira);
        f(&mut cx)
    })
}

fn catalog(title: &str) -> CatalogImport {
    CatalogImport {
        title: title.into(),
        ..Default::default()
    }
}

#[test]
fn keys_follow_input_order() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    with_cx(&store, &jira, |cx| {
        let first = import::<Catalog, _>(cx, [catalog("A")], (), true)?;
        let a_id = cx.session.id_of(first[0]).unwrap();

        let keys = import::<Catalog, _>(
            cx,
            [
                catalog("B"),
                CatalogImport {
                    id: Some(a_id),
                    ..catalog("A2")
                },
                catalog("B"),
                catalog("C"),
            ],
            (),
            true,
        )?;

        let titles: Vec<&str> = keys
            .iter()
            .map(|&key| cx.session.get(key).title.as_str())
            .collect();
        assert_eq!(titles, vec!["B", "A2", "B", "C"]);
        assert_eq!(keys[1], first[0]);
        Ok(())
    })
    .unwrap();
}

#[test]
fn equal_nested_parents_are_created_once() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    with_cx(&store, &jira, |cx| {
        let requirements: Vec<RequirementImport> = parse(&[
            r#"{"summary":"Encrypt backups","project":{"name":"Acme"}}"#,
            r#"{"summary":"Rotate keys","project":{"name":"Acme"}}"#,
        ]);
        let keys =
            import::<Requirement, _>(cx, requirements, RequirementFallback::default(), true)?;

        assert_eq!(records::count::<Project>(cx, &ListFilter::default())?, 1);
        let first = cx.session.get(keys[0]).project;
        let second = cx.session.get(keys[1]).project;
        assert_eq!(first, second);
        assert_eq!(cx.session.get(first).name, "Acme");
        Ok(())
    })
    .unwrap();
}

#[test]
fn missing_parent_without_fallback_is_client_input() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    let err = with_cx(&store, &jira, |cx| {
        let module = CatalogModuleImport {
            title: "T".into(),
            ..Default::default()
        };
        import::<CatalogModule, _>(cx, [module], None, true)
    })
    .unwrap_err();

    assert!(err.is_client_input());
    assert_eq!(err.to_string(), "No fallback catalog provided.");
    assert_eq!(err.status_code(), 400);
}

#[test]
fn unknown_id_is_not_found() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    let err = with_cx(&store, &jira, |cx| {
        let module = CatalogModuleImport {
            id: Some(5),
            title: "X".into(),
            ..Default::default()
        };
        import::<CatalogModule, _>(cx, [module], None, true)
    })
    .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "No catalog module with id=5.");
}

#[test]
fn patch_keeps_unset_fields_and_full_update_clears_them() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    with_cx(&store, &jira, |cx| {
        let created: Vec<RequirementImport> = parse(&[
            r#"{"summary":"Old","reference":"R-1","description":"Details","project":{"name":"Acme"}}"#,
        ]);
        let key = import::<Requirement, _>(cx, created, RequirementFallback::default(), true)?[0];
        let id = cx.session.id_of(key).unwrap();
        let update = RequirementImport {
            id: Some(id),
            summary: "New".into(),
            ..Default::default()
        };

        import::<Requirement, _>(cx, [update.clone()], RequirementFallback::default(), true)?;
        let requirement = cx.session.get(key);
        assert_eq!(requirement.summary, "New");
        assert_eq!(requirement.reference.as_deref(), Some("R-1"));
        assert_eq!(requirement.description.as_deref(), Some("Details"));

        import::<Requirement, _>(cx, [update], RequirementFallback::default(), false)?;
        let requirement = cx.session.get(key);
        assert_eq!(requirement.reference, None);
        assert_eq!(requirement.description, None);
        Ok(())
    })
    .unwrap();
}

#[test]
fn update_without_nested_parent_keeps_parent() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    with_cx(&store, &jira, |cx| {
        let created: Vec<RequirementImport> =
            parse(&[r#"{"summary":"Encrypt","project":{"name":"Acme"}}"#]);
        let key = import::<Requirement, _>(cx, created, RequirementFallback::default(), true)?[0];
        let project = cx.session.get(key).project;
        let id = cx.session.id_of(key).unwrap();

        let other = import::<Project, _>(
            cx,
            [ProjectImport {
                name: "Other".into(),
                ..Default::default()
            }],
            (),
            true,
        )?[0];

        // A fallback only applies to new rows.
        let update = RequirementImport {
            id: Some(id),
            summary: "Encrypt at rest".into(),
            ..Default::default()
        };
        let fallback = RequirementFallback {
            project: Some(other),
            ..Default::default()
        };
        import::<Requirement, _>(cx, [update], fallback, false)?;
        assert_eq!(cx.session.get(key).project, project);
        Ok(())
    })
    .unwrap();
}

/// Ids of the first and second key, for building update records.
fn ids<R: Record>(cx: &DataContext<'_>, keys: &[Key<R>]) -> (i64, i64) {
    (
        cx.session.id_of(keys[0]).unwrap(),
        cx.session.id_of(keys[1]).unwrap(),
    )
}

#[test]
fn measure_weak_links_follow_patch_rules() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new()
        .with_project("10000", "ACME", "Acme")
        .with_issue("10001", "ACME-1", "10000", false);
    with_cx(&store, &jira, |cx| {
        let line = r#"{"summary":"TLS","jira_issue":{"key":"ACME-1"},
            "requirement":{"summary":"Encrypt","project":{"name":"Acme"}},
            "document":{"title":"Crypto policy","project":{"name":"Acme"}}}"#;
        let keys = import::<Measure, _>(cx, parse::<MeasureImport>(&[line, line]), MeasureFallback::default(), true)?;
        let (first, second) = ids(cx, &keys);
        let links = |cx: &DataContext<'_>, key: Key<Measure>| {
            let measure = cx.session.get(key);
            (measure.document.is_some(), measure.jira_issue.id().map(str::to_owned))
        };
        let issue = Some("10001".to_owned());

        // Patch that mentions neither link keeps both.
        let update = format!(r#"{{"id":{first},"summary":"TLS 1.3"}}"#);
        import::<Measure, _>(cx, parse::<MeasureImport>(&[&update]), MeasureFallback::default(), true)?;
        assert_eq!(links(cx, keys[0]), (true, issue.clone()));

        // Explicit null clears only that link.
        let update = format!(r#"{{"id":{first},"summary":"TLS 1.3","document":null}}"#);
        import::<Measure, _>(cx, parse::<MeasureImport>(&[&update]), MeasureFallback::default(), true)?;
        assert_eq!(links(cx, keys[0]), (false, issue.clone()));

        // A full replace clears every link it does not carry.
        let update = format!(r#"{{"id":{second},"summary":"TLS"}}"#);
        import::<Measure, _>(cx, parse::<MeasureImport>(&[&update]), MeasureFallback::default(), false)?;
        assert_eq!(links(cx, keys[1]), (false, None));
        Ok(())
    })
    .unwrap();
}

#[test]
fn requirement_catalog_link_follows_patch_rules() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    with_cx(&store, &jira, |cx| {
        let line = r#"{"summary":"Backups","project":{"name":"Acme"},
            "catalog_requirement":{"summary":"Backups","catalog_module":{"title":"OPS","catalog":{"title":"Grundschutz"}}}}"#;
        let keys =
            import::<Requirement, _>(cx, parse::<RequirementImport>(&[line, line]), RequirementFallback::default(), true)?;
        let (first, second) = ids(cx, &keys);
        let linked = |cx: &DataContext<'_>, key: Key<Requirement>| {
            cx.session.get(key).catalog_requirement.is_some()
        };
        assert!(linked(cx, keys[0]));

        let update = format!(r#"{{"id":{first},"summary":"Nightly backups"}}"#);
        import::<Requirement, _>(cx, parse::<RequirementImport>(&[&update]), RequirementFallback::default(), true)?;
        assert!(linked(cx, keys[0]));

        let update = format!(r#"{{"id":{first},"summary":"Backups","catalog_requirement":null}}"#);
        import::<Requirement, _>(cx, parse::<RequirementImport>(&[&update]), RequirementFallback::default(), true)?;
        assert!(!linked(cx, keys[0]));

        let update = format!(r#"{{"id":{second},"summary":"Backups"}}"#);
        import::<Requirement, _>(cx, parse::<RequirementImport>(&[&update]), RequirementFallback::default(), false)?;
        assert!(!linked(cx, keys[1]));
        Ok(())
    })
    .unwrap();
}

#[test]
fn project_jira_link_follows_patch_rules() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new().with_project("10000", "ACME", "Acme");
    with_cx(&store, &jira, |cx| {
        let keys = import::<Project, _>(
            cx,
            parse::<ProjectImport>(&[
                r#"{"name":"Acme","jira_project":{"key":"ACME"}}"#,
                r#"{"name":"Acme Ops","jira_project":{"key":"ACME"}}"#,
            ]),
            (),
            true,
        )?;
        let (first, second) = ids(cx, &keys);
        let linked = |cx: &DataContext<'_>, key: Key<Project>| {
            cx.session.get(key).jira_project.id().map(str::to_owned)
        };

        let update = format!(r#"{{"id":{first},"name":"Acme Corp"}}"#);
        import::<Project, _>(cx, parse::<ProjectImport>(&[&update]), (), true)?;
        assert_eq!(linked(cx, keys[0]).as_deref(), Some("10000"));

        let update = format!(r#"{{"id":{first},"name":"Acme Corp","jira_project":null}}"#);
        import::<Project, _>(cx, parse::<ProjectImport>(&[&update]), (), true)?;
        assert_eq!(linked(cx, keys[0]), None);

        let update = format!(r#"{{"id":{second},"name":"Acme Ops"}}"#);
        import::<Project, _>(cx, parse::<ProjectImport>(&[&update]), (), false)?;
        assert_eq!(linked(cx, keys[1]), None);
        Ok(())
    })
    .unwrap();
}

#[test]
fn nested_measure_import_flushes_once() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new()
        .with_project("10000", "ACME", "Acme")
        .with_issue("10001", "ACME-1", "10000", false)
        .with_issue("10002", "ACME-2", "10000", true);
    with_cx(&store, &jira, |cx| {
        let measures: Vec<MeasureImport> = parse(&[
            r#"{"summary":"TLS everywhere","jira_issue":{"key":"ACME-1"},
                "requirement":{"summary":"Encrypt in transit","project":{"name":"Acme"}},
                "document":{"title":"Crypto policy","project":{"name":"Records"}}}"#,
            r#"{"summary":"Disk encryption","jira_issue":{"key":"ACME-2"},
                "requirement":{"summary":"Encrypt at rest","project":{"name":"Acme"}}}"#,
        ]);
        let keys = import::<Measure, _>(cx, measures, MeasureFallback::default(), true)?;

        assert_eq!(cx.session.flush_count(), 1);
        assert_eq!(keys.len(), 2);
        assert_eq!(records::count::<Project>(cx, &ListFilter::default())?, 2);
        assert_eq!(records::count::<Requirement>(cx, &ListFilter::default())?, 2);
        assert_eq!(records::count::<Document>(cx, &ListFilter::default())?, 1);

        let first = cx.session.get(keys[0]);
        assert_eq!(first.jira_issue.id(), Some("10001"));
        assert!(first.document.is_some());
        assert_eq!(cx.session.get(keys[1]).document, None);
        Ok(())
    })
    .unwrap();

    // One search for both issue keys.
    assert_eq!(jira.log(), vec!["search_issues ACME-1,ACME-2".to_owned()]);
}

#[test]
fn unknown_issue_key_is_not_found() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    let err = with_cx(&store, &jira, |cx| {
        let measures: Vec<MeasureImport> = parse(&[
            r#"{"summary":"TLS","jira_issue":{"key":"NOPE-9"},
                "requirement":{"summary":"Encrypt","project":{"name":"Acme"}}}"#,
        ]);
        import::<Measure, _>(cx, measures, MeasureFallback::default(), true)
    })
    .unwrap_err();

    assert_eq!(err.to_string(), "No Jira issue with key=NOPE-9.");
}

#[test]
fn project_jira_keys_resolve_with_one_listing() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new()
        .with_project("10000", "ACME", "Acme")
        .with_project("10100", "OPS", "Operations");
    with_cx(&store, &jira, |cx| {
        let projects: Vec<ProjectImport> = parse(&[
            r#"{"name":"Acme","jira_project":{"key":"ACME"}}"#,
            r#"{"name":"Ops","jira_project":{"key":"OPS"}}"#,
            r#"{"name":"Internal"}"#,
        ]);
        let keys = import::<Project, _>(cx, projects, (), true)?;
        let ids: Vec<Option<&str>> = keys
            .iter()
            .map(|&key| cx.session.get(key).jira_project.id())
            .collect();
        assert_eq!(ids, vec![Some("10000"), Some("10100"), None]);
        Ok(())
    })
    .unwrap();
    assert_eq!(jira.log(), vec!["list_projects".to_owned()]);
}

#[test]
fn fallback_module_catalog_serves_nested_modules() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    with_cx(&store, &jira, |cx| {
        let catalog = import::<Catalog, _>(cx, [catalog("Grundschutz")], (), true)?[0];
        let module = import::<CatalogModule, _>(
            cx,
            [CatalogModuleImport {
                title: "OPS".into(),
                ..Default::default()
            }],
            Some(catalog),
            true,
        )?[0];

        let requirements: Vec<CatalogRequirementImport> = parse(&[
            r#"{"summary":"Backups","catalog_module":{"title":"CON"}}"#,
            r#"{"summary":"Logging"}"#,
        ]);
        let keys = import::<CatalogRequirement, _>(
            cx,
            requirements,
            Some(module),
            true,
        )?;

        let nested_module = cx.session.get(keys[0]).catalog_module;
        assert_ne!(nested_module, module);
        assert_eq!(cx.session.get(nested_module).catalog, catalog);
        assert_eq!(cx.session.get(keys[1]).catalog_module, module);
        Ok(())
    })
    .unwrap();
}

#[test]
fn failed_import_rolls_back() {
    let store = SqliteStore::open_in_memory().unwrap();
    let jira = FakeJira::new();
    let result = with_cx(&store, &jira, |cx| {
        let requirements: Vec<RequirementImport> = parse(&[
            r#"{"summary":"Fine","project":{"name":"Acme"}}"#,
            r#"{"summary":"Orphan"}"#,
        ]);
        import::<Requirement, _>(cx, requirements, RequirementFallback::default(), true)
    });
    assert!(result.is_err());

    let count = with_cx(&store, &jira, |cx| {
        records::count::<Requirement>(cx, &ListFilter::default())
    })
    .unwrap();
    assert_eq!(count, 0);
}
