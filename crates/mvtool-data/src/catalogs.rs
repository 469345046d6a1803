//! Catalogs, catalog modules and catalog requirements.

use mvtool_core::catalog::{Catalog, CatalogModule, CatalogRequirement};
use mvtool_core::imports::{CatalogImport, CatalogModuleImport, CatalogRequirementImport};
use mvtool_core::inputs::{CatalogInput, CatalogModuleInput, CatalogRequirementInput};
use mvtool_core::iteration::CachedIterable;
use mvtool_core::validation::{self, ValidationError};
use mvtool_core::Key;

use crate::context::DataContext;
use crate::error::Result;
use crate::etag_map::EtagMap;
use crate::fallback::resolve_parent;
use crate::reconcile::{Reconcile, assign, convert_imports, nested_key};

// ---------------------------------------------------------------------------
// Import reconciliation
// ---------------------------------------------------------------------------

impl Reconcile for Catalog {
    type Import = CatalogImport;
    type Fallback = ();
    type Refs = ();

    fn resolve_refs<I>(
        _cx: &mut DataContext<'_>,
        _imports: &mut CachedIterable<CatalogImport, I>,
        _fallback: &(),
        _patch: bool,
    ) -> Result<()>
    where
        I: Iterator<Item = CatalogImport>,
    {
        Ok(())
    }

    fn create(import: &CatalogImport, _refs: &(), _fallback: &()) -> Result<Self> {
        Ok(Catalog::new(import.title.clone()))
    }

    fn apply(catalog: &mut Self, import: &CatalogImport, patch: bool) {
        catalog.title = import.title.clone();
        assign(&mut catalog.reference, &import.reference, patch);
        assign(&mut catalog.description, &import.description, patch);
    }

    fn validate(catalog: &Self) -> std::result::Result<(), ValidationError> {
        validation::validate_catalog(catalog)
    }
}

impl Reconcile for CatalogModule {
    type Import = CatalogModuleImport;
    type Fallback = Option<Key<Catalog>>;
    type Refs = EtagMap<Key<Catalog>>;

    fn resolve_refs<I>(
        cx: &mut DataContext<'_>,
        imports: &mut CachedIterable<CatalogModuleImport, I>,
        _fallback: &Option<Key<Catalog>>,
        patch: bool,
    ) -> Result<EtagMap<Key<Catalog>>>
    where
        I: Iterator<Item = CatalogModuleImport>,
    {
        let catalogs: Vec<CatalogImport> = imports.iter().filter_map(|m| m.catalog).collect();
        convert_imports::<Catalog, _>(cx, catalogs, (), patch)
    }

    fn create(
        import: &CatalogModuleImport,
        refs: &EtagMap<Key<Catalog>>,
        fallback: &Option<Key<Catalog>>,
    ) -> Result<Self> {
        let catalog = resolve_parent(
            nested_key(refs, import.catalog.as_ref()),
            *fallback,
            "catalog",
        )?;
        Ok(CatalogModule::new(import.title.clone(), catalog))
    }

    fn apply(module: &mut Self, import: &CatalogModuleImport, patch: bool) {
        module.title = import.title.clone();
        assign(&mut module.reference, &import.reference, patch);
        assign(&mut module.description, &import.description, patch);
    }

    fn reparent(module: &mut Self, import: &CatalogModuleImport, refs: &EtagMap<Key<Catalog>>) {
        if let Some(catalog) = nested_key(refs, import.catalog.as_ref()) {
            module.catalog = catalog;
        }
    }

    fn validate(module: &Self) -> std::result::Result<(), ValidationError> {
        validation::validate_catalog_module(module)
    }
}

impl Reconcile for CatalogRequirement {
    type Import = CatalogRequirementImport;
    type Fallback = Option<Key<CatalogModule>>;
    type Refs = EtagMap<Key<CatalogModule>>;

    fn resolve_refs<I>(
        cx: &mut DataContext<'_>,
        imports: &mut CachedIterable<CatalogRequirementImport, I>,
        fallback: &Option<Key<CatalogModule>>,
        patch: bool,
    ) -> Result<EtagMap<Key<CatalogModule>>>
    where
        I: Iterator<Item = CatalogRequirementImport>,
    {
        let modules: Vec<CatalogModuleImport> =
            imports.iter().filter_map(|r| r.catalog_module).collect();
        let fallback_catalog = fallback.map(|module| cx.session.get(module).catalog);
        convert_imports::<CatalogModule, _>(cx, modules, fallback_catalog, patch)
    }

    fn create(
        import: &CatalogRequirementImport,
        refs: &EtagMap<Key<CatalogModule>>,
        fallback: &Option<Key<CatalogModule>>,
    ) -> Result<Self> {
        let module = resolve_parent(
            nested_key(refs, import.catalog_module.as_ref()),
            *fallback,
            "catalog module",
        )?;
        Ok(CatalogRequirement::new(import.summary.clone(), module))
    }

    fn apply(requirement: &mut Self, import: &CatalogRequirementImport, patch: bool) {
        requirement.summary = import.summary.clone();
        assign(&mut requirement.reference, &import.reference, patch);
        assign(&mut requirement.description, &import.description, patch);
        assign(&mut requirement.gs_absicherung, &import.gs_absicherung, patch);
        assign(
            &mut requirement.gs_verantwortliche,
            &import.gs_verantwortliche,
            patch,
        );
    }

    fn reparent(
        requirement: &mut Self,
        import: &CatalogRequirementImport,
        refs: &EtagMap<Key<CatalogModule>>,
    ) {
        if let Some(module) = nested_key(refs, import.catalog_module.as_ref()) {
            requirement.catalog_module = module;
        }
    }

    fn validate(requirement: &Self) -> std::result::Result<(), ValidationError> {
        validation::validate_catalog_requirement(requirement)
    }
}

// ---------------------------------------------------------------------------
// Single-record services
// ---------------------------------------------------------------------------

fn apply_catalog_input(catalog: &mut Catalog, input: &CatalogInput, patch: bool) {
    catalog.title = input.title.clone();
    assign(&mut catalog.reference, &input.reference, patch);
    assign(&mut catalog.description, &input.description, patch);
}

pub fn create_catalog(cx: &mut DataContext<'_>, input: &CatalogInput) -> Result<Key<Catalog>> {
    let mut catalog = Catalog::new(input.title.clone());
    apply_catalog_input(&mut catalog, input, false);
    validation::validate_catalog(&catalog)?;
    let key = cx.session.add(catalog);
    cx.session.flush()?;
    Ok(key)
}

pub fn update_catalog(
    cx: &mut DataContext<'_>,
    key: Key<Catalog>,
    input: &CatalogInput,
    patch: bool,
) -> Result<()> {
    let catalog = cx.session.get_mut(key);
    apply_catalog_input(catalog, input, patch);
    validation::validate_catalog(catalog)?;
    cx.session.flush()?;
    Ok(())
}

fn apply_module_input(module: &mut CatalogModule, input: &CatalogModuleInput, patch: bool) {
    module.title = input.title.clone();
    assign(&mut module.reference, &input.reference, patch);
    assign(&mut module.description, &input.description, patch);
}

pub fn create_catalog_module(
    cx: &mut DataContext<'_>,
    catalog: Key<Catalog>,
    input: &CatalogModuleInput,
) -> Result<Key<CatalogModule>> {
    let mut module = CatalogModule::new(input.title.clone(), catalog);
    apply_module_input(&mut module, input, false);
    validation::validate_catalog_module(&module)?;
    let key = cx.session.add(module);
    cx.session.flush()?;
    Ok(key)
}

pub fn update_catalog_module(
    cx: &mut DataContext<'_>,
    key: Key<CatalogModule>,
    input: &CatalogModuleInput,
    patch: bool,
) -> Result<()> {
    let module = cx.session.get_mut(key);
    apply_module_input(module, input, patch);
    validation::validate_catalog_module(module)?;
    cx.session.flush()?;
    Ok(())
}

fn apply_catalog_requirement_input(
    requirement: &mut CatalogRequirement,
    input: &CatalogRequirementInput,
    patch: bool,
) {
    requirement.summary = input.summary.clone();
    assign(&mut requirement.reference, &input.reference, patch);
    assign(&mut requirement.description, &input.description, patch);
    assign(&mut requirement.gs_absicherung, &input.gs_absicherung, patch);
    assign(
        &mut requirement.gs_verantwortliche,
        &input.gs_verantwortliche,
        patch,
    );
}

pub fn create_catalog_requirement(
    cx: &mut DataContext<'_>,
    module: Key<CatalogModule>,
    input: &CatalogRequirementInput,
) -> Result<Key<CatalogRequirement>> {
    let mut requirement = CatalogRequirement::new(input.summary.clone(), module);
    apply_catalog_requirement_input(&mut requirement, input, false);
    validation::validate_catalog_requirement(&requirement)?;
    let key = cx.session.add(requirement);
    cx.session.flush()?;
    Ok(key)
}

pub fn update_catalog_requirement(
    cx: &mut DataContext<'_>,
    key: Key<CatalogRequirement>,
    input: &CatalogRequirementInput,
    patch: bool,
) -> Result<()> {
    let requirement = cx.session.get_mut(key);
    apply_catalog_requirement_input(requirement, input, patch);
    validation::validate_catalog_requirement(requirement)?;
    cx.session.flush()?;
    Ok(())
}
