//! DDL statements for the SQLite schema.
//!
//! Timestamps are stored as TEXT in ISO 8601 format (SQLite has no native
//! datetime type). Owning relations cascade on delete; weak links are set to
//! NULL instead so that deleting e.g. a document never removes measures.

/// Version recorded in `metadata` once the DDL below has been applied.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// DDL executed when a database is opened below [`CURRENT_SCHEMA_VERSION`].
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Metadata ------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    // -- Catalog hierarchy ---------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS catalog (
        id          INTEGER PRIMARY KEY,
        reference   TEXT,
        title       TEXT NOT NULL,
        description TEXT,
        created     TEXT NOT NULL,
        updated     TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS catalog_module (
        id          INTEGER PRIMARY KEY,
        reference   TEXT,
        title       TEXT NOT NULL,
        description TEXT,
        catalog_id  INTEGER NOT NULL REFERENCES catalog(id) ON DELETE CASCADE,
        created     TEXT NOT NULL,
        updated     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_catalog_module_catalog ON catalog_module(catalog_id)",
    r#"
    CREATE TABLE IF NOT EXISTS catalog_requirement (
        id                 INTEGER PRIMARY KEY,
        reference          TEXT,
        summary            TEXT NOT NULL,
        description        TEXT,
        gs_absicherung     TEXT,
        gs_verantwortliche TEXT,
        catalog_module_id  INTEGER NOT NULL REFERENCES catalog_module(id) ON DELETE CASCADE,
        created            TEXT NOT NULL,
        updated            TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_catalog_requirement_module ON catalog_requirement(catalog_module_id)",
    // -- Project hierarchy ---------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS project (
        id              INTEGER PRIMARY KEY,
        name            TEXT NOT NULL,
        description     TEXT,
        jira_project_id TEXT,
        created         TEXT NOT NULL,
        updated         TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS document (
        id          INTEGER PRIMARY KEY,
        reference   TEXT,
        title       TEXT NOT NULL,
        description TEXT,
        project_id  INTEGER NOT NULL REFERENCES project(id) ON DELETE CASCADE,
        created     TEXT NOT NULL,
        updated     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_document_project ON document(project_id)",
    r#"
    CREATE TABLE IF NOT EXISTS requirement (
        id                     INTEGER PRIMARY KEY,
        reference              TEXT,
        summary                TEXT NOT NULL,
        description            TEXT,
        compliance_status      TEXT,
        compliance_comment     TEXT,
        target_object          TEXT,
        milestone              TEXT,
        project_id             INTEGER NOT NULL REFERENCES project(id) ON DELETE CASCADE,
        catalog_requirement_id INTEGER REFERENCES catalog_requirement(id) ON DELETE SET NULL,
        created                TEXT NOT NULL,
        updated                TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_requirement_project ON requirement(project_id)",
    r#"
    CREATE TABLE IF NOT EXISTS measure (
        id                   INTEGER PRIMARY KEY,
        reference            TEXT,
        summary              TEXT NOT NULL,
        description          TEXT,
        compliance_status    TEXT,
        compliance_comment   TEXT,
        completion_status    TEXT,
        completion_comment   TEXT,
        verification_method  TEXT,
        verification_status  TEXT,
        verification_comment TEXT,
        requirement_id       INTEGER NOT NULL REFERENCES requirement(id) ON DELETE CASCADE,
        document_id          INTEGER REFERENCES document(id) ON DELETE SET NULL,
        jira_issue_id        TEXT,
        created              TEXT NOT NULL,
        updated              TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_measure_requirement ON measure(requirement_id)",
    "CREATE INDEX IF NOT EXISTS idx_measure_document ON measure(document_id)",
];
