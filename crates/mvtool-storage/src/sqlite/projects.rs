//! Table mappings for projects, documents, requirements and measures.

use rusqlite::Row;
use rusqlite::types::Value;

use mvtool_core::ExternalRef;
use mvtool_core::catalog::CatalogRequirement;
use mvtool_core::enums::{
    ComplianceStatus, CompletionStatus, VerificationMethod, VerificationStatus,
};
use mvtool_core::project::{Document, Measure, Project, Requirement};

use crate::error::Result;
use crate::sqlite::record::{
    Record, opt_enum, opt_link, opt_parent_id, opt_text, parent_id, record_bookkeeping, text,
};
use crate::sqlite::session::{Session, parse_datetime};

impl Record for Project {
    const KIND: &'static str = "project";
    const TABLE: &'static str = "project";
    const COLUMNS: &'static [&'static str] = &["name", "description", "jira_project_id"];
    const PARENT_COLUMN: Option<&'static str> = None;

    record_bookkeeping!(projects);

    fn preload(_session: &mut Session<'_>, _ids: &[i64]) -> Result<()> {
        Ok(())
    }

    fn scan(row: &Row<'_>, _session: &Session<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            name: row.get("name")?,
            description: row.get("description")?,
            jira_project: ExternalRef::new(row.get("jira_project_id")?),
            created: parse_datetime(&row.get::<_, String>("created")?),
            updated: parse_datetime(&row.get::<_, String>("updated")?),
        })
    }

    fn values(&self, _session: &Session<'_>) -> Result<Vec<Value>> {
        Ok(vec![
            text(&self.name),
            opt_text(self.description.as_deref()),
            opt_text(self.jira_project.id()),
        ])
    }
}

impl Record for Document {
    const KIND: &'static str = "document";
    const TABLE: &'static str = "document";
    const COLUMNS: &'static [&'static str] = &["reference", "title", "description", "project_id"];
    const PARENT_COLUMN: Option<&'static str> = Some("project_id");

    record_bookkeeping!(documents);

    fn preload(session: &mut Session<'_>, ids: &[i64]) -> Result<()> {
        let project_ids = session.foreign_ids::<Self>("project_id", ids)?;
        session.load_many_by_id::<Project>(&project_ids)?;
        Ok(())
    }

    fn scan(row: &Row<'_>, session: &Session<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            reference: row.get("reference")?,
            title: row.get("title")?,
            description: row.get("description")?,
            project: session.link(row.get("project_id")?)?,
            created: parse_datetime(&row.get::<_, String>("created")?),
            updated: parse_datetime(&row.get::<_, String>("updated")?),
        })
    }

    fn values(&self, session: &Session<'_>) -> Result<Vec<Value>> {
        Ok(vec![
            opt_text(self.reference.as_deref()),
            text(&self.title),
            opt_text(self.description.as_deref()),
            parent_id(session, self.project)?,
        ])
    }
}

impl Record for Requirement {
    const KIND: &'static str = "requirement";
    const TABLE: &'static str = "requirement";
    const COLUMNS: &'static [&'static str] = &[
        "reference",
        "summary",
        "description",
        "compliance_status",
        "compliance_comment",
        "target_object",
        "milestone",
        "project_id",
        "catalog_requirement_id",
    ];
    const PARENT_COLUMN: Option<&'static str> = Some("project_id");

    record_bookkeeping!(requirements);

    fn preload(session: &mut Session<'_>, ids: &[i64]) -> Result<()> {
        let project_ids = session.foreign_ids::<Self>("project_id", ids)?;
        session.load_many_by_id::<Project>(&project_ids)?;
        let catalog_requirement_ids = session.foreign_ids::<Self>("catalog_requirement_id", ids)?;
        session.load_many_by_id::<CatalogRequirement>(&catalog_requirement_ids)?;
        Ok(())
    }

    fn scan(row: &Row<'_>, session: &Session<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            reference: row.get("reference")?,
            summary: row.get("summary")?,
            description: row.get("description")?,
            compliance_status: row
                .get::<_, Option<String>>("compliance_status")?
                .map(ComplianceStatus::from),
            compliance_comment: row.get("compliance_comment")?,
            target_object: row.get("target_object")?,
            milestone: row.get("milestone")?,
            project: session.link(row.get("project_id")?)?,
            catalog_requirement: opt_link(row, session, "catalog_requirement_id")?,
            created: parse_datetime(&row.get::<_, String>("created")?),
            updated: parse_datetime(&row.get::<_, String>("updated")?),
        })
    }

    fn values(&self, session: &Session<'_>) -> Result<Vec<Value>> {
        Ok(vec![
            opt_text(self.reference.as_deref()),
            text(&self.summary),
            opt_text(self.description.as_deref()),
            opt_enum(self.compliance_status.as_ref()),
            opt_text(self.compliance_comment.as_deref()),
            opt_text(self.target_object.as_deref()),
            opt_text(self.milestone.as_deref()),
            parent_id(session, self.project)?,
            opt_parent_id(session, self.catalog_requirement)?,
        ])
    }
}

impl Record for Measure {
    const KIND: &'static str = "measure";
    const TABLE: &'static str = "measure";
    const COLUMNS: &'static [&'static str] = &[
        "reference",
        "summary",
        "description",
        "compliance_status",
        "compliance_comment",
        "completion_status",
        "completion_comment",
        "verification_method",
        "verification_status",
        "verification_comment",
        "requirement_id",
        "document_id",
        "jira_issue_id",
    ];
    const PARENT_COLUMN: Option<&'static str> = Some("requirement_id");

    record_bookkeeping!(measures);

    fn preload(session: &mut Session<'_>, ids: &[i64]) -> Result<()> {
        let requirement_ids = session.foreign_ids::<Self>("requirement_id", ids)?;
        session.load_many_by_id::<Requirement>(&requirement_ids)?;
        let document_ids = session.foreign_ids::<Self>("document_id", ids)?;
        session.load_many_by_id::<Document>(&document_ids)?;
        Ok(())
    }

    fn scan(row: &Row<'_>, session: &Session<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get("id")?),
            reference: row.get("reference")?,
            summary: row.get("summary")?,
            description: row.get("description")?,
            compliance_status: row
                .get::<_, Option<String>>("compliance_status")?
                .map(ComplianceStatus::from),
            compliance_comment: row.get("compliance_comment")?,
            completion_status: row
                .get::<_, Option<String>>("completion_status")?
                .map(CompletionStatus::from),
            completion_comment: row.get("completion_comment")?,
            verification_method: row
                .get::<_, Option<String>>("verification_method")?
                .map(VerificationMethod::from),
            verification_status: row
                .get::<_, Option<String>>("verification_status")?
                .map(VerificationStatus::from),
            verification_comment: row.get("verification_comment")?,
            requirement: session.link(row.get("requirement_id")?)?,
            document: opt_link(row, session, "document_id")?,
            jira_issue: ExternalRef::new(row.get("jira_issue_id")?),
            created: parse_datetime(&row.get::<_, String>("created")?),
            updated: parse_datetime(&row.get::<_, String>("updated")?),
        })
    }

    fn values(&self, session: &Session<'_>) -> Result<Vec<Value>> {
        Ok(vec![
            opt_text(self.reference.as_deref()),
            text(&self.summary),
            opt_text(self.description.as_deref()),
            opt_enum(self.compliance_status.as_ref()),
            opt_text(self.compliance_comment.as_deref()),
            opt_enum(self.completion_status.as_ref()),
            opt_text(self.completion_comment.as_deref()),
            opt_enum(self.verification_method.as_ref()),
            opt_enum(self.verification_status.as_ref()),
            opt_text(self.verification_comment.as_deref()),
            parent_id(session, self.requirement)?,
            opt_parent_id(session, self.document)?,
            opt_text(self.jira_issue.id()),
        ])
    }
}
