//! Report bundle handed to renderers

use corep_audit::AuditSnapshot;
use corep_schema::{Payload, Template};
use corep_validation::ValidationResult;
use indexmap::IndexMap;
use serde::Serialize;
use uuid::Uuid;

use crate::error::CoreResult;
use crate::source::Citation;

/// Everything needed to render a finished report
#[derive(Debug, Clone, Serialize)]
pub struct ReportBundle {
    pub report_name: String,
    pub session_id: Uuid,
    pub template: Template,
    pub payload: Payload,
    pub result: ValidationResult,
    /// Mapper confidence per field, as proposed
    pub confidence: IndexMap<String, f64>,
    /// Mapper warnings
    pub warnings: Vec<String>,
    pub citations: Vec<Citation>,
    pub audit: AuditSnapshot,
}

impl ReportBundle {
    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Returns [`CoreError::Serialization`](crate::CoreError::Serialization)
    /// if encoding fails
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
