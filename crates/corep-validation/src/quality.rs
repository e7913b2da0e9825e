//! Data-quality diagnostics
//!
//! Missing-data and formula-mismatch detection on top of the field validator
//! and the master-rule checker.

use corep_schema::{Payload, Template};
use serde::{Deserialize, Serialize};

use crate::field::FieldValidator;
use crate::issue::{FieldIssueKind, RuleIssue};
use crate::rules::MasterRuleChecker;

/// Combined data-quality findings for one payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Required fields that are absent or empty
    pub missing: Vec<String>,
    /// Master-rule violations
    pub inconsistencies: Vec<RuleIssue>,
    /// Fields with type, range or enum errors
    pub invalid_fields: Vec<String>,
}

impl QualityReport {
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.inconsistencies.is_empty() && self.invalid_fields.is_empty()
    }
}

/// Stateless data-quality detector
#[derive(Debug, Clone, Copy, Default)]
pub struct DataQualityDetector {
    fields: FieldValidator,
    rules: MasterRuleChecker,
}

impl DataQualityDetector {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Required fields that are absent or empty, in template order
    #[must_use]
    pub fn check_completeness(&self, payload: &Payload, template: &Template) -> Vec<String> {
        template
            .required_fields()
            .filter(|def| !payload.is_populated(&def.id))
            .map(|def| def.id.clone())
            .collect()
    }

    /// Master-rule violations; rules that could not be evaluated are left out
    #[must_use]
    pub fn check_consistency(&self, payload: &Payload, template: &Template) -> Vec<RuleIssue> {
        self.rules
            .check_master_rules(payload, template)
            .into_iter()
            .filter(RuleIssue::is_violation)
            .collect()
    }

    /// Completeness, consistency and invalid-field findings together
    #[must_use]
    pub fn assess(&self, payload: &Payload, template: &Template) -> QualityReport {
        let mut invalid_fields: Vec<String> = Vec::new();
        for issue in self.fields.validate_fields(payload, template) {
            let invalid = matches!(
                issue.kind,
                FieldIssueKind::InvalidType { .. }
                    | FieldIssueKind::OutOfRange { .. }
                    | FieldIssueKind::InvalidEnumValue { .. }
            );
            if invalid && !invalid_fields.contains(&issue.field_id) {
                invalid_fields.push(issue.field_id);
            }
        }

        let report = QualityReport {
            missing: self.check_completeness(payload, template),
            inconsistencies: self.check_consistency(payload, template),
            invalid_fields,
        };

        tracing::debug!(
            template_id = template.id(),
            missing = report.missing.len(),
            inconsistencies = report.inconsistencies.len(),
            invalid = report.invalid_fields.len(),
            "data quality assessed"
        );

        report
    }
}
