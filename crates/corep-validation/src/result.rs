//! Validation results and the combined validator

use corep_schema::{Payload, Template};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field::FieldValidator;
use crate::issue::{FieldIssue, RuleIssue};
use crate::quality::DataQualityDetector;
use crate::rules::{MasterRuleChecker, RuleEvaluation, RuleOutcome};

/// Pass/fail of one template field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Pass,
    Fail,
}

/// Outcome of validating one payload against one template
///
/// Immutable; every [`Validator::validate`] call produces a fresh one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    template_id: String,
    field_status: IndexMap<String, FieldStatus>,
    field_issues: Vec<FieldIssue>,
    rule_evaluations: Vec<RuleEvaluation>,
    completeness: f64,
    consistency: f64,
}

impl ValidationResult {
    #[inline]
    #[must_use]
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// Per-field outcome, in template order
    #[inline]
    #[must_use]
    pub fn field_status(&self) -> &IndexMap<String, FieldStatus> {
        &self.field_status
    }

    #[inline]
    #[must_use]
    pub fn field_issues(&self) -> &[FieldIssue] {
        &self.field_issues
    }

    /// Per-rule outcome, in template order
    #[inline]
    #[must_use]
    pub fn rule_evaluations(&self) -> &[RuleEvaluation] {
        &self.rule_evaluations
    }

    /// Violations and skips
    #[must_use]
    pub fn rule_issues(&self) -> Vec<RuleIssue> {
        self.rule_evaluations.iter().filter_map(RuleEvaluation::to_issue).collect()
    }

    /// Populated required fields over total required fields
    #[inline]
    #[must_use]
    pub fn completeness(&self) -> f64 {
        self.completeness
    }

    /// Satisfied rules over all template rules
    ///
    /// Skipped rules count as unsatisfied.
    #[inline]
    #[must_use]
    pub fn consistency(&self) -> f64 {
        self.consistency
    }

    /// No field errors and no violated rules
    ///
    /// Warnings and skipped rules do not fail a payload.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.field_issues.iter().any(FieldIssue::is_error)
            && !self
                .rule_evaluations
                .iter()
                .any(|e| matches!(e.outcome, RuleOutcome::Violated(_)))
    }

    /// Counts for audit and reporting
    #[must_use]
    pub fn summary(&self) -> ValidationSummary {
        let count = |f: fn(&RuleOutcome) -> bool| {
            self.rule_evaluations.iter().filter(|e| f(&e.outcome)).count()
        };
        let fields_failed = self.field_status.values().filter(|s| **s == FieldStatus::Fail).count();

        ValidationSummary {
            template_id: self.template_id.clone(),
            is_valid: self.is_valid(),
            fields_passed: self.field_status.len() - fields_failed,
            fields_failed,
            warnings: self.field_issues.iter().filter(|i| !i.is_error()).count(),
            rules_satisfied: count(|o| matches!(o, RuleOutcome::Satisfied { .. })),
            rules_violated: count(|o| matches!(o, RuleOutcome::Violated(_))),
            rules_skipped: count(|o| matches!(o, RuleOutcome::Skipped { .. })),
            completeness: self.completeness,
            consistency: self.consistency,
        }
    }
}

/// Aggregate counts of a [`ValidationResult`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub template_id: String,
    pub is_valid: bool,
    pub fields_passed: usize,
    pub fields_failed: usize,
    /// Non-blocking field issues (unknown fields)
    pub warnings: usize,
    pub rules_satisfied: usize,
    pub rules_violated: usize,
    pub rules_skipped: usize,
    pub completeness: f64,
    pub consistency: f64,
}

/// Field validation plus master-rule evaluation with scoring
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    fields: FieldValidator,
    rules: MasterRuleChecker,
    quality: DataQualityDetector,
}

impl Validator {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a payload; bad data never fails the call
    #[must_use]
    pub fn validate(&self, payload: &Payload, template: &Template) -> ValidationResult {
        let field_issues = self.fields.validate_fields(payload, template);
        let rule_evaluations = self.rules.evaluate_rules(payload, template);

        let field_status = template
            .fields()
            .map(|def| {
                let failed = field_issues.iter().any(|i| i.field_id == def.id && i.is_error());
                let status = if failed { FieldStatus::Fail } else { FieldStatus::Pass };
                (def.id.clone(), status)
            })
            .collect();

        let required = template.required_fields().count();
        let missing = self.quality.check_completeness(payload, template).len();
        let completeness = ratio(required - missing, required);

        let satisfied = rule_evaluations.iter().filter(|e| e.is_satisfied()).count();
        let consistency = ratio(satisfied, rule_evaluations.len());

        let result = ValidationResult {
            template_id: template.id().to_string(),
            field_status,
            field_issues,
            rule_evaluations,
            completeness,
            consistency,
        };

        tracing::debug!(
            template_id = template.id(),
            valid = result.is_valid(),
            completeness,
            consistency,
            "payload validated"
        );

        result
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        1.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corep_schema::builtin;
    use pretty_assertions::assert_eq;

    fn payload() -> Payload {
        Payload::new("own_funds")
            .with("CET1_capital", 1000.0)
            .with("AT1_capital", 150.0)
            .with("Tier1_capital", 1150.0)
            .with("Tier2_capital", 200.0)
            .with("Total_own_funds", 1350.0)
            .with("Reporting_date", "2024-12-31")
    }

    #[test]
    fn complete_payload_scores_full() {
        let result = Validator::new().validate(&payload(), &builtin::own_funds());
        assert!(result.is_valid());
        assert_eq!(result.completeness(), 1.0);
        assert_eq!(result.consistency(), 1.0);
        assert!(result.field_status().values().all(|s| *s == FieldStatus::Pass));
    }

    #[test]
    fn skipped_and_violated_rules_score_zero() {
        let mut p = payload().with("Total_own_funds", 1400.0);
        p.remove("AT1_capital");
        let result = Validator::new().validate(&p, &builtin::own_funds());

        // MR_001 skipped, MR_002 violated
        assert_eq!(result.consistency(), 0.0);
        assert!((result.completeness() - 5.0 / 6.0).abs() < 1e-12);
        assert_eq!(result.field_status()["AT1_capital"], FieldStatus::Fail);
        assert!(!result.is_valid());

        let summary = result.summary();
        assert_eq!(summary.rules_skipped, 1);
        assert_eq!(summary.rules_violated, 1);
        assert_eq!(summary.fields_failed, 1);
        assert_eq!(summary.fields_passed, 5);
    }

    #[test]
    fn skipped_rule_lowers_consistency() {
        // MR_001 satisfied, MR_002 skipped
        let mut p = payload();
        p.remove("Total_own_funds");
        let result = Validator::new().validate(&p, &builtin::own_funds());
        assert_eq!(result.consistency(), 0.5);
        assert_eq!(result.summary().rules_skipped, 1);
    }

    #[test]
    fn empty_payload_is_not_consistent() {
        let result = Validator::new().validate(&Payload::new("own_funds"), &builtin::own_funds());
        assert_eq!(result.consistency(), 0.0);
        assert_eq!(result.completeness(), 0.0);
    }

    #[test]
    fn unknown_fields_only_warn() {
        let payload = payload().with("Comment", "n/a");
        let result = Validator::new().validate(&payload, &builtin::own_funds());
        assert!(result.is_valid());
        assert_eq!(result.summary().warnings, 1);
    }

    #[test]
    fn validation_is_idempotent() {
        let template = builtin::own_funds();
        let p = payload().with("Tier1_capital", 1200.0);
        let validator = Validator::new();
        assert_eq!(validator.validate(&p, &template), validator.validate(&p, &template));
    }
}
