//! Master-rule consistency checks
//!
//! Each rule is evaluated on its own, exhaustively, so one call surfaces
//! every violation. Rules whose fields cannot be resolved to numbers are
//! skipped rather than failed.

use std::collections::HashMap;

use corep_schema::{MasterRule, Payload, Template};
use serde::{Deserialize, Serialize};

use crate::issue::{Discrepancy, RuleIssue, RuleIssueKind};

/// Result of evaluating one rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RuleOutcome {
    Satisfied { target: f64, computed: f64 },
    Violated(Discrepancy),
    Skipped { unresolved: Vec<String> },
}

/// Outcome of one rule, by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEvaluation {
    pub rule_id: String,
    pub outcome: RuleOutcome,
}

impl RuleEvaluation {
    #[inline]
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        matches!(self.outcome, RuleOutcome::Satisfied { .. })
    }

    /// Issue form, `None` when satisfied
    #[must_use]
    pub fn to_issue(&self) -> Option<RuleIssue> {
        let kind = match &self.outcome {
            RuleOutcome::Satisfied { .. } => return None,
            RuleOutcome::Violated(d) => RuleIssueKind::MasterRuleViolation(d.clone()),
            RuleOutcome::Skipped { unresolved } => RuleIssueKind::RuleSkipped {
                unresolved: unresolved.clone(),
            },
        };
        Some(RuleIssue::new(&self.rule_id, kind))
    }
}

/// Stateless master-rule checker
#[derive(Debug, Clone, Copy, Default)]
pub struct MasterRuleChecker;

impl MasterRuleChecker {
    /// Create new checker instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Violations and skips for every rule of the template
    #[must_use]
    pub fn check_master_rules(&self, payload: &Payload, template: &Template) -> Vec<RuleIssue> {
        self.evaluate_rules(payload, template)
            .iter()
            .filter_map(RuleEvaluation::to_issue)
            .collect()
    }

    /// Outcome of every rule, in template order
    #[must_use]
    pub fn evaluate_rules(&self, payload: &Payload, template: &Template) -> Vec<RuleEvaluation> {
        template
            .rules()
            .iter()
            .map(|rule| RuleEvaluation {
                rule_id: rule.id.clone(),
                outcome: Self::evaluate_rule(rule, payload, template),
            })
            .collect()
    }

    /// Evaluate a single rule
    #[must_use]
    pub fn evaluate_rule(rule: &MasterRule, payload: &Payload, template: &Template) -> RuleOutcome {
        let mut values: HashMap<&str, f64> = HashMap::new();
        let mut unresolved = Vec::new();

        for field_id in rule.formula.fields() {
            match Self::resolve(field_id, payload, template) {
                Some(n) => {
                    values.insert(field_id, n);
                }
                None => unresolved.push(field_id.to_string()),
            }
        }

        if !unresolved.is_empty() {
            tracing::debug!(rule_id = %rule.id, ?unresolved, "master rule skipped");
            return RuleOutcome::Skipped { unresolved };
        }

        let target = values[rule.formula.target()];
        let Some(computed) = rule.formula.expression().evaluate(&values) else {
            return RuleOutcome::Skipped { unresolved };
        };

        if rule.formula.comparator().holds(target, computed, rule.tolerance) {
            tracing::debug!(rule_id = %rule.id, target, computed, "master rule satisfied");
            RuleOutcome::Satisfied { target, computed }
        } else {
            let discrepancy =
                Discrepancy::new(rule.formula.to_string(), target, computed, rule.tolerance);
            tracing::warn!(
                rule_id = %rule.id,
                target,
                computed,
                discrepancy = discrepancy.absolute,
                "master rule violated"
            );
            RuleOutcome::Violated(discrepancy)
        }
    }

    /// Numeric value of a payload field, coerced through its declared type
    fn resolve(field_id: &str, payload: &Payload, template: &Template) -> Option<f64> {
        let def = template.field(field_id)?;
        payload
            .get(field_id)
            .filter(|v| !v.is_empty())?
            .coerce(def.data_type)?
            .as_number()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corep_schema::{DataType, FieldDefinition};

    fn template(tolerance: f64) -> Template {
        let decimal = |id: &str| FieldDefinition::new(id, id, DataType::Decimal);
        Template::builder("t", "Test", "1.0")
            .field(decimal("total"))
            .field(decimal("a"))
            .field(decimal("b"))
            .field(decimal("floor"))
            .rule(MasterRule::parse("SUM", "total == a + b").unwrap().with_tolerance(tolerance))
            .rule(MasterRule::parse("MIN", "total >= floor").unwrap())
            .build()
            .unwrap()
    }

    fn payload(total: f64, a: f64, b: f64, floor: f64) -> Payload {
        Payload::new("t").with("total", total).with("a", a).with("b", b).with("floor", floor)
    }

    #[test]
    fn satisfied_rules_have_no_issues() {
        let payload = payload(30.0, 10.0, 20.0, 5.0);
        let issues = MasterRuleChecker::new().check_master_rules(&payload, &template(0.01));
        assert!(issues.is_empty());
    }

    #[test]
    fn within_tolerance_passes() {
        let payload = payload(30.4, 10.0, 20.0, 5.0);
        let issues = MasterRuleChecker::new().check_master_rules(&payload, &template(0.5));
        assert!(issues.is_empty());
    }

    #[test]
    fn every_violation_reported() {
        let payload = payload(31.0, 10.0, 20.0, 40.0);
        let issues = MasterRuleChecker::new().check_master_rules(&payload, &template(0.01));
        let ids: Vec<_> = issues.iter().map(|i| i.rule_id.as_str()).collect();
        assert_eq!(ids, vec!["SUM", "MIN"]);
        assert!(issues.iter().all(RuleIssue::is_violation));

        let d = issues[0].discrepancy().unwrap();
        assert_eq!(d.target, 31.0);
        assert_eq!(d.computed, 30.0);
        assert_eq!(d.absolute, 1.0);
        assert_eq!(d.formula, "total == a + b");
    }

    #[test]
    fn missing_field_skips_rule() {
        let mut p = payload(30.0, 10.0, 20.0, 5.0);
        p.remove("b");
        p.set("floor", "n/a");
        let evaluations = MasterRuleChecker::new().evaluate_rules(&p, &template(0.01));
        assert_eq!(
            evaluations[0].outcome,
            RuleOutcome::Skipped {
                unresolved: vec!["b".to_string()]
            }
        );
        assert_eq!(
            evaluations[1].outcome,
            RuleOutcome::Skipped {
                unresolved: vec!["floor".to_string()]
            }
        );
    }

    #[test]
    fn numeric_text_is_resolved() {
        let p = payload(30.0, 10.0, 20.0, 5.0).with("a", "10");
        assert!(MasterRuleChecker::new().check_master_rules(&p, &template(0.01)).is_empty());
    }
}
