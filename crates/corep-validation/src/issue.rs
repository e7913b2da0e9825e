//! Structured validation diagnostics
//!
//! Bad data is never an `Err`: every problem becomes a [`FieldIssue`] or a
//! [`RuleIssue`], collected so a caller sees all of them in one pass.

use std::fmt;

use corep_schema::DataType;
use serde::{Deserialize, Serialize};

/// Whether an issue blocks the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Problem with a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub field_id: String,
    pub kind: FieldIssueKind,
}

/// Kinds of field-level problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldIssueKind {
    /// Required field absent or empty
    MissingRequiredField,

    /// Value does not coerce to the declared type
    InvalidType { expected: DataType, found: String },

    /// Numeric value outside the inclusive bounds
    OutOfRange {
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    /// Value not among the allowed values
    InvalidEnumValue { value: String, allowed: Vec<String> },

    /// Payload carries a field the template does not define
    UnknownField,
}

impl FieldIssue {
    pub fn new(field_id: impl Into<String>, kind: FieldIssueKind) -> Self {
        Self {
            field_id: field_id.into(),
            kind,
        }
    }

    /// Unknown fields are surfaced without blocking the run
    #[inline]
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self.kind {
            FieldIssueKind::UnknownField => Severity::Warning,
            _ => Severity::Error,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = &self.field_id;
        match &self.kind {
            FieldIssueKind::MissingRequiredField => write!(f, "required field {id} is missing"),
            FieldIssueKind::InvalidType { expected, found } => {
                write!(f, "field {id} must be {expected}, got {found}")
            }
            FieldIssueKind::OutOfRange { value, min, max } => {
                write!(f, "field {id} value {value} is out of range")?;
                match (min, max) {
                    (Some(min), Some(max)) => write!(f, " [{min}, {max}]"),
                    (Some(min), None) => write!(f, " (must be >= {min})"),
                    (None, Some(max)) => write!(f, " (must be <= {max})"),
                    (None, None) => Ok(()),
                }
            }
            FieldIssueKind::InvalidEnumValue { value, allowed } => {
                write!(f, "field {id} value '{value}' is not one of {allowed:?}")
            }
            FieldIssueKind::UnknownField => write!(f, "field {id} is not part of the template"),
        }
    }
}

/// Computed mismatch for a violated master rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discrepancy {
    /// Formula text, for reporting
    pub formula: String,
    /// Reported value of the target field
    pub target: f64,
    /// Value of the expression side
    pub computed: f64,
    /// `|target - computed|`
    pub absolute: f64,
    /// `absolute / |computed|`, absent when `computed` is zero
    pub relative: Option<f64>,
    pub tolerance: f64,
}

impl Discrepancy {
    #[must_use]
    pub fn new(formula: impl Into<String>, target: f64, computed: f64, tolerance: f64) -> Self {
        let absolute = (target - computed).abs();
        let relative = (computed != 0.0).then(|| absolute / computed.abs());
        Self {
            formula: formula.into(),
            target,
            computed,
            absolute,
            relative,
            tolerance,
        }
    }
}

/// Problem with a master rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleIssue {
    pub rule_id: String,
    pub kind: RuleIssueKind,
}

/// Kinds of rule-level problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleIssueKind {
    /// Target and expression disagree beyond tolerance
    MasterRuleViolation(Discrepancy),

    /// Rule could not be evaluated; not a failure
    RuleSkipped { unresolved: Vec<String> },
}

impl RuleIssue {
    pub fn new(rule_id: impl Into<String>, kind: RuleIssueKind) -> Self {
        Self {
            rule_id: rule_id.into(),
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_violation(&self) -> bool {
        matches!(self.kind, RuleIssueKind::MasterRuleViolation(_))
    }

    #[inline]
    #[must_use]
    pub fn is_skipped(&self) -> bool {
        matches!(self.kind, RuleIssueKind::RuleSkipped { .. })
    }

    /// Discrepancy of a violation
    #[inline]
    #[must_use]
    pub fn discrepancy(&self) -> Option<&Discrepancy> {
        match &self.kind {
            RuleIssueKind::MasterRuleViolation(d) => Some(d),
            RuleIssueKind::RuleSkipped { .. } => None,
        }
    }
}

impl fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RuleIssueKind::MasterRuleViolation(d) => write!(
                f,
                "master rule {} violated: {} (expected {}, got {}, off by {})",
                self.rule_id, d.formula, d.computed, d.target, d.absolute
            ),
            RuleIssueKind::RuleSkipped { unresolved } => write!(
                f,
                "master rule {} skipped: unresolved fields {}",
                self.rule_id,
                unresolved.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_is_warning() {
        assert_eq!(
            FieldIssue::new("x", FieldIssueKind::UnknownField).severity(),
            Severity::Warning
        );
        assert!(FieldIssue::new("x", FieldIssueKind::MissingRequiredField).is_error());
    }

    #[test]
    fn discrepancy_relative() {
        let d = Discrepancy::new("T == A", 1200.0, 1150.0, 0.01);
        assert_eq!(d.absolute, 50.0);
        assert!((d.relative.unwrap() - 50.0 / 1150.0).abs() < 1e-12);

        let d = Discrepancy::new("T == A", 5.0, 0.0, 0.01);
        assert_eq!(d.relative, None);
    }

    #[test]
    fn display_messages() {
        let issue = FieldIssue::new(
            "CET1_capital",
            FieldIssueKind::OutOfRange {
                value: -5.0,
                min: Some(0.0),
                max: None,
            },
        );
        assert_eq!(issue.to_string(), "field CET1_capital value -5 is out of range (must be >= 0)");

        let issue = RuleIssue::new(
            "MR_001",
            RuleIssueKind::RuleSkipped {
                unresolved: vec!["AT1_capital".into()],
            },
        );
        assert_eq!(issue.to_string(), "master rule MR_001 skipped: unresolved fields AT1_capital");
        assert!(issue.is_skipped());
        assert!(issue.discrepancy().is_none());
    }

    #[test]
    fn issues_serialize_tagged() {
        let issue = FieldIssue::new("a", FieldIssueKind::MissingRequiredField);
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"field_id": "a", "kind": {"kind": "missing_required_field"}})
        );
    }
}
