//! Field-level validation
//!
//! Checks a payload against a template's field definitions: presence of
//! required fields, type coercion, numeric range and allowed values.

use corep_schema::{FieldDefinition, FieldValue, Payload, Template};

use crate::issue::{FieldIssue, FieldIssueKind};

/// Stateless field validator
///
/// Identical payload and template always yield identical issues.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldValidator;

impl FieldValidator {
    /// Create new validator instance
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Validate every template field, then flag unknown payload fields
    ///
    /// Template fields are reported in template order, unknown fields in
    /// payload order after them.
    #[must_use]
    pub fn validate_fields(&self, payload: &Payload, template: &Template) -> Vec<FieldIssue> {
        let mut issues: Vec<FieldIssue> = template
            .fields()
            .flat_map(|def| Self::validate_field(def, payload.get(&def.id)))
            .collect();

        issues.extend(
            payload
                .iter()
                .filter(|(id, _)| !template.contains_field(id))
                .map(|(id, _)| FieldIssue::new(id, FieldIssueKind::UnknownField)),
        );

        issues
    }

    /// Validate a single value against its definition
    ///
    /// At most one type-or-presence issue is reported; range and enum checks
    /// only run on values that coerced.
    #[must_use]
    pub fn validate_field(def: &FieldDefinition, value: Option<&FieldValue>) -> Vec<FieldIssue> {
        let value = match value {
            Some(v) if !v.is_empty() => v,
            _ if def.required => {
                return vec![FieldIssue::new(&def.id, FieldIssueKind::MissingRequiredField)];
            }
            _ => return Vec::new(),
        };

        let Some(coerced) = value.coerce(def.data_type) else {
            return vec![FieldIssue::new(
                &def.id,
                FieldIssueKind::InvalidType {
                    expected: def.data_type,
                    found: format!("{} '{}'", value.kind(), value),
                },
            )];
        };

        let mut issues = Vec::new();

        if let (Some(range), Some(n)) = (def.effective_range(), coerced.as_number()) {
            if !range.contains(n) {
                issues.push(FieldIssue::new(
                    &def.id,
                    FieldIssueKind::OutOfRange {
                        value: n,
                        min: range.min,
                        max: range.max,
                    },
                ));
            }
        }

        if !def.allowed_values.is_empty() {
            let canonical = coerced.to_string();
            if !def.allowed_values.contains(&canonical) {
                issues.push(FieldIssue::new(
                    &def.id,
                    FieldIssueKind::InvalidEnumValue {
                        value: canonical,
                        allowed: def.allowed_values.clone(),
                    },
                ));
            }
        }

        issues
    }
}
