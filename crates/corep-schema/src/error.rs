//! Error types for the schema registry
//!
//! Covers registry lookups and the invariants enforced when a template is
//! constructed (unique fields, resolvable and numeric rule references,
//! parseable formulas).

/// Errors raised by the registry and by template construction
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// No template registered under this id
    #[error("template not found: '{0}'")]
    TemplateNotFound(String),

    /// A template with this id is already registered
    #[error("template already registered: '{0}'")]
    DuplicateTemplate(String),

    /// Two field definitions share an id
    #[error("duplicate field '{field_id}' in template '{template_id}'")]
    DuplicateField {
        template_id: String,
        field_id: String,
    },

    /// A master rule references a field the template does not define
    #[error("rule '{rule_id}' references unknown field '{field_id}'")]
    UnknownRuleField { rule_id: String, field_id: String },

    /// A master rule references a field that cannot hold a number
    #[error("rule '{rule_id}' references non-numeric field '{field_id}'")]
    NonNumericRuleField { rule_id: String, field_id: String },

    /// Formula text could not be parsed
    #[error("invalid formula '{formula}': {reason}")]
    FormulaParse { formula: String, reason: String },

    /// Tolerance must be finite and non-negative
    #[error("rule '{rule_id}' has invalid tolerance {tolerance}")]
    InvalidTolerance { rule_id: String, tolerance: f64 },

    /// Payload input has the wrong shape
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Template definition document could not be decoded
    #[error("invalid template definition: {0}")]
    Definition(String),
}

impl SchemaError {
    /// Create formula parse error
    pub fn formula(formula: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FormulaParse {
            formula: formula.into(),
            reason: reason.into(),
        }
    }

    /// Check if error is a registry lookup/registration failure
    #[inline]
    #[must_use]
    pub fn is_registry_error(&self) -> bool {
        matches!(self, Self::TemplateNotFound(_) | Self::DuplicateTemplate(_))
    }
}

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_not_found_display() {
        let err = SchemaError::TemplateNotFound("own_funds".to_string());
        assert_eq!(err.to_string(), "template not found: 'own_funds'");
        assert!(err.is_registry_error());
    }

    #[test]
    fn formula_error_display() {
        let err = SchemaError::formula("A == ", "unexpected end of formula");
        assert!(err.to_string().contains("unexpected end"));
        assert!(!err.is_registry_error());
    }
}
