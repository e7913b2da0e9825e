//! Templates and master rules
//!
//! A [`Template`] can only be obtained through [`TemplateBuilder::build`],
//! which checks the template invariants. Holding a `Template` therefore
//! means every rule resolves against its fields.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::field::FieldDefinition;
use crate::formula::Formula;

/// Default absolute tolerance for master-rule comparison
pub const DEFAULT_TOLERANCE: f64 = 0.01;

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

/// Cross-field consistency rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterRule {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub formula: Formula,
    /// Absolute tolerance; `|target - computed| <= tolerance` passes
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl MasterRule {
    /// Create rule with the default tolerance
    pub fn new(id: impl Into<String>, formula: Formula) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            formula,
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    /// Parse the formula text and create the rule
    ///
    /// # Errors
    /// Returns [`SchemaError::FormulaParse`] if the formula is malformed
    pub fn parse(id: impl Into<String>, formula: &str) -> Result<Self, SchemaError> {
        Ok(Self::new(id, Formula::parse(formula)?))
    }

    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }
}

/// Named, versioned reporting schema
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    id: String,
    name: String,
    description: String,
    version: String,
    fields: IndexMap<String, FieldDefinition>,
    rules: Vec<MasterRule>,
}

impl Template {
    /// Start building a template
    pub fn builder(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> TemplateBuilder {
        TemplateBuilder::new(id, name, version)
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[inline]
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Field definitions in insertion order
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    /// Look up a field by id
    #[inline]
    #[must_use]
    pub fn field(&self, id: &str) -> Option<&FieldDefinition> {
        self.fields.get(id)
    }

    #[inline]
    #[must_use]
    pub fn contains_field(&self, id: &str) -> bool {
        self.fields.contains_key(id)
    }

    /// Required fields in insertion order
    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values().filter(|f| f.required)
    }

    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[MasterRule] {
        &self.rules
    }

    /// Look up a master rule by id
    #[must_use]
    pub fn rule(&self, id: &str) -> Option<&MasterRule> {
        self.rules.iter().find(|r| r.id == id)
    }
}

/// Builder enforcing template invariants
#[derive(Debug, Clone)]
pub struct TemplateBuilder {
    id: String,
    name: String,
    description: String,
    version: String,
    fields: Vec<FieldDefinition>,
    rules: Vec<MasterRule>,
}

impl TemplateBuilder {
    /// Create builder with no fields or rules
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            version: version.into(),
            fields: Vec::new(),
            rules: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a field definition
    #[inline]
    #[must_use]
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a master rule
    #[inline]
    #[must_use]
    pub fn rule(mut self, rule: MasterRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Validate and produce the template
    ///
    /// # Errors
    /// - [`SchemaError::DuplicateField`] if two fields share an id
    /// - [`SchemaError::InvalidTolerance`] for negative or non-finite tolerance
    /// - [`SchemaError::UnknownRuleField`] if a rule references a missing field
    /// - [`SchemaError::NonNumericRuleField`] if a rule references a non-numeric field
    pub fn build(self) -> Result<Template, SchemaError> {
        let mut fields = IndexMap::with_capacity(self.fields.len());
        for field in self.fields {
            if fields.contains_key(&field.id) {
                return Err(SchemaError::DuplicateField {
                    template_id: self.id,
                    field_id: field.id,
                });
            }
            fields.insert(field.id.clone(), field);
        }

        for rule in &self.rules {
            if !rule.tolerance.is_finite() || rule.tolerance < 0.0 {
                return Err(SchemaError::InvalidTolerance {
                    rule_id: rule.id.clone(),
                    tolerance: rule.tolerance,
                });
            }
            for field_id in rule.formula.fields() {
                let Some(field) = fields.get(field_id) else {
                    return Err(SchemaError::UnknownRuleField {
                        rule_id: rule.id.clone(),
                        field_id: field_id.to_string(),
                    });
                };
                if !field.data_type.is_numeric() {
                    return Err(SchemaError::NonNumericRuleField {
                        rule_id: rule.id.clone(),
                        field_id: field_id.to_string(),
                    });
                }
            }
        }

        Ok(Template {
            id: self.id,
            name: self.name,
            description: self.description,
            version: self.version,
            fields,
            rules: self.rules,
        })
    }
}
