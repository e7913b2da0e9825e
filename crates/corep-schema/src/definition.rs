//! Template definition documents
//!
//! Serde mirror of a [`Template`] for loading extra templates from YAML or
//! JSON at runtime. Decoding only checks shape; [`TemplateDefinition::build`]
//! runs the same invariant checks as [`TemplateBuilder`].

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::field::FieldDefinition;
use crate::template::{MasterRule, Template, TemplateBuilder};

/// Plain-data template description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub version: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub rules: Vec<MasterRule>,
}

impl TemplateDefinition {
    /// Decode from YAML text
    ///
    /// # Errors
    /// Returns [`SchemaError::Definition`] on malformed YAML or formula text
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        serde_yaml::from_str(yaml).map_err(|e| SchemaError::Definition(e.to_string()))
    }

    /// Decode from JSON text
    ///
    /// # Errors
    /// Returns [`SchemaError::Definition`] on malformed JSON or formula text
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(json).map_err(|e| SchemaError::Definition(e.to_string()))
    }

    /// Encode as YAML
    ///
    /// # Errors
    /// Returns [`SchemaError::Definition`] if serialization fails
    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        serde_yaml::to_string(self).map_err(|e| SchemaError::Definition(e.to_string()))
    }

    /// Check invariants and produce the template
    ///
    /// # Errors
    /// See [`TemplateBuilder::build`]
    pub fn build(self) -> Result<Template, SchemaError> {
        let builder =
            TemplateBuilder::new(self.id, self.name, self.version).description(self.description);
        let builder = self.fields.into_iter().fold(builder, TemplateBuilder::field);
        self.rules.into_iter().fold(builder, TemplateBuilder::rule).build()
    }
}

impl From<&Template> for TemplateDefinition {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id().to_string(),
            name: template.name().to_string(),
            description: template.description().to_string(),
            version: template.version().to_string(),
            fields: template.fields().cloned().collect(),
            rules: template.rules().to_vec(),
        }
    }
}
