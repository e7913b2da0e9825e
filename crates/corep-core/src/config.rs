//! Session configuration
//!
//! Loaded from TOML; every key except `template_id` has a default.
//!
//! ```toml
//! report_name = "Own Funds Q4 2024"
//! template_id = "own_funds"
//! actor = "analyst"
//! rule_query = "own funds"
//! template_files = ["templates/leverage.yaml"]
//! ```

use std::path::{Path, PathBuf};

use corep_schema::{SchemaError, TemplateDefinition, TemplateRegistry};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Actor recorded when the configuration names none
pub const DEFAULT_ACTOR: &str = "system";

/// Reporting session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Human-readable report name, carried into the audit header
    pub report_name: String,
    /// Template the session reports against
    pub template_id: String,
    /// Default audit actor
    pub actor: String,
    /// Query used for rule retrieval; the question is used when empty
    pub rule_query: String,
    /// Extra template definitions (YAML or JSON) to register before lookup
    pub template_files: Vec<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            report_name: "COREP report".to_string(),
            template_id: String::new(),
            actor: DEFAULT_ACTOR.to_string(),
            rule_query: String::new(),
            template_files: Vec::new(),
        }
    }
}

impl SessionConfig {
    /// Create configuration for a template
    #[must_use]
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            ..Self::default()
        }
    }

    /// With report name
    #[inline]
    #[must_use]
    pub fn with_report_name(mut self, name: impl Into<String>) -> Self {
        self.report_name = name.into();
        self
    }

    /// With default actor
    #[inline]
    #[must_use]
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }

    /// With rule retrieval query
    #[inline]
    #[must_use]
    pub fn with_rule_query(mut self, query: impl Into<String>) -> Self {
        self.rule_query = query.into();
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] on malformed TOML or a missing template id
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// Relative `template_files` are resolved against the file's directory.
    ///
    /// # Errors
    /// Returns [`CoreError::Io`] if the file cannot be read, otherwise as
    /// [`SessionConfig::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io_error(path, e))?;
        let mut config = Self::from_toml_str(&text)?;
        if let Some(base) = path.parent() {
            for file in &mut config.template_files {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
        Ok(config)
    }

    /// TOML text of this configuration
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if encoding fails
    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Check required settings
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the template id or actor is blank
    pub fn validate(&self) -> CoreResult<()> {
        if self.template_id.trim().is_empty() {
            return Err(CoreError::Config("template_id must be set".to_string()));
        }
        if self.actor.trim().is_empty() {
            return Err(CoreError::Config("actor must not be blank".to_string()));
        }
        Ok(())
    }

    /// Register the configured template files
    ///
    /// Re-registering a file whose template is already present unchanged is a
    /// no-op.
    ///
    /// # Errors
    /// Returns [`CoreError::Io`] for unreadable files,
    /// [`CoreError::Schema`] for invalid definitions, and
    /// [`SchemaError::DuplicateTemplate`] when a different template with the
    /// same id is already registered
    pub fn register_templates(&self, registry: &TemplateRegistry) -> CoreResult<usize> {
        let mut registered = 0;
        for file in &self.template_files {
            let text = std::fs::read_to_string(file).map_err(|e| CoreError::io_error(file, e))?;
            let is_json = file.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            let definition = if is_json {
                TemplateDefinition::from_json(&text)?
            } else {
                TemplateDefinition::from_yaml(&text)?
            };
            let template = definition.build()?;
            if let Ok(existing) = registry.get_template(template.id()) {
                if *existing != template {
                    return Err(SchemaError::DuplicateTemplate(template.id().to_string()).into());
                }
                tracing::debug!(
                    template_id = template.id(),
                    path = %file.display(),
                    "identical template already registered"
                );
                continue;
            }
            registry.register_template(template)?;
            registered += 1;
        }
        Ok(registered)
    }
}
