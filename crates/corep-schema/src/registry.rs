//! Template registry
//!
//! Provides [`TemplateRegistry`] for registering and resolving templates by
//! id. Templates are shared as `Arc<Template>` and never removed, so anything
//! holding one can rely on it for the life of the process.

use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::builtin;
use crate::error::SchemaError;
use crate::template::Template;

static GLOBAL: Lazy<TemplateRegistry> = Lazy::new(TemplateRegistry::with_builtins);

/// Registry of reporting templates
///
/// Registration order is preserved for listing.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: RwLock<IndexMap<String, Arc<Template>>>,
}

impl TemplateRegistry {
    /// Create empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(IndexMap::new()),
        }
    }

    /// Create registry with the built-in templates
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for template in builtin::all() {
            // ids of the built-ins are distinct constants
            let _ = registry.register_template(template);
        }
        registry
    }

    /// Process-wide registry, populated with the built-ins on first use
    #[inline]
    #[must_use]
    pub fn global() -> &'static TemplateRegistry {
        &GLOBAL
    }

    /// Register a template
    ///
    /// # Errors
    /// Returns [`SchemaError::DuplicateTemplate`] if the id is taken
    pub fn register_template(&self, template: Template) -> Result<Arc<Template>, SchemaError> {
        let mut templates = self.templates.write();
        if templates.contains_key(template.id()) {
            return Err(SchemaError::DuplicateTemplate(template.id().to_string()));
        }
        let template = Arc::new(template);
        templates.insert(template.id().to_string(), Arc::clone(&template));
        tracing::info!(
            template_id = template.id(),
            version = template.version(),
            fields = template.fields().len(),
            rules = template.rules().len(),
            "registered template"
        );
        Ok(template)
    }

    /// Resolve a template by id
    ///
    /// # Errors
    /// Returns [`SchemaError::TemplateNotFound`] if absent
    pub fn get_template(&self, id: &str) -> Result<Arc<Template>, SchemaError> {
        self.templates
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| SchemaError::TemplateNotFound(id.to_string()))
    }

    /// `(id, name)` pairs in registration order
    #[must_use]
    pub fn list_templates(&self) -> Vec<(String, String)> {
        self.templates
            .read()
            .values()
            .map(|t| (t.id().to_string(), t.name().to_string()))
            .collect()
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.templates.read().contains_key(id)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.read().len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::{CAPITAL_REQUIREMENTS, OWN_FUNDS};
    use crate::field::FieldDefinition;
    use crate::value::DataType;

    fn custom(id: &str) -> Template {
        Template::builder(id, "Custom", "0.1")
            .field(FieldDefinition::new("x", "X", DataType::Integer))
            .build()
            .unwrap()
    }

    #[test]
    fn registry_new_empty() {
        let registry = TemplateRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.list_templates().is_empty());
    }

    #[test]
    fn registry_with_builtins() {
        let registry = TemplateRegistry::with_builtins();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.list_templates(),
            vec![
                (OWN_FUNDS.to_string(), "Own Funds".to_string()),
                (CAPITAL_REQUIREMENTS.to_string(), "Capital Requirements".to_string()),
            ]
        );
    }

    #[test]
    fn registry_get_missing() {
        let registry = TemplateRegistry::new();
        let result = registry.get_template("nope");
        assert!(matches!(result, Err(SchemaError::TemplateNotFound(id)) if id == "nope"));
    }

    #[test]
    fn registry_rejects_duplicate() {
        let registry = TemplateRegistry::with_builtins();
        let result = registry.register_template(builtin::own_funds());
        assert!(matches!(result, Err(SchemaError::DuplicateTemplate(id)) if id == OWN_FUNDS));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn registry_extends_at_runtime() {
        let registry = TemplateRegistry::with_builtins();
        registry.register_template(custom("custom")).unwrap();
        let listed: Vec<_> = registry.list_templates().into_iter().map(|(id, _)| id).collect();
        assert_eq!(listed, vec![OWN_FUNDS, CAPITAL_REQUIREMENTS, "custom"]);
        assert_eq!(registry.get_template("custom").unwrap().version(), "0.1");
    }

    #[test]
    fn registries_are_isolated() {
        let a = TemplateRegistry::new();
        let b = TemplateRegistry::new();
        a.register_template(custom("only_a")).unwrap();
        assert!(a.contains("only_a"));
        assert!(!b.contains("only_a"));
    }

    #[test]
    fn global_has_builtins() {
        let global = TemplateRegistry::global();
        assert!(global.contains(OWN_FUNDS));
        assert!(global.contains(CAPITAL_REQUIREMENTS));
        assert!(std::ptr::eq(global, TemplateRegistry::global()));
    }
}
