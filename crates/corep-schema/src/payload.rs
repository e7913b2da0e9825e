//! Report payloads
//!
//! A [`Payload`] maps field ids to [`FieldValue`]s for exactly one template.
//! It is supplied per validation call and never persisted by the core.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::SchemaError;
use crate::value::FieldValue;

/// Field values bound to one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    template_id: String,
    values: IndexMap<String, FieldValue>,
}

impl Payload {
    /// Create empty payload for a template
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            values: IndexMap::new(),
        }
    }

    /// Build from a plain JSON object (`{"field": value, ...}`)
    ///
    /// # Errors
    /// Returns [`SchemaError::InvalidPayload`] if `json` is not an object
    pub fn from_json(
        template_id: impl Into<String>,
        json: &JsonValue,
    ) -> Result<Self, SchemaError> {
        let object = json
            .as_object()
            .ok_or_else(|| {
                SchemaError::InvalidPayload(format!("expected JSON object, got {json}"))
            })?;
        let mut payload = Self::new(template_id);
        for (id, value) in object {
            payload.set(id.clone(), FieldValue::from_json(value));
        }
        Ok(payload)
    }

    /// Plain JSON object of the values (untagged)
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.values
                .iter()
                .map(|(id, value)| (id.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(id, value);
        self
    }

    #[inline]
    #[must_use]
    pub fn template_id(&self) -> &str {
        &self.template_id
    }

    /// Set a value, returning the previous one
    pub fn set(
        &mut self,
        id: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.values.insert(id.into(), value.into())
    }

    /// Remove a value, keeping the order of the rest
    pub fn remove(&mut self, id: &str) -> Option<FieldValue> {
        self.values.shift_remove(id)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.values.get(id)
    }

    /// Present and not empty
    #[inline]
    #[must_use]
    pub fn is_populated(&self, id: &str) -> bool {
        self.get(id).is_some_and(|v| !v.is_empty())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(id, value)| (id.as_str(), value))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
