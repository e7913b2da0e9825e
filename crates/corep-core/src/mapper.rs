//! Field mapping collaborators
//!
//! A [`FieldMapper`] turns a question and a data scenario into proposed
//! field values. In production this is an LLM call; [`ScenarioMapper`] is
//! the deterministic stand-in.

use std::collections::HashMap;

use corep_schema::{Comparator, FieldValue, Template};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{CoreError, CoreResult};
use crate::source::Citation;

/// Confidence given to values copied from the scenario
pub const COPIED_CONFIDENCE: f64 = 0.9;

/// Confidence given to totals derived from master rules
pub const DERIVED_CONFIDENCE: f64 = 0.95;

/// Everything a mapper sees for one request
#[derive(Debug, Clone, Copy)]
pub struct MappingRequest<'a> {
    pub question: &'a str,
    pub scenario: &'a JsonValue,
    pub template: &'a Template,
    pub citations: &'a [Citation],
}

/// Proposed value for one field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProposal {
    pub value: FieldValue,
    /// Mapper's own confidence in `0..=1`; passed through untouched
    pub confidence: f64,
    /// Regulatory references supporting the value
    pub justification: Vec<String>,
}

/// Mapper output for one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingProposal {
    pub template_id: String,
    pub fields: IndexMap<String, FieldProposal>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl MappingProposal {
    /// Create empty proposal
    pub fn new(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            fields: IndexMap::new(),
            warnings: Vec::new(),
        }
    }

    /// Confidence per proposed field
    #[must_use]
    pub fn confidence(&self) -> IndexMap<String, f64> {
        self.fields
            .iter()
            .map(|(id, proposal)| (id.clone(), proposal.confidence))
            .collect()
    }
}

/// Produces field proposals for a reporting request
pub trait FieldMapper {
    /// Propose values for the request's template
    ///
    /// # Errors
    /// Returns [`CoreError::Mapper`] if no proposal can be produced
    fn propose(&self, request: &MappingRequest<'_>) -> CoreResult<MappingProposal>;
}

/// Deterministic mapper over a JSON scenario
///
/// Scenario keys matching a field id (case-insensitively) are copied; the
/// targets of equality master rules missing from the scenario are derived
/// from their expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioMapper;

impl ScenarioMapper {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn lookup<'s>(
        scenario: &'s serde_json::Map<String, JsonValue>,
        field_id: &str,
    ) -> Option<&'s JsonValue> {
        scenario.get(field_id).or_else(|| {
            scenario
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(field_id))
                .map(|(_, value)| value)
        })
    }
}

impl FieldMapper for ScenarioMapper {
    fn propose(&self, request: &MappingRequest<'_>) -> CoreResult<MappingProposal> {
        let template = request.template;
        let scenario = request
            .scenario
            .as_object()
            .ok_or_else(|| {
                CoreError::mapper(format!(
                    "scenario must be a JSON object, got {}",
                    request.scenario
                ))
            })?;

        let mut found: HashMap<&str, FieldProposal> = HashMap::new();
        let mut warnings = Vec::new();
        for def in template.fields() {
            let Some(value) = Self::lookup(scenario, &def.id).map(FieldValue::from_json) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            found.insert(
                &def.id,
                FieldProposal {
                    value,
                    confidence: COPIED_CONFIDENCE,
                    justification: def.references.clone(),
                },
            );
        }

        for rule in template.rules() {
            let target = rule.formula.target();
            if rule.formula.comparator() != Comparator::Eq || found.contains_key(target) {
                continue;
            }
            let numbers: HashMap<&str, f64> = found
                .iter()
                .filter_map(|(id, proposal)| {
                    let def = template.field(id)?;
                    let n = proposal.value.coerce(def.data_type)?.as_number()?;
                    Some((*id, n))
                })
                .collect();
            let Some(computed) = rule.formula.expression().evaluate(&numbers) else {
                continue;
            };
            let Some(def) = template.field(target) else {
                continue;
            };
            if !computed.is_finite() {
                tracing::warn!(
                    field_id = target,
                    rule_id = %rule.id,
                    "derived value is not finite"
                );
                warnings.push(format!(
                    "{} could not be derived from {}: result is not a finite number",
                    def.id, rule.id
                ));
                continue;
            }
            let mut justification = def.references.clone();
            justification.push(rule.id.clone());
            tracing::debug!(
                field_id = target,
                computed,
                rule_id = %rule.id,
                "derived field from master rule"
            );
            found.insert(
                &def.id,
                FieldProposal {
                    value: FieldValue::Decimal(computed),
                    confidence: DERIVED_CONFIDENCE,
                    justification,
                },
            );
        }

        let mut proposal = MappingProposal::new(template.id());
        proposal.warnings = warnings;
        for def in template.fields() {
            match found.remove(def.id.as_str()) {
                Some(field) => {
                    proposal.fields.insert(def.id.clone(), field);
                }
                None if def.required => {
                    proposal.warnings.push(format!("no value found for required field {}", def.id));
                }
                None => {}
            }
        }

        Ok(proposal)
    }
}
