//! Reporting session orchestration
//!
//! A [`ReportingSession`] owns one template's payload and audit log and
//! sequences the collaborators: rule retrieval, field mapping, value
//! application and validation. Every step that changes state or produces a
//! verdict is appended to the audit log.

use std::sync::Arc;

use corep_audit::{AuditAction, AuditLog};
use corep_schema::{FieldValue, Payload, Template, TemplateRegistry};
use corep_validation::{ValidationResult, Validator};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::bundle::ReportBundle;
use crate::config::SessionConfig;
use crate::error::{CoreError, CoreResult};
use crate::mapper::{FieldMapper, MappingProposal, MappingRequest};
use crate::source::{Citation, RuleSource};

/// Audit actor for values applied from a mapping proposal
pub const MAPPER_ACTOR: &str = "field_mapper";

/// One report being prepared against one template
#[derive(Debug)]
pub struct ReportingSession {
    config: SessionConfig,
    template: Arc<Template>,
    payload: Payload,
    audit: AuditLog,
    validator: Validator,
}

impl ReportingSession {
    /// Open a session, registering any configured template files first
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] for invalid configuration and
    /// [`CoreError::Schema`] if the template cannot be found or loaded
    pub fn new(config: SessionConfig, registry: &TemplateRegistry) -> CoreResult<Self> {
        config.validate()?;
        config.register_templates(registry)?;
        let template = registry.get_template(&config.template_id)?;
        let audit = AuditLog::new(&config.report_name, template.id(), &config.actor);

        tracing::info!(
            session_id = %audit.header().session_id,
            template_id = template.id(),
            report = %config.report_name,
            "reporting session opened"
        );

        Ok(Self {
            payload: Payload::new(template.id()),
            config,
            template,
            audit,
            validator: Validator::new(),
        })
    }

    /// Continue a session from a persisted audit log
    ///
    /// The payload is rebuilt from the latest value recorded per field; a
    /// recorded clear removes the field.
    ///
    /// # Errors
    /// Returns [`CoreError::TemplateMismatch`] if the log belongs to another
    /// template, otherwise as [`ReportingSession::new`]
    pub fn resume(
        config: SessionConfig,
        registry: &TemplateRegistry,
        audit: AuditLog,
    ) -> CoreResult<Self> {
        if audit.header().template_id != config.template_id {
            return Err(CoreError::TemplateMismatch {
                expected: config.template_id,
                found: audit.header().template_id.clone(),
            });
        }
        let mut session = Self::new(config, registry)?;

        for entry in audit.entries().iter().filter(|e| e.action == AuditAction::FieldSet) {
            let Some(field_id) = &entry.field_id else {
                continue;
            };
            match &entry.new_value {
                Some(value) => {
                    session.payload.set(field_id.clone(), value.clone());
                }
                None => {
                    session.payload.remove(field_id);
                }
            }
        }
        session.audit = audit;

        tracing::info!(
            session_id = %session.session_id(),
            entries = session.audit.len(),
            "reporting session resumed"
        );
        Ok(session)
    }

    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        self.audit.header().session_id
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    #[inline]
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    #[inline]
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Fetch citations and log the retrieval
    ///
    /// Uses the configured rule query, or `question` when none is set.
    pub fn retrieve_rules(&mut self, rules: &dyn RuleSource, question: &str) -> Vec<Citation> {
        let query = if self.config.rule_query.trim().is_empty() {
            question.trim()
        } else {
            self.config.rule_query.as_str()
        };
        let citations = rules.retrieve(self.template.id(), query);
        let references = citations.iter().map(|c| c.reference.clone()).collect();
        self.audit.record_rule_retrieval(query, references);

        tracing::info!(query, found = citations.len(), "regulatory rules retrieved");
        citations
    }

    /// Set a field as the session actor; returns the previous value
    pub fn set_field(
        &mut self,
        field_id: impl Into<String>,
        value: impl Into<FieldValue>,
        references: Vec<String>,
    ) -> Option<FieldValue> {
        let actor = self.config.actor.clone();
        self.set_field_as(field_id, value, references, &actor, None)
    }

    fn set_field_as(
        &mut self,
        field_id: impl Into<String>,
        value: impl Into<FieldValue>,
        references: Vec<String>,
        actor: &str,
        notes: Option<String>,
    ) -> Option<FieldValue> {
        let field_id = field_id.into();
        let value = value.into();
        let old = self.payload.set(field_id.clone(), value.clone());
        self.audit
            .record_field_update(field_id, old.clone(), Some(value), references, actor, notes);
        old
    }

    /// Remove a field as the session actor; returns the previous value
    pub fn clear_field(&mut self, field_id: &str, references: Vec<String>) -> Option<FieldValue> {
        let old = self.payload.remove(field_id);
        self.audit
            .record_field_update(field_id, old.clone(), None, references, &self.config.actor, None);
        old
    }

    /// Record references cited for a field, as the default actor
    pub fn cite(&mut self, field_id: impl Into<String>, references: Vec<String>) -> u64 {
        self.audit.record_rule_citation(field_id, references)
    }

    /// Apply every proposed value with its justification
    ///
    /// # Errors
    /// Returns [`CoreError::TemplateMismatch`] if the proposal targets
    /// another template
    pub fn apply_proposal(&mut self, proposal: &MappingProposal) -> CoreResult<usize> {
        self.ensure_template(&proposal.template_id)?;
        for (field_id, field) in &proposal.fields {
            self.set_field_as(
                field_id.clone(),
                field.value.clone(),
                field.justification.clone(),
                MAPPER_ACTOR,
                Some("proposed by field mapper".to_string()),
            );
        }
        tracing::info!(fields = proposal.fields.len(), "mapping proposal applied");
        Ok(proposal.fields.len())
    }

    /// Validate the session payload and record the run
    pub fn validate(&mut self) -> ValidationResult {
        let result = self.validator.validate(&self.payload, &self.template);
        self.audit.record_validation_run(&result, &self.config.actor);

        if result.is_valid() {
            tracing::info!(completeness = result.completeness(), "payload valid");
        } else {
            for issue in result.field_issues().iter().filter(|i| i.is_error()) {
                tracing::warn!(field_id = %issue.field_id, "{issue}");
            }
            for issue in result.rule_issues().iter().filter(|i| i.is_violation()) {
                tracing::warn!(rule_id = %issue.rule_id, "{issue}");
            }
        }
        result
    }

    /// Validate an external payload against the session template, unrecorded
    ///
    /// # Errors
    /// Returns [`CoreError::TemplateMismatch`] if the payload is bound to
    /// another template
    pub fn check_payload(&self, payload: &Payload) -> CoreResult<ValidationResult> {
        self.ensure_template(payload.template_id())?;
        Ok(self.validator.validate(payload, &self.template))
    }

    /// Retrieve rules, map the scenario, apply, validate and bundle
    ///
    /// # Errors
    /// Returns [`CoreError::Mapper`] if the mapper fails and
    /// [`CoreError::TemplateMismatch`] if its proposal targets another
    /// template
    pub fn process(
        &mut self,
        question: &str,
        scenario: &JsonValue,
        rules: &dyn RuleSource,
        mapper: &dyn FieldMapper,
    ) -> CoreResult<ReportBundle> {
        let span = tracing::info_span!(
            "process",
            session_id = %self.session_id(),
            template_id = self.template.id()
        );
        let _guard = span.enter();

        let citations = self.retrieve_rules(rules, question);

        let proposal = mapper.propose(&MappingRequest {
            question,
            scenario,
            template: &self.template,
            citations: &citations,
        })?;
        for warning in &proposal.warnings {
            tracing::warn!("{warning}");
        }

        self.apply_proposal(&proposal)?;
        let result = self.validate();

        Ok(ReportBundle {
            report_name: self.config.report_name.clone(),
            session_id: self.session_id(),
            template: Template::clone(&self.template),
            payload: self.payload.clone(),
            result,
            confidence: proposal.confidence(),
            warnings: proposal.warnings,
            citations,
            audit: self.audit.export_snapshot(),
        })
    }

    fn ensure_template(&self, template_id: &str) -> CoreResult<()> {
        if template_id == self.template.id() {
            Ok(())
        } else {
            Err(CoreError::TemplateMismatch {
                expected: self.template.id().to_string(),
                found: template_id.to_string(),
            })
        }
    }
}
