//! Audit log entries and their hash chain

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use corep_schema::FieldValue;
use corep_validation::ValidationSummary;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// `prev_hash` of the first entry
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// What an entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    FieldSet,
    ValidationRun,
    RuleCitation,
    RuleRetrieval,
}

impl AuditAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FieldSet => "field_set",
            Self::ValidationRun => "validation_run",
            Self::RuleCitation => "rule_citation",
            Self::RuleRetrieval => "rule_retrieval",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record in the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Position in the log, from 1 and gapless
    pub sequence: u64,
    /// Wall-clock time of the append; advisory only
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    #[serde(default)]
    pub old_value: Option<FieldValue>,
    #[serde(default)]
    pub new_value: Option<FieldValue>,
    #[serde(default)]
    pub references: Vec<String>,
    pub actor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Present on `validation_run` entries only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationSummary>,
    /// Hex SHA-256 of the previous entry
    pub prev_hash: String,
    /// Hex SHA-256 of this entry's content and `prev_hash`
    pub hash: String,
}

/// Entry content before it is sequenced and chained
#[derive(Debug, Clone)]
pub(crate) struct PendingEntry {
    pub(crate) action: AuditAction,
    pub(crate) field_id: Option<String>,
    pub(crate) old_value: Option<FieldValue>,
    pub(crate) new_value: Option<FieldValue>,
    pub(crate) references: Vec<String>,
    pub(crate) actor: String,
    pub(crate) notes: Option<String>,
    pub(crate) validation: Option<ValidationSummary>,
}

impl PendingEntry {
    pub(crate) fn new(action: AuditAction, actor: impl Into<String>) -> Self {
        Self {
            action,
            field_id: None,
            old_value: None,
            new_value: None,
            references: Vec::new(),
            actor: actor.into(),
            notes: None,
            validation: None,
        }
    }

    pub(crate) fn seal(
        self,
        sequence: u64,
        timestamp: DateTime<Utc>,
        prev_hash: &str,
    ) -> AuditLogEntry {
        let mut entry = AuditLogEntry {
            sequence,
            timestamp,
            action: self.action,
            field_id: self.field_id,
            old_value: self.old_value,
            new_value: self.new_value,
            references: self.references,
            actor: self.actor,
            notes: self.notes,
            validation: self.validation,
            prev_hash: prev_hash.to_string(),
            hash: String::new(),
        };
        entry.hash = entry.compute_hash();
        entry
    }
}

impl AuditLogEntry {
    /// Recompute the hash from content and `prev_hash`
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.sequence.to_le_bytes());
        hasher.update(self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true).as_bytes());
        hasher.update([0]);
        hasher.update(self.action.as_str().as_bytes());
        hasher.update([0]);
        hasher.update(self.field_id.as_deref().unwrap_or_default().as_bytes());
        hasher.update([0]);
        update_json(&mut hasher, &self.old_value);
        update_json(&mut hasher, &self.new_value);
        for reference in &self.references {
            hasher.update(reference.as_bytes());
            hasher.update([0]);
        }
        hasher.update([1]);
        hasher.update(self.actor.as_bytes());
        hasher.update([0]);
        hasher.update(self.notes.as_deref().unwrap_or_default().as_bytes());
        hasher.update([0]);
        update_json(&mut hasher, &self.validation);
        hasher.update(self.prev_hash.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Stored hash matches content
    #[inline]
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.hash == self.compute_hash()
    }

    #[inline]
    #[must_use]
    pub fn cites(&self, reference: &str) -> bool {
        self.references.iter().any(|r| r == reference)
    }
}

fn update_json<T: Serialize>(hasher: &mut Sha256, value: &T) {
    // infallible for these types
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    hasher.update(&bytes);
    hasher.update([0]);
}
