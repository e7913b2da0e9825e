//! Append-only audit log
//!
//! Entries are sequenced by the log itself and chained by SHA-256 hash. Two
//! indices are kept current on every append and rebuilt on reload: entry
//! positions per field id, and usage counts per reference string.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use corep_schema::FieldValue;
use corep_validation::{ValidationResult, ValidationSummary};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::entry::{AuditAction, AuditLogEntry, PendingEntry, GENESIS_HASH};
use crate::error::{AuditError, AuditResult};

/// Session metadata carried with the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditHeader {
    pub session_id: Uuid,
    pub report_name: String,
    pub template_id: String,
    pub created_at: DateTime<Utc>,
    /// Actor used when an operation names none
    pub default_actor: String,
}

impl AuditHeader {
    /// Hex SHA-256 of the header, seeded with [`GENESIS_HASH`]
    ///
    /// This is the `prev_hash` of the first entry, so editing the header
    /// breaks the chain.
    #[must_use]
    pub fn digest(&self) -> String {
        let created_at = self.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true);
        let mut hasher = Sha256::new();
        hasher.update(GENESIS_HASH.as_bytes());
        hasher.update(self.session_id.as_bytes());
        for part in [
            self.report_name.as_str(),
            self.template_id.as_str(),
            created_at.as_str(),
            self.default_actor.as_str(),
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0]);
        }
        hex::encode(hasher.finalize())
    }
}

/// Persisted form of a log: header plus ordered entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditSnapshot {
    pub header: AuditHeader,
    pub entries: Vec<AuditLogEntry>,
}

impl AuditSnapshot {
    /// Pretty-printed JSON
    ///
    /// # Errors
    /// Returns [`AuditError::Serialization`] if encoding fails
    pub fn to_json(&self) -> AuditResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode without verifying the chain
    ///
    /// # Errors
    /// Returns [`AuditError::Serialization`] on malformed JSON
    pub fn from_json(json: &str) -> AuditResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Totals over every recorded validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationTotals {
    pub runs: usize,
    pub passed: usize,
    pub failed: usize,
    pub rules_violated: usize,
    pub rules_skipped: usize,
    /// Summary of the most recent run
    pub latest: Option<ValidationSummary>,
}

/// Append-only, hash-chained session log
#[derive(Debug, Clone)]
pub struct AuditLog {
    header: AuditHeader,
    anchor: String,
    entries: Vec<AuditLogEntry>,
    by_field: HashMap<String, Vec<usize>>,
    reference_counts: BTreeMap<String, u64>,
}

impl AuditLog {
    /// Create empty log for a new session
    pub fn new(
        report_name: impl Into<String>,
        template_id: impl Into<String>,
        default_actor: impl Into<String>,
    ) -> Self {
        let header = AuditHeader {
            session_id: Uuid::new_v4(),
            report_name: report_name.into(),
            template_id: template_id.into(),
            created_at: Utc::now(),
            default_actor: default_actor.into(),
        };
        tracing::debug!(
            session_id = %header.session_id,
            report = %header.report_name,
            "audit log opened"
        );
        Self {
            anchor: header.digest(),
            header,
            entries: Vec::new(),
            by_field: HashMap::new(),
            reference_counts: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn header(&self) -> &AuditHeader {
        &self.header
    }

    /// All entries in append order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[AuditLogEntry] {
        &self.entries
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hash of the newest entry, the header digest when empty
    #[must_use]
    pub fn head_hash(&self) -> &str {
        self.entries.last().map_or(self.anchor.as_str(), |e| e.hash.as_str())
    }

    /// Record a field value change; returns the entry's sequence
    pub fn record_field_update(
        &mut self,
        field_id: impl Into<String>,
        old_value: Option<FieldValue>,
        new_value: Option<FieldValue>,
        references: Vec<String>,
        actor: impl Into<String>,
        notes: Option<String>,
    ) -> u64 {
        let mut pending = PendingEntry::new(AuditAction::FieldSet, actor);
        pending.field_id = Some(field_id.into());
        pending.old_value = old_value;
        pending.new_value = new_value;
        pending.references = references;
        pending.notes = notes;
        self.append(pending)
    }

    /// Record one validation run as a single summary entry
    pub fn record_validation_run(
        &mut self,
        result: &ValidationResult,
        actor: impl Into<String>,
    ) -> u64 {
        let summary = result.summary();
        let notes = if summary.is_valid {
            "validation passed".to_string()
        } else {
            format!(
                "validation failed: {} field(s) failed, {} rule(s) violated",
                summary.fields_failed, summary.rules_violated
            )
        };

        let mut pending = PendingEntry::new(AuditAction::ValidationRun, actor);
        pending.notes = Some(notes);
        pending.validation = Some(summary);
        self.append(pending)
    }

    /// Record regulatory references cited for a field, as the default actor
    pub fn record_rule_citation(
        &mut self,
        field_id: impl Into<String>,
        references: Vec<String>,
    ) -> u64 {
        let mut pending =
            PendingEntry::new(AuditAction::RuleCitation, self.header.default_actor.clone());
        pending.field_id = Some(field_id.into());
        pending.references = references;
        self.append(pending)
    }

    /// Record a rule lookup and the references it returned
    pub fn record_rule_retrieval(
        &mut self,
        query: impl Into<String>,
        references: Vec<String>,
    ) -> u64 {
        let mut pending =
            PendingEntry::new(AuditAction::RuleRetrieval, self.header.default_actor.clone());
        pending.notes = Some(query.into());
        pending.references = references;
        self.append(pending)
    }

    fn append(&mut self, pending: PendingEntry) -> u64 {
        let sequence = self.entries.len() as u64 + 1;
        let entry = pending.seal(sequence, Utc::now(), self.head_hash());
        tracing::debug!(
            sequence,
            action = %entry.action,
            field_id = ?entry.field_id,
            "audit entry appended"
        );
        self.index(self.entries.len(), &entry);
        self.entries.push(entry);
        sequence
    }

    fn index(&mut self, position: usize, entry: &AuditLogEntry) {
        if let Some(field_id) = &entry.field_id {
            self.by_field.entry(field_id.clone()).or_default().push(position);
        }
        for reference in &entry.references {
            *self.reference_counts.entry(reference.clone()).or_insert(0) += 1;
        }
    }

    /// Entries touching a field, oldest first
    #[must_use]
    pub fn field_history(&self, field_id: &str) -> Vec<&AuditLogEntry> {
        self.by_field
            .get(field_id)
            .map(|positions| positions.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Times each reference appeared across all entries
    #[must_use]
    pub fn rule_usage_counts(&self) -> BTreeMap<String, u64> {
        self.reference_counts.clone()
    }

    /// Most used references, ties broken by name
    #[must_use]
    pub fn top_references(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(String, u64)> = self
            .reference_counts
            .iter()
            .map(|(reference, count)| (reference.clone(), *count))
            .collect();
        // BTreeMap order already sorts names; a stable sort keeps it for ties
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Totals across recorded validation runs
    #[must_use]
    pub fn validation_summary(&self) -> ValidationTotals {
        self.entries
            .iter()
            .filter_map(|e| e.validation.as_ref())
            .fold(ValidationTotals::default(), |mut totals, summary| {
                totals.runs += 1;
                if summary.is_valid {
                    totals.passed += 1;
                } else {
                    totals.failed += 1;
                }
                totals.rules_violated += summary.rules_violated;
                totals.rules_skipped += summary.rules_skipped;
                totals.latest = Some(summary.clone());
                totals
            })
    }

    /// Re-check sequence numbers and the hash chain
    ///
    /// # Errors
    /// Returns [`AuditError::SequenceGap`] or [`AuditError::IntegrityViolation`]
    /// at the first bad entry
    pub fn verify_integrity(&self) -> AuditResult<()> {
        verify_chain(&self.anchor, &self.entries)
    }

    /// Copy of header and entries for persistence
    #[must_use]
    pub fn export_snapshot(&self) -> AuditSnapshot {
        AuditSnapshot {
            header: self.header.clone(),
            entries: self.entries.clone(),
        }
    }

    /// Pretty-printed JSON snapshot
    ///
    /// # Errors
    /// Returns [`AuditError::Serialization`] if encoding fails
    pub fn to_json(&self) -> AuditResult<String> {
        self.export_snapshot().to_json()
    }

    /// Rebuild a log from a snapshot, verifying it first
    ///
    /// # Errors
    /// Returns [`AuditError::SequenceGap`] or [`AuditError::IntegrityViolation`]
    /// if the snapshot's header or entries were altered
    pub fn from_snapshot(snapshot: AuditSnapshot) -> AuditResult<Self> {
        let anchor = snapshot.header.digest();
        verify_chain(&anchor, &snapshot.entries)?;

        let mut log = Self {
            header: snapshot.header,
            anchor,
            entries: Vec::with_capacity(snapshot.entries.len()),
            by_field: HashMap::new(),
            reference_counts: BTreeMap::new(),
        };
        for entry in snapshot.entries {
            log.index(log.entries.len(), &entry);
            log.entries.push(entry);
        }

        tracing::debug!(
            session_id = %log.header.session_id,
            entries = log.len(),
            "audit log reloaded"
        );
        Ok(log)
    }

    /// Decode and verify a JSON snapshot
    ///
    /// # Errors
    /// Returns [`AuditError::Serialization`] on malformed JSON, or a chain
    /// error as [`AuditLog::from_snapshot`]
    pub fn from_json(json: &str) -> AuditResult<Self> {
        Self::from_snapshot(AuditSnapshot::from_json(json)?)
    }

    /// Write the JSON snapshot to a file
    ///
    /// # Errors
    /// Returns [`AuditError::Io`] if the file cannot be written
    pub fn save(&self, path: impl AsRef<Path>) -> AuditResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?).map_err(|e| AuditError::io_error(path, e))
    }

    /// Read and verify a JSON snapshot file
    ///
    /// # Errors
    /// Returns [`AuditError::Io`] if the file cannot be read, otherwise as
    /// [`AuditLog::from_json`]
    pub fn load(path: impl AsRef<Path>) -> AuditResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| AuditError::io_error(path, e))?;
        Self::from_json(&json)
    }
}

fn verify_chain(anchor: &str, entries: &[AuditLogEntry]) -> AuditResult<()> {
    let mut prev = anchor;
    for (expected, entry) in (1_u64..).zip(entries) {
        if entry.sequence != expected {
            return Err(AuditError::SequenceGap {
                expected,
                found: entry.sequence,
            });
        }
        if entry.prev_hash != prev {
            let reason = if expected == 1 {
                "header digest mismatch"
            } else {
                "previous hash mismatch"
            };
            return Err(AuditError::integrity(entry.sequence, reason));
        }
        if !entry.is_sealed() {
            return Err(AuditError::integrity(entry.sequence, "content hash mismatch"));
        }
        prev = &entry.hash;
    }
    Ok(())
}
