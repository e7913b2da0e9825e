//! Error types for the audit log
//!
//! Raised when a persisted log is reloaded or re-verified; appends to a live
//! log never fail.

use std::path::PathBuf;

/// Errors raised by audit log persistence and verification
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Entry sequence numbers are not `1, 2, 3, ...`
    #[error("sequence gap: expected {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    /// Hash chain broken at an entry
    #[error("integrity violation at entry {sequence}: {reason}")]
    IntegrityViolation { sequence: u64, reason: String },

    /// Snapshot could not be encoded or decoded
    #[error("audit serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error reading or writing a persisted log
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AuditError {
    /// Create integrity violation for an entry
    pub fn integrity(sequence: u64, reason: impl Into<String>) -> Self {
        Self::IntegrityViolation {
            sequence,
            reason: reason.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the persisted log was tampered with or truncated
    #[inline]
    #[must_use]
    pub fn is_tampering(&self) -> bool {
        matches!(self, Self::SequenceGap { .. } | Self::IntegrityViolation { .. })
    }
}

/// Result type alias for audit operations
pub type AuditResult<T> = Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gap_display() {
        let err = AuditError::SequenceGap { expected: 3, found: 5 };
        assert_eq!(err.to_string(), "sequence gap: expected 3, found 5");
        assert!(err.is_tampering());
    }

    #[test]
    fn serialization_from_json_error() {
        let err: AuditError = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, AuditError::Serialization(_)));
        assert!(!err.is_tampering());
    }
}
