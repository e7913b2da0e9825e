//! Error types for reporting sessions
//!
//! Wraps registry and audit failures and adds the session's own: mapper
//! failures, configuration problems, file access and template mismatches.
//! Invalid report data is never an error here; it ends up in the
//! validation result.

use std::path::PathBuf;

use corep_audit::AuditError;
use corep_schema::SchemaError;

/// Main session error type
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Template lookup or definition failed
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Audit log could not be persisted or reloaded
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),

    /// Session output could not be encoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Field mapper could not produce a proposal
    #[error("mapper failed: {0}")]
    Mapper(String),

    /// Session configuration is invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error on a session file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Payload or proposal bound to a different template
    #[error("template mismatch: session uses '{expected}', got '{found}'")]
    TemplateMismatch { expected: String, found: String },
}

impl CoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create mapper error
    pub fn mapper(message: impl Into<String>) -> Self {
        Self::Mapper(message.into())
    }
}

/// Result type alias for session operations
pub type CoreResult<T> = Result<T, CoreError>;
