//! COREP Audit Log
//!
//! Append-only, sequence-numbered and SHA-256 hash-chained record of what a
//! reporting session did: field updates, validation runs, rule citations and
//! rule retrievals.
//!
//! # Example
//!
//! ```rust
//! use corep_audit::AuditLog;
//! use corep_schema::FieldValue;
//!
//! let mut log = AuditLog::new("Q4 own funds", "own_funds", "system");
//! log.record_field_update(
//!     "CET1_capital",
//!     None,
//!     Some(FieldValue::Decimal(1000.0)),
//!     vec!["CRR Art. 26".to_string()],
//!     "analyst",
//!     None,
//! );
//!
//! let reloaded = AuditLog::from_json(&log.to_json().unwrap()).unwrap();
//! assert_eq!(reloaded.field_history("CET1_capital").len(), 1);
//! assert_eq!(reloaded.rule_usage_counts()["CRR Art. 26"], 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod entry;
pub mod error;
pub mod log;

// Re-exports
pub use entry::{AuditAction, AuditLogEntry, GENESIS_HASH};
pub use error::{AuditError, AuditResult};
pub use log::{AuditHeader, AuditLog, AuditSnapshot, ValidationTotals};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
