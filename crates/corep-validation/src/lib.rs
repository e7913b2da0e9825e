//! COREP Validation Engine
//!
//! Checks a [`Payload`](corep_schema::Payload) against a
//! [`Template`](corep_schema::Template): field-level validation, master-rule
//! consistency and data-quality diagnostics.
//!
//! Invalid data is reported, not raised: every check returns the full list
//! of issues it found.
//!
//! # Example
//!
//! ```rust
//! use corep_schema::{builtin, Payload};
//! use corep_validation::Validator;
//!
//! let template = builtin::own_funds();
//! let payload = Payload::new("own_funds")
//!     .with("CET1_capital", 1000.0)
//!     .with("AT1_capital", 150.0)
//!     .with("Tier1_capital", 1200.0)
//!     .with("Tier2_capital", 200.0)
//!     .with("Total_own_funds", 1400.0)
//!     .with("Reporting_date", "2024-12-31");
//!
//! let result = Validator::new().validate(&payload, &template);
//! assert!(!result.is_valid());
//! assert_eq!(result.rule_issues()[0].discrepancy().unwrap().absolute, 50.0);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod field;
pub mod issue;
pub mod quality;
pub mod result;
pub mod rules;

// Re-exports
pub use field::FieldValidator;
pub use issue::{Discrepancy, FieldIssue, FieldIssueKind, RuleIssue, RuleIssueKind, Severity};
pub use quality::{DataQualityDetector, QualityReport};
pub use result::{FieldStatus, ValidationResult, ValidationSummary, Validator};
pub use rules::{MasterRuleChecker, RuleEvaluation, RuleOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for validation
    pub use crate::{
        DataQualityDetector, FieldIssue, FieldValidator, MasterRuleChecker, RuleIssue,
        ValidationResult, Validator,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
