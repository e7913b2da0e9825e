//! COREP Reporting Core
//!
//! Orchestrates a reporting session: retrieves regulatory rules, maps a data
//! scenario onto a template through a [`FieldMapper`], applies the proposed
//! values, validates them and records every step in the audit log.
//!
//! # Example
//!
//! ```rust
//! use corep_core::{ReportingSession, ScenarioMapper, SessionConfig, StaticRuleSource};
//! use corep_schema::TemplateRegistry;
//! use serde_json::json;
//!
//! let registry = TemplateRegistry::with_builtins();
//! let mut session = ReportingSession::new(SessionConfig::new("own_funds"), &registry).unwrap();
//!
//! let scenario = json!({
//!     "CET1_capital": 1000,
//!     "AT1_capital": 150,
//!     "Tier2_capital": 200,
//!     "Reporting_date": "2024-12-31"
//! });
//! let bundle = session
//!     .process(
//!         "What are our total own funds?",
//!         &scenario,
//!         &StaticRuleSource::with_builtins(),
//!         &ScenarioMapper::new(),
//!     )
//!     .unwrap();
//!
//! assert!(bundle.result.is_valid());
//! assert!(session.audit().verify_integrity().is_ok());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod bundle;
pub mod config;
pub mod error;
pub mod mapper;
pub mod session;
pub mod source;

// Re-exports
pub use bundle::ReportBundle;
pub use config::{SessionConfig, DEFAULT_ACTOR};
pub use error::{CoreError, CoreResult};
pub use mapper::{
    FieldMapper, FieldProposal, MappingProposal, MappingRequest, ScenarioMapper, COPIED_CONFIDENCE,
    DERIVED_CONFIDENCE,
};
pub use session::{ReportingSession, MAPPER_ACTOR};
pub use source::{Citation, RuleSource, StaticRuleSource};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running a reporting session
    pub use crate::{
        Citation, CoreError, FieldMapper, ReportBundle, ReportingSession, RuleSource,
        ScenarioMapper, SessionConfig, StaticRuleSource,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
