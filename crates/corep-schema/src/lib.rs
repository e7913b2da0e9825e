//! COREP Schema Registry
//!
//! Reporting templates, their field definitions and master rules, and the
//! typed values payloads are made of.
//!
//! # Core Concepts
//!
//! - [`Template`]: named, versioned set of [`FieldDefinition`]s plus [`MasterRule`]s
//! - [`TemplateRegistry`]: id → template lookup, process-wide or isolated
//! - [`FieldValue`]: tagged union over the supported [`DataType`]s
//! - [`Formula`]: `target <cmp> expression`, parsed once into an [`Expr`] tree
//! - [`Payload`]: field values submitted for one template
//!
//! # Example
//!
//! ```rust
//! use corep_schema::{TemplateRegistry, OWN_FUNDS};
//!
//! let registry = TemplateRegistry::with_builtins();
//! let template = registry.get_template(OWN_FUNDS).unwrap();
//!
//! assert_eq!(template.name(), "Own Funds");
//! assert!(template.field("CET1_capital").unwrap().required);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod builtin;
pub mod definition;
pub mod error;
pub mod field;
pub mod formula;
pub mod payload;
pub mod registry;
pub mod template;
pub mod value;

// Re-exports
pub use builtin::{CAPITAL_REQUIREMENTS, OWN_FUNDS};
pub use definition::TemplateDefinition;
pub use error::{SchemaError, SchemaResult};
pub use field::{FieldDefinition, NumericRange};
pub use formula::{Comparator, Expr, Formula};
pub use payload::Payload;
pub use registry::TemplateRegistry;
pub use template::{MasterRule, Template, TemplateBuilder, DEFAULT_TOLERANCE};
pub use value::{DataType, FieldValue};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for schema work
    pub use crate::{
        DataType, FieldDefinition, FieldValue, Formula, MasterRule, NumericRange, Payload,
        SchemaError, Template, TemplateRegistry,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
