//! Testing utilities for the COREP workspace
//!
//! Shared payload fixtures and scenario documents.

#![allow(missing_docs)]

use corep_schema::{
    DataType, FieldDefinition, MasterRule, NumericRange, Payload, Template, CAPITAL_REQUIREMENTS,
    OWN_FUNDS,
};
use serde_json::{json, Value as JsonValue};

pub const REPORTING_DATE: &str = "2024-12-31";

/// Own Funds payload from the three capital components, with consistent totals
pub fn own_funds_payload_with(cet1: f64, at1: f64, tier2: f64) -> Payload {
    Payload::new(OWN_FUNDS)
        .with("CET1_capital", cet1)
        .with("AT1_capital", at1)
        .with("Tier1_capital", cet1 + at1)
        .with("Tier2_capital", tier2)
        .with("Total_own_funds", cet1 + at1 + tier2)
        .with("Reporting_date", REPORTING_DATE)
}

/// Complete, consistent Own Funds payload (CET1 1000, AT1 150, Tier 2 200)
pub fn own_funds_payload() -> Payload {
    own_funds_payload_with(1000.0, 150.0, 200.0)
}

/// Complete, consistent Capital Requirements payload
pub fn capital_requirements_payload() -> Payload {
    Payload::new(CAPITAL_REQUIREMENTS)
        .with("Credit_risk_requirement", 800.0)
        .with("Market_risk_requirement", 120.0)
        .with("Operational_risk_requirement", 80.0)
        .with("Total_pillar1_requirement", 1000.0)
}

/// Raw scenario as a mapper receives it
pub fn own_funds_scenario() -> JsonValue {
    json!({
        "CET1_capital": 1000,
        "AT1_capital": 150,
        "Tier2_capital": 200,
        "Reporting_date": REPORTING_DATE,
    })
}

/// Small template exercising every data type
pub fn mixed_template() -> Template {
    Template::builder("mixed", "Mixed", "1.0")
        .description("All data types")
        .field(
            FieldDefinition::new("total", "Total", DataType::Decimal)
                .required()
                .with_range(NumericRange::at_least(0.0)),
        )
        .field(FieldDefinition::new("part_a", "Part A", DataType::Integer).required())
        .field(FieldDefinition::new("part_b", "Part B", DataType::Decimal).required())
        .field(FieldDefinition::new("ratio", "Ratio", DataType::Percentage))
        .field(FieldDefinition::new("as_of", "As of", DataType::Date).required())
        .field(
            FieldDefinition::new("basis", "Basis", DataType::Text)
                .with_allowed_values(["solo", "consolidated"]),
        )
        .field(FieldDefinition::new("audited", "Audited", DataType::Boolean))
        .rule(MasterRule::parse("MX_001", "total == part_a + part_b").unwrap())
        .build()
        .unwrap()
}

/// Valid payload for [`mixed_template`]
pub fn mixed_payload() -> Payload {
    Payload::new("mixed")
        .with("total", 30.0)
        .with("part_a", 10_i64)
        .with("part_b", 20.0)
        .with("ratio", "12.5%")
        .with("as_of", REPORTING_DATE)
        .with("basis", "solo")
        .with("audited", true)
}
