//! Built-in COREP templates
//!
//! Own Funds and Capital Requirements, registered by
//! [`TemplateRegistry::with_builtins`](crate::TemplateRegistry::with_builtins).

use crate::field::{FieldDefinition, NumericRange};
use crate::formula::{Expr, Formula};
use crate::template::{MasterRule, Template};
use crate::value::DataType;

/// Registry id of the Own Funds template
pub const OWN_FUNDS: &str = "own_funds";

/// Registry id of the Capital Requirements template
pub const CAPITAL_REQUIREMENTS: &str = "capital_requirements";

fn capital_amount(id: &str, name: &str, reference: &str) -> FieldDefinition {
    FieldDefinition::new(id, name, DataType::Decimal)
        .required()
        .with_range(NumericRange::at_least(0.0))
        .with_reference(reference)
}

/// COREP Own Funds (C 01.00)
#[must_use]
pub fn own_funds() -> Template {
    Template::builder(OWN_FUNDS, "Own Funds", "1.0")
        .description("COREP Own Funds template for reporting total capital")
        .field(
            capital_amount("CET1_capital", "Common Equity Tier 1 (CET1) Capital", "CRR Article 50")
                .with_description(
                    "Total CET1 capital including share capital and retained earnings",
                )
                .with_instructions("Sum of eligible common equity tier 1 items"),
        )
        .field(
            capital_amount("AT1_capital", "Additional Tier 1 (AT1) Capital", "CRR Article 51")
                .with_description("Additional Tier 1 capital instruments")
                .with_instructions("Eligible AT1 instruments meeting CRR criteria"),
        )
        .field(
            capital_amount("Tier1_capital", "Tier 1 Capital Total", "CRR Article 25")
                .with_description("Total Tier 1 capital (CET1 + AT1)")
                .with_instructions("Calculated field: CET1_capital + AT1_capital"),
        )
        .field(
            capital_amount("Tier2_capital", "Tier 2 (T2) Capital", "CRR Article 62")
                .with_description("Tier 2 subordinated capital")
                .with_instructions("Eligible Tier 2 instruments"),
        )
        .field(
            capital_amount("Total_own_funds", "Total Own Funds", "CRR Article 72")
                .with_description("Total capital resources of the institution")
                .with_instructions("Calculated field: Tier1_capital + Tier2_capital"),
        )
        .field(
            FieldDefinition::new("Reporting_date", "Reporting Date", DataType::Date)
                .required()
                .with_description("Date of the reporting period")
                .with_instructions("End of quarter date in ISO format (YYYY-MM-DD)")
                .with_reference("COREP ITS"),
        )
        .rule(
            MasterRule::new(
                "MR_001",
                Formula::equals("Tier1_capital", Expr::sum(["CET1_capital", "AT1_capital"])),
            )
            .with_description("Tier 1 total must equal the sum of CET1 and AT1"),
        )
        .rule(
            MasterRule::new(
                "MR_002",
                Formula::equals("Total_own_funds", Expr::sum(["Tier1_capital", "Tier2_capital"])),
            )
            .with_description("Total own funds must equal Tier 1 plus Tier 2"),
        )
        .build()
        .unwrap_or_else(|e| unreachable!("built-in own funds template is invalid: {e}"))
}

/// COREP Capital Requirements (Pillar 1)
#[must_use]
pub fn capital_requirements() -> Template {
    Template::builder(CAPITAL_REQUIREMENTS, "Capital Requirements", "1.0")
        .description("COREP Capital Requirements template")
        .field(
            capital_amount("Credit_risk_requirement", "Pillar 1 - Credit Risk", "CRR Part 3")
                .with_description("Capital requirement for credit risk")
                .with_instructions("Capital requirement for all credit exposures"),
        )
        .field(
            capital_amount("Market_risk_requirement", "Pillar 1 - Market Risk", "CRR Part 3")
                .with_description("Capital requirement for market risk")
                .with_instructions("Capital requirement for trading book exposures"),
        )
        .field(
            capital_amount(
                "Operational_risk_requirement",
                "Pillar 1 - Operational Risk",
                "CRR Part 3",
            )
            .with_description("Capital requirement for operational risk"),
        )
        .field(
            capital_amount(
                "Total_pillar1_requirement",
                "Total Pillar 1 Capital Requirement",
                "CRR Article 92",
            )
            .with_description("Sum of all Pillar 1 requirements")
            .with_instructions(
                "Calculated: Credit_risk_requirement + Market_risk_requirement \
                 + Operational_risk_requirement",
            ),
        )
        .rule(
            MasterRule::new(
                "MR_101",
                Formula::equals(
                    "Total_pillar1_requirement",
                    Expr::sum([
                        "Credit_risk_requirement",
                        "Market_risk_requirement",
                        "Operational_risk_requirement",
                    ]),
                ),
            )
            .with_description("Total Pillar 1 requirement must equal the sum of its components"),
        )
        .build()
        .unwrap_or_else(|e| unreachable!("built-in capital requirements template is invalid: {e}"))
}

/// All built-in templates in registration order
#[must_use]
pub fn all() -> Vec<Template> {
    vec![own_funds(), capital_requirements()]
}
