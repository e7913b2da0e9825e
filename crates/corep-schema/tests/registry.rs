use std::sync::Arc;

use corep_schema::{
    builtin, DataType, FieldDefinition, MasterRule, SchemaError, Template, TemplateDefinition,
    TemplateRegistry, CAPITAL_REQUIREMENTS, OWN_FUNDS,
};
use pretty_assertions::assert_eq;

fn leverage() -> Template {
    Template::builder("leverage", "Leverage Ratio", "1.0")
        .field(FieldDefinition::new("Tier1_capital", "Tier 1", DataType::Decimal).required())
        .field(FieldDefinition::new("Exposure_measure", "Exposure", DataType::Decimal).required())
        .field(FieldDefinition::new("Leverage_ratio", "Ratio", DataType::Percentage))
        .rule(MasterRule::parse("LR_001", "Tier1_capital >= Exposure_measure * 0.03").unwrap())
        .build()
        .unwrap()
}

#[test]
fn global_registry_has_builtins_in_order() {
    let listed = TemplateRegistry::global().list_templates();
    assert_eq!(
        &listed[..2],
        &[
            (OWN_FUNDS.to_string(), "Own Funds".to_string()),
            (CAPITAL_REQUIREMENTS.to_string(), "Capital Requirements".to_string()),
        ]
    );
}

#[test]
fn isolated_registries_do_not_share_state() {
    let a = TemplateRegistry::with_builtins();
    let b = TemplateRegistry::with_builtins();
    a.register_template(leverage()).unwrap();

    assert!(a.contains("leverage"));
    assert!(!b.contains("leverage"));
    assert_eq!(a.len(), b.len() + 1);
}

#[test]
fn duplicate_registration_rejected() {
    let registry = TemplateRegistry::new();
    registry.register_template(leverage()).unwrap();
    let err = registry.register_template(leverage()).unwrap_err();
    assert!(matches!(err, SchemaError::DuplicateTemplate(id) if id == "leverage"));
}

#[test]
fn lookups_share_one_template() {
    let registry = TemplateRegistry::with_builtins();
    let first = registry.get_template(OWN_FUNDS).unwrap();
    let second = registry.get_template(OWN_FUNDS).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert!(matches!(registry.get_template("missing"), Err(SchemaError::TemplateNotFound(_))));
}

#[test]
fn builtin_definitions_survive_yaml() {
    for template in builtin::all() {
        let yaml = TemplateDefinition::from(&template).to_yaml().unwrap();
        let rebuilt = TemplateDefinition::from_yaml(&yaml).unwrap().build().unwrap();
        assert_eq!(rebuilt, template);
    }
}

#[test]
fn rule_on_text_field_rejected() {
    let err = Template::builder("t", "T", "1")
        .field(FieldDefinition::new("a", "A", DataType::Decimal))
        .field(FieldDefinition::new("note", "Note", DataType::Text))
        .rule(MasterRule::parse("R", "a == note").unwrap())
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::NonNumericRuleField { field_id, .. } if field_id == "note"));
}
