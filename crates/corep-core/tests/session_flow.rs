//! End-to-end reporting sessions

use corep_audit::{AuditAction, AuditLog};
use corep_core::{
    CoreError, ReportingSession, ScenarioMapper, SessionConfig, StaticRuleSource,
    DERIVED_CONFIDENCE,
};
use corep_schema::{FieldValue, SchemaError, TemplateRegistry};
use corep_test_utils::own_funds_scenario;
use corep_validation::{FieldIssueKind, RuleOutcome};
use pretty_assertions::assert_eq;
use serde_json::json;

const LEVERAGE_YAML: &str = r#"
id: leverage
name: Leverage Ratio
version: "1.0"
fields:
  - id: Tier1_capital
    name: Tier 1 capital
    data_type: decimal
    required: true
    range: { min: 0 }
  - id: Exposure_measure
    name: Total exposure measure
    data_type: decimal
    required: true
  - id: Headroom
    name: Tier 1 above minimum
    data_type: decimal
rules:
  - id: LR_001
    formula: "Headroom == Tier1_capital - Exposure_measure * 0.03"
"#;

fn run(scenario: &serde_json::Value) -> (ReportingSession, corep_core::ReportBundle) {
    let config = SessionConfig::new("own_funds")
        .with_report_name("Own Funds Q4 2024")
        .with_rule_query("capital");
    let mut session = ReportingSession::new(config, &TemplateRegistry::with_builtins()).unwrap();
    let bundle = session
        .process(
            "Please calculate the total own funds for Q4 2024",
            scenario,
            &StaticRuleSource::with_builtins(),
            &ScenarioMapper::new(),
        )
        .unwrap();
    (session, bundle)
}

#[test]
fn consistent_scenario_produces_valid_bundle() {
    let (session, bundle) = run(&own_funds_scenario());

    assert!(bundle.result.is_valid());
    assert_eq!(bundle.result.completeness(), 1.0);
    assert_eq!(bundle.result.consistency(), 1.0);
    assert_eq!(bundle.confidence["Total_own_funds"], DERIVED_CONFIDENCE);
    assert_eq!(bundle.payload.get("Tier1_capital"), Some(&FieldValue::Decimal(1150.0)));

    let counts = session.audit().rule_usage_counts();
    // once from retrieval, once from the field update's justification
    assert_eq!(counts["CRR Article 50"], 2);
    assert_eq!(session.audit().validation_summary().passed, 1);
}

#[test]
fn overstated_tier1_is_single_violation() {
    let mut scenario = own_funds_scenario();
    scenario["Tier1_capital"] = json!(1200);
    let (_, bundle) = run(&scenario);

    let issues = bundle.result.rule_issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].rule_id, "MR_001");
    assert_eq!(issues[0].discrepancy().unwrap().absolute, 50.0);
    assert!(matches!(bundle.result.rule_evaluations()[1].outcome, RuleOutcome::Satisfied { .. }));
}

#[test]
fn missing_at1_is_reported_once() {
    let mut scenario = own_funds_scenario();
    scenario.as_object_mut().unwrap().remove("AT1_capital");
    let (session, bundle) = run(&scenario);

    let missing: Vec<_> = bundle
        .result
        .field_issues()
        .iter()
        .filter(|i| i.kind == FieldIssueKind::MissingRequiredField)
        .map(|i| i.field_id.as_str())
        .collect();
    assert_eq!(missing, vec!["AT1_capital", "Tier1_capital", "Total_own_funds"]);
    assert!(bundle.warnings.iter().any(|w| w.contains("AT1_capital")));
    assert!(session.audit().field_history("AT1_capital").is_empty());
}

#[test]
fn audit_persists_and_session_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.json");

    let (session, _) = run(&own_funds_scenario());
    session.audit().save(&path).unwrap();

    let log = AuditLog::load(&path).unwrap();
    let registry = TemplateRegistry::with_builtins();
    let mut resumed =
        ReportingSession::resume(SessionConfig::new("own_funds"), &registry, log).unwrap();
    assert_eq!(resumed.session_id(), session.session_id());
    assert_eq!(resumed.payload(), session.payload());

    resumed.set_field("Tier2_capital", 250.0, vec!["CRR Article 62".into()]);
    let result = resumed.validate();
    assert!(!result.is_valid());

    let entries = resumed.audit().entries();
    assert_eq!(entries.last().unwrap().action, AuditAction::ValidationRun);
    assert!(resumed.audit().verify_integrity().is_ok());
    assert_eq!(resumed.audit().validation_summary().runs, 2);
}

#[test]
fn resume_rejects_other_template() {
    let (session, _) = run(&own_funds_scenario());
    let log = session.audit().clone();
    let err = ReportingSession::resume(
        SessionConfig::new("capital_requirements"),
        &TemplateRegistry::with_builtins(),
        log,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::TemplateMismatch { .. }));
}

#[test]
fn config_file_registers_extra_templates() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("leverage.yaml"), LEVERAGE_YAML).unwrap();
    let config_path = dir.path().join("session.toml");
    std::fs::write(
        &config_path,
        "report_name = \"Leverage Q4\"\n\
         template_id = \"leverage\"\n\
         actor = \"analyst\"\n\
         template_files = [\"leverage.yaml\"]\n",
    )
    .unwrap();

    let config = SessionConfig::load(&config_path).unwrap();
    let registry = TemplateRegistry::with_builtins();
    let mut session = ReportingSession::new(config, &registry).unwrap();
    assert!(registry.contains("leverage"));

    let bundle = session
        .process(
            "leverage",
            &json!({"Tier1_capital": 1150, "Exposure_measure": 20000}),
            &StaticRuleSource::new(),
            &ScenarioMapper::new(),
        )
        .unwrap();
    assert!(bundle.result.is_valid());
    assert_eq!(bundle.payload.get("Headroom"), Some(&FieldValue::Decimal(550.0)));
    assert!(bundle.citations.is_empty());
}

#[test]
fn overflowing_scenario_audit_reloads() {
    let scenario = json!({
        "CET1_capital": 1e308,
        "AT1_capital": 1e308,
        "Tier2_capital": 200,
        "Reporting_date": "2024-12-31"
    });
    let (session, bundle) = run(&scenario);

    assert_eq!(bundle.payload.get("Tier1_capital"), None);
    assert!(bundle.warnings.iter().any(|w| w.contains("Tier1_capital")));

    let reloaded = AuditLog::from_json(&session.audit().to_json().unwrap()).unwrap();
    assert_eq!(reloaded.entries(), session.audit().entries());
    assert_eq!(
        reloaded.field_history("CET1_capital"),
        session.audit().field_history("CET1_capital")
    );
}

#[test]
fn template_file_colliding_with_builtin_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let own_funds_v2 = LEVERAGE_YAML
        .replace("id: leverage", "id: own_funds")
        .replace("version: \"1.0\"", "version: \"2.0\"");
    std::fs::write(dir.path().join("own_funds.yaml"), own_funds_v2).unwrap();

    let config = SessionConfig {
        template_files: vec![dir.path().join("own_funds.yaml")],
        ..SessionConfig::new("own_funds")
    };
    let registry = TemplateRegistry::with_builtins();
    let err = config.register_templates(&registry).unwrap_err();
    assert!(matches!(
        err,
        CoreError::Schema(SchemaError::DuplicateTemplate(id)) if id == "own_funds"
    ));
    assert_eq!(registry.get_template("own_funds").unwrap().version(), "1.0");
}

#[test]
fn registering_same_template_file_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("leverage.yaml"), LEVERAGE_YAML).unwrap();
    let config = SessionConfig {
        template_files: vec![dir.path().join("leverage.yaml")],
        ..SessionConfig::new("leverage")
    };
    let registry = TemplateRegistry::with_builtins();
    assert_eq!(config.register_templates(&registry).unwrap(), 1);
    assert_eq!(config.register_templates(&registry).unwrap(), 0);
}

#[test]
fn resume_drops_cleared_fields() {
    let (mut session, _) = run(&own_funds_scenario());
    session.clear_field("AT1_capital", Vec::new());

    let log = AuditLog::from_json(&session.audit().to_json().unwrap()).unwrap();
    let registry = TemplateRegistry::with_builtins();
    let resumed =
        ReportingSession::resume(SessionConfig::new("own_funds"), &registry, log).unwrap();
    assert_eq!(resumed.payload().get("AT1_capital"), None);
    assert_eq!(resumed.payload(), session.payload());
}

#[test]
fn resume_rejects_edited_header() {
    let (session, _) = run(&own_funds_scenario());
    let mut snapshot = session.audit().export_snapshot();
    snapshot.header.template_id = "capital_requirements".into();

    let err = AuditLog::from_snapshot(snapshot).unwrap_err();
    assert!(err.is_tampering());
}

#[test]
fn missing_config_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SessionConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, CoreError::Io { .. }));
}
