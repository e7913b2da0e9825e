use chrono::NaiveDate;
use corep_audit::{AuditAction, AuditError, AuditLog};
use corep_schema::{builtin, FieldValue};
use corep_test_utils::own_funds_payload;
use corep_validation::Validator;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn field_ids() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["CET1_capital", "AT1_capital", "Tier1_capital", "Tier2_capital"])
}

fn references() -> impl Strategy<Value = Vec<String>> {
    let pool = vec!["CRR Art. 26", "CRR Art. 51", "CRR Art. 62"];
    prop::collection::vec(prop::sample::select(pool), 0..3)
        .prop_map(|refs| refs.into_iter().map(String::from).collect())
}

fn values() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        any::<i64>().prop_map(FieldValue::Integer),
        (-1e12f64..1e12).prop_map(FieldValue::Decimal),
        (0.0f64..100.0).prop_map(FieldValue::Percentage),
        (0i32..20_000).prop_map(|days| {
            FieldValue::Date(NaiveDate::from_num_days_from_ce_opt(730_000 + days).unwrap())
        }),
        "[a-z ]{1,12}".prop_map(FieldValue::Text),
        Just(FieldValue::Decimal(f64::INFINITY)),
        Just(FieldValue::Percentage(f64::NEG_INFINITY)),
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Update(&'static str, FieldValue, Vec<String>),
    Cite(&'static str, Vec<String>),
    Retrieve(Vec<String>),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (field_ids(), values(), references()).prop_map(|(f, v, r)| Op::Update(f, v, r)),
        (field_ids(), references()).prop_map(|(f, r)| Op::Cite(f, r)),
        references().prop_map(Op::Retrieve),
    ]
}

fn apply(log: &mut AuditLog, op: Op) -> u64 {
    match op {
        Op::Update(field, value, refs) => {
            let old = log.field_history(field).last().and_then(|e| e.new_value.clone());
            log.record_field_update(field, old, Some(value), refs, "analyst", None)
        }
        Op::Cite(field, refs) => log.record_rule_citation(field, refs),
        Op::Retrieve(refs) => log.record_rule_retrieval("capital", refs),
    }
}

fn set(log: &mut AuditLog, field: &str, value: FieldValue, actor: &str) -> u64 {
    log.record_field_update(field, None, Some(value), Vec::new(), actor, None)
}

proptest! {
    #[test]
    fn prop_sequences_strictly_increasing_and_gapless(ops in prop::collection::vec(op(), 0..40)) {
        let mut log = AuditLog::new("r", "own_funds", "system");
        for (i, op) in ops.into_iter().enumerate() {
            prop_assert_eq!(apply(&mut log, op), i as u64 + 1);
        }
        for (i, entry) in log.entries().iter().enumerate() {
            prop_assert_eq!(entry.sequence, i as u64 + 1);
        }
        prop_assert!(log.verify_integrity().is_ok());
    }

    #[test]
    fn prop_reload_reproduces_history_and_counts(ops in prop::collection::vec(op(), 0..40)) {
        let mut log = AuditLog::new("r", "own_funds", "system");
        for op in ops {
            apply(&mut log, op);
        }

        let reloaded = AuditLog::from_json(&log.to_json().unwrap()).unwrap();
        for field in ["CET1_capital", "AT1_capital", "Tier1_capital", "Tier2_capital"] {
            prop_assert_eq!(reloaded.field_history(field), log.field_history(field));
        }
        prop_assert_eq!(reloaded.rule_usage_counts(), log.rule_usage_counts());
    }
}

#[test]
fn save_and_load_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.json");

    let template = builtin::own_funds();
    let result = Validator::new().validate(&own_funds_payload(), &template);

    let mut log = AuditLog::new("Q4 own funds", "own_funds", "system");
    log.record_rule_retrieval("own funds", vec!["CRR Art. 26".into()]);
    log.record_validation_run(&result, "validator");
    log.save(&path).unwrap();

    let loaded = AuditLog::load(&path).unwrap();
    assert_eq!(loaded.entries(), log.entries());

    let run = &loaded.entries()[1];
    assert_eq!(run.action, AuditAction::ValidationRun);
    assert_eq!(run.validation.as_ref().unwrap().completeness, 1.0);

    let totals = loaded.validation_summary();
    assert_eq!(totals.runs, 1);
    assert_eq!(totals.passed, 1);
}

#[test]
fn reload_keeps_typed_values() {
    let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
    let mut log = AuditLog::new("r", "own_funds", "system");
    set(&mut log, "CET1_capital", FieldValue::Decimal(1000.25), "analyst");
    set(&mut log, "Tier1_capital", FieldValue::Decimal(f64::INFINITY), "mapper");
    set(&mut log, "CET1_ratio", FieldValue::Percentage(14.5), "analyst");
    set(&mut log, "Reporting_date", FieldValue::Date(date), "analyst");

    let reloaded = AuditLog::from_json(&log.to_json().unwrap()).unwrap();
    assert_eq!(reloaded.entries(), log.entries());
    assert_eq!(
        reloaded.field_history("Tier1_capital")[0].new_value,
        Some(FieldValue::Decimal(f64::INFINITY))
    );
    assert_eq!(
        reloaded.field_history("Reporting_date")[0].new_value,
        Some(FieldValue::Date(date))
    );
    assert!(reloaded.verify_integrity().is_ok());
}

#[test]
fn validation_run_is_single_summary_entry() {
    let template = builtin::own_funds();
    let payload = own_funds_payload()
        .with("Tier1_capital", 1200.0)
        .with("AT1_capital", FieldValue::Null);
    let result = Validator::new().validate(&payload, &template);

    let mut log = AuditLog::new("r", "own_funds", "system");
    log.record_validation_run(&result, "validator");

    assert_eq!(log.len(), 1);
    let summary = log.entries()[0].validation.as_ref().unwrap();
    assert!(!summary.is_valid);
    assert_eq!(summary.fields_failed, 1);
    assert_eq!(log.validation_summary().failed, 1);
}

#[test]
fn load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AuditLog::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, AuditError::Io { .. }));
}

#[test]
fn edited_file_fails_verification() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.json");

    let mut log = AuditLog::new("r", "own_funds", "system");
    set(&mut log, "CET1_capital", FieldValue::Decimal(1000.0), "analyst");
    log.save(&path).unwrap();

    let edited = std::fs::read_to_string(&path).unwrap().replace("1000.0", "9000.0");
    std::fs::write(&path, edited).unwrap();

    assert!(AuditLog::load(&path).unwrap_err().is_tampering());
}
