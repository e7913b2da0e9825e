use corep_schema::builtin;
use corep_test_utils::{mixed_payload, mixed_template, own_funds_payload_with};
use corep_validation::{
    DataQualityDetector, FieldIssueKind, MasterRuleChecker, RuleIssueKind, Validator,
};
use proptest::prelude::*;

fn amount() -> impl Strategy<Value = f64> {
    (0..1_000_000_i64).prop_map(|cents| cents as f64 / 100.0)
}

proptest! {
    #[test]
    fn prop_consistent_payload_has_no_issues(cet1 in amount(), at1 in amount(), tier2 in amount()) {
        let template = builtin::own_funds();
        let payload = own_funds_payload_with(cet1, at1, tier2);
        let result = Validator::new().validate(&payload, &template);

        prop_assert!(result.field_issues().is_empty());
        prop_assert!(result.rule_issues().is_empty());
        prop_assert_eq!(result.completeness(), 1.0);
        prop_assert_eq!(result.consistency(), 1.0);
    }

    #[test]
    fn prop_removed_required_field_is_reported(index in 0..6_usize) {
        let template = builtin::own_funds();
        let field_id = template.required_fields().nth(index).unwrap().id.clone();
        let mut payload = own_funds_payload_with(1000.0, 150.0, 200.0);
        payload.remove(&field_id);

        let missing = DataQualityDetector::new().check_completeness(&payload, &template);
        prop_assert_eq!(missing, vec![field_id.clone()]);

        let result = Validator::new().validate(&payload, &template);
        let missing_issues: Vec<_> = result
            .field_issues()
            .iter()
            .filter(|i| i.kind == FieldIssueKind::MissingRequiredField)
            .collect();
        prop_assert_eq!(missing_issues.len(), 1);
        prop_assert_eq!(&missing_issues[0].field_id, &field_id);
    }

    #[test]
    fn prop_difference_within_tolerance_passes(
        base in amount(),
        millis in 0..=9_i64,
        negative in any::<bool>(),
    ) {
        let template = builtin::own_funds();
        let sign = if negative { -1.0 } else { 1.0 };
        let delta = sign * millis as f64 / 1000.0;
        let payload = own_funds_payload_with(base, 100.0, 50.0)
            .with("Tier1_capital", base + 100.0 + delta);

        let issues = DataQualityDetector::new().check_consistency(&payload, &template);
        prop_assert!(issues.is_empty(), "{:?}", issues);
    }

    #[test]
    fn prop_difference_beyond_tolerance_is_one_violation(
        base in amount(),
        cents in 2..100_000_i64,
    ) {
        let template = builtin::own_funds();
        let delta = cents as f64 / 100.0;
        let mut payload = own_funds_payload_with(base, 100.0, 50.0);
        let tier1 = base + 100.0 + delta;
        payload.set("Tier1_capital", tier1);
        payload.set("Total_own_funds", tier1 + 50.0);

        let issues = MasterRuleChecker::new().check_master_rules(&payload, &template);
        prop_assert_eq!(issues.len(), 1);
        prop_assert_eq!(issues[0].rule_id.as_str(), "MR_001");
        prop_assert!(matches!(issues[0].kind, RuleIssueKind::MasterRuleViolation(_)));
    }

    #[test]
    fn prop_absent_rule_field_skips(
        field in prop::sample::select(vec!["total", "part_a", "part_b"]),
    ) {
        let template = mixed_template();
        let mut payload = mixed_payload();
        payload.remove(field);

        let issues = MasterRuleChecker::new().check_master_rules(&payload, &template);
        prop_assert_eq!(issues.len(), 1);
        match &issues[0].kind {
            RuleIssueKind::RuleSkipped { unresolved } => {
                prop_assert_eq!(unresolved, &vec![field.to_string()]);
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    }

    #[test]
    fn prop_validation_is_idempotent(cet1 in amount(), tier1 in amount()) {
        let template = builtin::own_funds();
        let payload = own_funds_payload_with(cet1, 10.0, 10.0).with("Tier1_capital", tier1);
        let validator = Validator::new();
        prop_assert_eq!(
            validator.validate(&payload, &template),
            validator.validate(&payload, &template)
        );
    }
}
