use corep_schema::{DataType, FieldValue, Formula};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::HashMap;

proptest! {
    #[test]
    fn prop_integer_text_coerces_to_integer(n in any::<i64>()) {
        let value = FieldValue::from(format!(" {n} "));
        prop_assert_eq!(value.coerce(DataType::Integer), Some(FieldValue::Integer(n)));
    }

    #[test]
    fn prop_finite_decimal_keeps_value(d in -1.0e12..1.0e12_f64) {
        let coerced = FieldValue::Decimal(d).coerce(DataType::Decimal).unwrap();
        prop_assert_eq!(coerced.as_number(), Some(d));
    }

    #[test]
    fn prop_fractional_decimal_is_not_integer(
        whole in -1_000_000_i64..1_000_000,
        tenths in 1..10_i64,
    ) {
        let d = whole as f64 + tenths as f64 / 10.0;
        prop_assert_eq!(FieldValue::Decimal(d).coerce(DataType::Integer), None);
    }

    #[test]
    fn prop_coercion_is_idempotent(n in any::<i32>(), target in prop::sample::select(vec![
        DataType::Integer, DataType::Decimal, DataType::Percentage, DataType::Text,
    ])) {
        let once = FieldValue::Integer(i64::from(n)).coerce(target).unwrap();
        prop_assert_eq!(once.coerce(target), Some(once.clone()));
    }

    #[test]
    fn prop_sum_formula_matches_arithmetic(
        a in -1_000_000_i64..1_000_000,
        b in -1_000_000_i64..1_000_000,
    ) {
        let formula = Formula::parse("total == a + b").unwrap();
        let values: HashMap<&str, f64> = [("a", a as f64), ("b", b as f64)].into_iter().collect();
        prop_assert_eq!(formula.expression().evaluate(&values), Some((a + b) as f64));
    }
}

#[test]
fn non_finite_never_numeric() {
    for d in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
        assert_eq!(FieldValue::Decimal(d).coerce(DataType::Decimal), None);
        assert_eq!(FieldValue::Decimal(d).as_number(), None);
    }
    assert_eq!(FieldValue::from("inf").coerce(DataType::Decimal), None);
}

#[test]
fn persisted_form_is_tagged() {
    let json = serde_json::to_value(FieldValue::Percentage(12.5)).unwrap();
    assert_eq!(json, serde_json::json!({"type": "percentage", "value": 12.5}));
    let back: FieldValue = serde_json::from_value(json).unwrap();
    assert_eq!(back, FieldValue::Percentage(12.5));
}
