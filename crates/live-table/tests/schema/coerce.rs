//! Tests for edit-form input coercion.

use live_table::schema::{coerce_value, t};
use live_table::types::FieldValue;

fn num(n: f64) -> FieldValue {
    FieldValue::Number(n)
}

#[test]
fn blank_numeric_input_becomes_default() {
    assert_eq!(coerce_value(&t::percentage(), FieldValue::from("")), num(0.0));
    assert_eq!(
        coerce_value(&t::number().default_number(1.0), FieldValue::from("  ")),
        num(1.0)
    );
}

#[test]
fn invalid_numeric_input_becomes_default() {
    assert_eq!(coerce_value(&t::percentage(), FieldValue::from("abc")), num(0.0));
    assert_eq!(
        coerce_value(&t::number().default_number(1.0), FieldValue::from("v2")),
        num(1.0)
    );
}

#[test]
fn non_finite_numbers_become_default() {
    assert_eq!(coerce_value(&t::number(), num(f64::NAN)), num(0.0));
    assert_eq!(coerce_value(&t::number(), num(f64::INFINITY)), num(0.0));
}

#[test]
fn integer_fields_take_leading_digits() {
    assert_eq!(coerce_value(&t::percentage(), FieldValue::from("42%")), num(42.0));
    assert_eq!(coerce_value(&t::percentage(), FieldValue::from("3.9")), num(3.0));
    assert_eq!(coerce_value(&t::percentage(), num(49.7)), num(49.0));
}

#[test]
fn decimal_fields_need_a_full_number() {
    let version = t::number().default_number(1.0);
    assert_eq!(coerce_value(&version, FieldValue::from("2.5")), num(2.5));
    assert_eq!(coerce_value(&version, FieldValue::from("2.5b")), num(1.0));
}

#[test]
fn percentage_is_clamped() {
    assert_eq!(coerce_value(&t::percentage(), num(150.0)), num(100.0));
    assert_eq!(coerce_value(&t::percentage(), FieldValue::from("-5")), num(0.0));
}

#[test]
fn text_like_fields_stringify_numbers() {
    assert_eq!(coerce_value(&t::text(), num(7.0)), FieldValue::from("7"));
    assert_eq!(coerce_value(&t::date(), num(1.5)), FieldValue::from("1.5"));
    assert_eq!(
        coerce_value(&t::status(&["Open"]), FieldValue::from("Open")),
        FieldValue::from("Open")
    );
}
