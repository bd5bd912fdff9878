use rstest::rstest;
use serde_json::json;

use crate::{state, Value};

#[rstest]
#[case(Value::Undefined, false)]
#[case(Value::Null, false)]
#[case(Value::from(false), false)]
#[case(Value::from(true), true)]
#[case(Value::from(0), false)]
#[case(Value::from(f64::NAN), false)]
#[case(Value::from(-1), true)]
#[case(Value::from(""), false)]
#[case(Value::from("frp rocks!"), true)]
#[case(json!([]).into(), true)]
#[case(json!({}).into(), true)]
fn truthiness(#[case] value: Value, #[case] expected: bool) {
    assert_eq!(value.is_truthy(), expected);
}

#[rstest]
#[case(json!({ "a": 1 }).into(), true)]
#[case(json!([1]).into(), true)]
#[case(Value::Null, false)]
#[case(Value::from(1), false)]
#[case(Value::from("a"), false)]
#[case(Value::Undefined, false)]
fn is_object(#[case] value: Value, #[case] expected: bool) {
    assert_eq!(value.is_object(), expected);
}

#[test]
fn at() {
    let array: Value = json!([0, 1, 2]).into();
    assert_eq!(array.at(1), Some(Value::from(1)));
    assert_eq!(array.at(3), None);

    let array_like: Value = json!({ "0": 0, "1": 1 }).into();
    assert_eq!(array_like.at(1), Some(Value::from(1)));

    assert_eq!(Value::from("abc").at(2), Some(Value::from("c")));
    assert_eq!(Value::from(5).at(0), None);
}

#[test]
fn child() {
    let value: Value = json!({ "person": { "first": "John" }, "tags": ["a", "b"] }).into();
    assert_eq!(value.child("person"), Some(json!({ "first": "John" }).into()));
    assert_eq!(value.child("missing"), None);
    assert_eq!(value.child("tags").unwrap().child("1"), Some(Value::from("b")));
    assert_eq!(value.child("tags").unwrap().child("x"), None);
}

#[test]
fn from_conversions() {
    assert_eq!(Value::from(()), Value::Undefined);
    assert_eq!(Value::from(None::<i32>), Value::Null);
    assert_eq!(Value::from(Some(2)), Value::Number(2.0));
    assert_eq!(Value::from(vec![1, 2]), json!([1, 2]).into());
    let object: Value = [("a", 1), ("b", 2)].into_iter().collect();
    assert_eq!(object, json!({ "a": 1, "b": 2 }).into());
}

#[test]
fn display() {
    let value: Value = json!({ "a": [1, 2.5, null], "b": "x" }).into();
    assert_eq!(value.to_string(), r#"{"a":[1,2.5,null],"b":"x"}"#);
    assert_eq!(Value::Undefined.to_string(), "undefined");
}

#[test]
fn serialize() {
    let value: Value = [
        ("a", Value::from(1)),
        ("s", Value::from(&state("x"))),
        ("u", Value::Undefined),
    ]
    .into_iter()
    .collect();
    assert_eq!(
        serde_json::to_value(&value).unwrap(),
        json!({ "a": 1.0, "s": "x", "u": null })
    );
}

#[test]
fn accessors_compare_by_identity() {
    let s = state(1);
    assert_eq!(Value::from(&s), Value::from(&s));
    assert_ne!(Value::from(&s), Value::from(&state(1)));
}
