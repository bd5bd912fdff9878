use std::time::Duration;

use accessor_frp::*;
use assert_call::{call, CallRecorder};
use serde_json::json;

#[test]
fn get_returns_current_value() {
    assert_eq!(state(1).get(), Value::from(1));
    assert_eq!(state(true).get(), Value::from(true));
    assert_eq!(state("frp rocks!").get(), Value::from("frp rocks!"));
    assert_eq!(state(json!([1, 2, 3])).get(), json!([1, 2, 3]).into());
    assert_eq!(state_empty().get(), Value::Undefined);
}

#[test]
fn is_object_reacts_to_unresolve_from_callback() {
    let mut cr = CallRecorder::new();
    let s = state(json!({ "one": 1, "two": 2, "three": 3 }));
    let s0 = s.clone();
    let o = s.is_object();
    o.on_resolve(move |v| {
        call!("{v}");
        if v.is_truthy() {
            s0.unresolve();
        }
    });
    cr.verify(["true", "false"]);
}

#[test]
fn is_resolved_reacts_to_throw_from_callback() {
    let mut cr = CallRecorder::new();
    let s = state(1);
    let s0 = s.clone();
    let r = s.is_resolved();
    r.on_resolve(move |v| {
        call!("{v}");
        s0.throw(Cause::msg("An error was encountered"));
    })
    .on_error(|e| call!("error {e}"));
    cr.verify(["true", "error An error was encountered"]);
}

#[test]
fn is_undefined_follows_unresolve() {
    let mut cr = CallRecorder::new();
    let s = state(1);
    let s0 = s.clone();
    let u = s.is_undefined();
    u.on_resolve(move |v| {
        call!("{v}");
        if !v.is_truthy() {
            s0.unresolve();
        }
    });
    cr.verify(["false", "true"]);
}

#[test]
fn not_propagates_unresolve_from_callback() {
    let mut cr = CallRecorder::new();
    let s = state(1);
    let s0 = s.clone();
    let n = s.not();
    n.on_resolve(move |v| {
        call!("{v}");
        s0.unresolve();
    })
    .on_unresolve(|| call!("unresolve"));
    cr.verify(["false", "unresolve"]);
}

#[test]
fn delay_on_manual_clock() {
    let mut cr = CallRecorder::new();
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(Duration::from_millis(1000));
    d.on_resolve(|v| call!("{v}"));

    rt.advance(Duration::from_millis(500));
    s.set(2).unwrap();
    rt.advance(Duration::from_millis(999));
    cr.verify(());
    rt.advance(Duration::from_millis(1));
    cr.verify("2");
}

#[test]
fn delay_on_system_clock() {
    let mut cr = CallRecorder::new();
    let mut rt = Runtime::new();
    let s = state("x");
    let d = s.delay(Duration::from_millis(10));
    d.on_resolve(|v| call!("{v}"));
    rt.run();
    cr.verify("\"x\"");
}

#[test]
fn property_propagates_from_callback() {
    let mut cr = CallRecorder::new();
    let s = state(json!({ "one": 1 }));
    let s0 = s.clone();
    let p = s.property(".one");
    p.on_resolve(move |v| {
        call!("{v}");
        s0.throw(Cause::msg("boom"));
    })
    .on_error(|e| call!("error {e}"));
    cr.verify(["1", "error boom"]);
}

#[test]
fn start_with() {
    assert_eq!(state_empty().start_with(4).get(), Value::from(4));
    assert_eq!(state(1).start_with(4).get(), Value::from(1));
}

#[test]
fn start_with_on_missing_property() {
    let s = state(json!({ "one": 1 }));
    let d = s.property(".four").start_with(4);
    assert_eq!(d.get(), Value::from(4));
    s.set(json!({ "four": 44 })).unwrap();
    assert_eq!(d.get(), Value::from(44));
}

#[test]
fn property_set_shallow_and_deep() {
    let s = state(json!({ "one": 1, "person": { "first": "John" } }));
    s.property(".one").set("one").unwrap();
    s.property(".person.last").set("Doe").unwrap();
    assert_eq!(
        s.get(),
        json!({ "one": "one", "person": { "first": "John", "last": "Doe" } }).into()
    );
}

#[test]
fn property_set_constructs_object() {
    let s = state_empty();
    s.property(".person.first").set("John").unwrap();
    assert_eq!(s.get(), json!({ "person": { "first": "John" } }).into());
}

#[test]
fn constant_cannot_be_set() {
    let c = constant(1);
    assert!(c.is_gettable());
    assert!(!c.is_settable());
    assert_eq!(c.set(2), Err(Error::InvalidOperation(AccessorKind::Constant)));
    assert_eq!(c.get(), Value::from(1));
}

#[test]
fn derived_cannot_be_set() {
    let d = state(1).then(|v| v);
    assert_eq!(d.set(2), Err(Error::InvalidOperation(AccessorKind::Derived)));
}
