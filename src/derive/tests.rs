use assert_call::{call, CallRecorder};

use crate::{join, state, state_empty, AccessorState, Cause, Value};

fn sum(values: &[Value]) -> Value {
    Value::from(values.iter().filter_map(Value::as_f64).sum::<f64>())
}

#[test]
fn errors_beat_unresolved() {
    let a = state_empty();
    let b = state(1);
    let j = join([&a, &b], sum);
    assert!(j.state().is_unresolved());

    b.throw(Cause::msg("b failed"));
    assert_eq!(j.state().causes().unwrap().to_string(), "b failed");
}

#[test]
fn errors_are_concatenated_in_parent_order() {
    let a = state(1);
    let b = state(2);
    let c = state(3);
    let j = join([&a, &b, &c], sum);

    c.throw(Cause::msg("c"));
    a.throw(Cause::msg("a"));
    assert_eq!(j.state().causes().unwrap().to_string(), "a; c");

    a.set(1).unwrap();
    assert_eq!(j.state().causes().unwrap().to_string(), "c");

    c.set(3).unwrap();
    assert_eq!(j.get(), Value::from(6));
}

#[test]
fn handler_runs_only_when_all_resolved() {
    let mut cr = CallRecorder::new();
    let a = state_empty();
    let b = state(2);
    let _j = join([&a, &b], |v| {
        call!("handler");
        sum(v)
    });
    cr.verify(());

    a.set(1).unwrap();
    cr.verify("handler");

    b.unresolve();
    cr.verify(());
}

#[test]
fn returned_accessor_is_mirrored() {
    let a = state(1);
    let inner = state("hello");
    let inner0 = inner.clone();
    let j = join([&a], move |_| inner0.clone());
    assert_eq!(j.get(), Value::from("hello"));

    inner.set("world").unwrap();
    assert_eq!(j.get(), Value::from("world"));

    inner.unresolve();
    assert!(j.state().is_unresolved());

    inner.throw(Cause::msg("boom"));
    assert!(j.state().is_errored());
}

#[test]
fn parent_transition_switches_returned_accessor() {
    let selector = state(0);
    let first = state("first");
    let second = state("second");
    let (f0, s0) = (first.clone(), second.clone());
    let j = join([&selector], move |v| {
        if v[0] == Value::from(0) {
            f0.clone()
        } else {
            s0.clone()
        }
    });
    assert_eq!(j.get(), Value::from("first"));
    assert_eq!(first.subscribers().borrow().len(), 1);

    selector.set(1).unwrap();
    assert_eq!(j.get(), Value::from("second"));
    assert_eq!(first.subscribers().borrow().len(), 0);
    assert_eq!(second.subscribers().borrow().len(), 1);

    first.set("ignored").unwrap();
    assert_eq!(j.get(), Value::from("second"));

    selector.unresolve();
    assert_eq!(j.state(), AccessorState::Unresolved);
    assert_eq!(second.subscribers().borrow().len(), 0);
}

#[test]
fn recomputes_transitively() {
    let mut cr = CallRecorder::new();
    let s = state(1);
    let d0 = s.then(|v| Value::from(v.as_f64().unwrap() + 1.0));
    let d1 = d0.then(|v| Value::from(v.as_f64().unwrap() * 2.0));
    d1.on_resolve(|v| call!("{v}"))
        .on_unresolve(|| call!("unresolve"))
        .on_error(|e| call!("error {e}"));
    cr.verify("4");

    s.set(2).unwrap();
    cr.verify("6");
    s.unresolve();
    cr.verify("unresolve");
    s.throw(Cause::msg("boom"));
    cr.verify("error boom");
}
