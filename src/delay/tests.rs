use std::time::Duration;

use assert_call::{call, CallRecorder};

use crate::{state, state_empty, Cause, Clock, Runtime, Value};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn resolves_after_duration() {
    let mut cr = CallRecorder::new();
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(ms(1000));
    d.on_resolve(|v| call!("{v}"));
    assert!(d.state().is_unresolved());

    rt.advance(ms(999));
    cr.verify(());
    rt.advance(ms(1));
    cr.verify("1");
}

#[test]
fn restarts_on_each_transition() {
    let mut cr = CallRecorder::new();
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(ms(1000));
    d.on_resolve(|v| call!("{v}"));

    rt.advance(ms(500));
    s.set(2).unwrap();
    rt.advance(ms(500));
    cr.verify(());
    assert_eq!(rt.pending_timers(), 1);

    rt.advance(ms(500));
    cr.verify("2");
    assert_eq!(rt.pending_timers(), 0);
}

#[test]
fn unresolve_is_immediate_and_cancels() {
    let mut cr = CallRecorder::new();
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(ms(1000));
    d.on_resolve(|v| call!("{v}"))
        .on_unresolve(|| call!("unresolve"));
    cr.verify("unresolve");

    s.unresolve();
    cr.verify("unresolve");
    assert_eq!(rt.pending_timers(), 0);

    rt.advance(ms(2000));
    cr.verify(());
}

#[test]
fn error_is_immediate_and_cancels() {
    let mut cr = CallRecorder::new();
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(ms(1000));
    d.on_error(|e| call!("error {e}"));

    rt.advance(ms(500));
    s.throw(Cause::msg("boom"));
    cr.verify("error boom");
    assert_eq!(rt.pending_timers(), 0);
}

#[test]
fn starts_unresolved_for_unresolved_parent() {
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state_empty();
    let d = s.delay(ms(100));
    assert_eq!(rt.pending_timers(), 0);
    s.set("x").unwrap();
    rt.run();
    assert_eq!(d.get(), Value::from("x"));
}

#[test]
fn dropping_delay_cancels_timer() {
    let rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(ms(100));
    assert_eq!(rt.pending_timers(), 1);
    drop(d);
    assert_eq!(rt.pending_timers(), 0);
}

#[test]
fn chained_delays_accumulate() {
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(ms(100)).delay(ms(100));
    rt.advance(ms(150));
    assert!(d.state().is_unresolved());
    rt.advance(ms(50));
    assert_eq!(d.get(), Value::from(1));
}

#[test]
fn unbounded_delay_stays_unresolved() {
    let mut rt = Runtime::with_clock(Clock::Manual);
    let s = state(1);
    let d = s.delay(Duration::MAX);
    rt.advance(ms(1000));
    assert!(d.state().is_unresolved());

    s.unresolve();
    assert!(d.state().is_unresolved());
}
