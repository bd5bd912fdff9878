use std::{cell::Cell, future::Future, rc::Rc};

use crate::{
    core::DerivedCapability, runtime::spawn_local, Accessor, AccessorState, Cause, Causes, Value,
};


pub type OnFulfilled = Box<dyn FnOnce(Value)>;
pub type OnRejected = Box<dyn FnOnce(Cause)>;

/// A single-shot asynchronous completion.
///
/// Implementors invoke at most one of the two callbacks, at most once.
pub trait Thenable {
    fn then(self, on_fulfilled: OnFulfilled, on_rejected: OnRejected);
}

impl<F> Thenable for F
where
    F: FnOnce(OnFulfilled, OnRejected),
{
    fn then(self, on_fulfilled: OnFulfilled, on_rejected: OnRejected) {
        self(on_fulfilled, on_rejected)
    }
}

/// Callbacks settling `target`; only the first one invoked has an effect.
fn settlers(target: &Accessor) -> (OnFulfilled, OnRejected) {
    let is_settled = Rc::new(Cell::new(false));
    let on_fulfilled: OnFulfilled = {
        let target = target.clone();
        let is_settled = is_settled.clone();
        Box::new(move |value: Value| {
            if !is_settled.replace(true) {
                target.transition(AccessorState::Resolved(value));
            }
        })
    };
    let on_rejected: OnRejected = {
        let target = target.clone();
        Box::new(move |cause: Cause| {
            if !is_settled.replace(true) {
                target.transition(AccessorState::Errored(Causes::new(cause)));
            }
        })
    };
    (on_fulfilled, on_rejected)
}

fn pending() -> Accessor {
    Accessor::from_parts(AccessorState::Unresolved, DerivedCapability)
}

/// Creates an accessor that resolves when `p` is fulfilled and errors when it is rejected.
///
/// There is no timeout; the accessor stays unresolved until `p` completes.
pub fn promise(p: impl Thenable) -> Accessor {
    let target = pending();
    let (on_fulfilled, on_rejected) = settlers(&target);
    p.then(on_fulfilled, on_rejected);
    target
}

/// Calls `f` immediately with callbacks that resolve or error the returned accessor.
pub fn deferred(f: impl FnOnce(OnFulfilled, OnRejected)) -> Accessor {
    promise(f)
}

/// Creates an accessor settled by the output of `fut`.
///
/// The future is spawned on the thread's [`Runtime`](crate::Runtime);
/// without one the accessor is errored with [`Error::RuntimeNotCreated`](crate::Error::RuntimeNotCreated).
pub fn from_future(fut: impl Future<Output = Result<Value, Cause>> + 'static) -> Accessor {
    let target = pending();
    let (on_fulfilled, on_rejected) = settlers(&target);
    let task = async move {
        match fut.await {
            Ok(value) => on_fulfilled(value),
            Err(cause) => on_rejected(cause),
        }
    };
    if let Err(e) = spawn_local(task) {
        target.transition(AccessorState::Errored(Causes::new(e)));
    }
    target
}
