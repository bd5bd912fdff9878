use std::{
    cell::Cell,
    rc::{Rc, Weak},
};

use crate::{
    core::{Binding, DerivedCapability, Sink, WeakAccessor},
    derive::Derivation,
    Accessor, AccessorState, Value,
};


impl Accessor {
    /// Maps the resolved value through `f`.
    ///
    /// If `f` returns an accessor, the result mirrors that accessor until this accessor transitions again.
    pub fn then<R: Into<Value>>(&self, f: impl Fn(Value) -> R + 'static) -> Accessor {
        Derivation::map([self.clone()], move |mut values| {
            AccessorState::Resolved(f(values.swap_remove(0)).into())
        })
    }

    /// Boolean complement of the resolved value's truthiness.
    pub fn not(&self) -> Accessor {
        self.then(|value| !value.is_truthy())
    }

    /// Indexes into an array-like value; unresolved if the index is absent.
    pub fn at(&self, index: usize) -> Accessor {
        Derivation::map([self.clone()], move |values| match values[0].at(index) {
            Some(value) => AccessorState::Resolved(value),
            None => AccessorState::Unresolved,
        })
    }

    /// Resolves to whether this accessor holds an object or array.
    ///
    /// Unlike other derivations this never becomes unresolved; errors still propagate.
    pub fn is_object(&self) -> Accessor {
        Derivation::observe(self, |state| state.value().is_some_and(Value::is_object))
    }

    /// Resolves to whether this accessor is resolved. Errors still propagate.
    pub fn is_resolved(&self) -> Accessor {
        Derivation::observe(self, AccessorState::is_resolved)
    }

    /// Resolves to whether this accessor is unresolved or resolved to [`Value::Undefined`].
    /// Errors still propagate.
    pub fn is_undefined(&self) -> Accessor {
        Derivation::observe(self, |state| match state {
            AccessorState::Resolved(value) => value.is_undefined(),
            _ => true,
        })
    }

    /// Resolves to `seed` if this accessor is not yet resolved, then follows it once it resolves or errors.
    pub fn start_with(&self, seed: impl Into<Value>) -> Accessor {
        StartWith::build(self, seed.into())
    }
}

struct StartWith {
    target: WeakAccessor,
    _parent: Binding,
    is_seeded: Cell<bool>,
}

impl StartWith {
    fn build(parent: &Accessor, seed: Value) -> Accessor {
        let (state, is_seeded) = match parent.state() {
            AccessorState::Resolved(value) => (AccessorState::Resolved(value), false),
            _ => (AccessorState::Resolved(seed), true),
        };
        let target = Accessor::from_parts(state, DerivedCapability);
        let this = Rc::new_cyclic(|this: &Weak<Self>| {
            let sink: Weak<dyn Sink> = this.clone();
            Self {
                target: target.downgrade(),
                _parent: Binding::new(parent, sink),
                is_seeded: Cell::new(is_seeded),
            }
        });
        target.set_driver(this);
        target
    }
}

impl Sink for StartWith {
    fn notify(self: Rc<Self>, source: &Accessor) {
        let Some(target) = self.target.upgrade() else {
            return;
        };
        let state = source.state();
        if state.is_unresolved() && self.is_seeded.get() {
            return;
        }
        self.is_seeded.set(false);
        target.transition(state);
    }
}
