use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use crate::{
    core::{Binding, Capability, DerivedCapability, Sink, WeakAccessor},
    Accessor, AccessorState, Causes, Value,
};

#[cfg(test)]
mod tests;

pub(crate) type MapFn = Box<dyn Fn(Vec<Value>) -> AccessorState>;
pub(crate) type ObserveFn = Box<dyn Fn(&AccessorState) -> bool>;

pub(crate) enum Rule {
    /// Errors beat unresolved, unresolved beats resolved; when every parent is
    /// resolved the handler maps their values. A handler yielding an accessor is mirrored.
    Map(MapFn),
    /// Reflects the parent state as a boolean, propagating only errors.
    Observe(ObserveFn),
}

/// Combines the states of `parents`: the first errored parents win, then any unresolved parent.
///
/// Returns the resolved values when every parent is resolved.
pub(crate) fn combine(parents: &[Binding]) -> Result<Vec<Value>, AccessorState> {
    let mut values = Vec::with_capacity(parents.len());
    let mut errors = Vec::new();
    let mut is_unresolved = false;
    for p in parents {
        match p.source().state() {
            AccessorState::Resolved(value) => values.push(value),
            AccessorState::Unresolved => is_unresolved = true,
            AccessorState::Errored(causes) => errors.push(causes),
        }
    }
    if let Some(causes) = Causes::concat(errors) {
        Err(AccessorState::Errored(causes))
    } else if is_unresolved {
        Err(AccessorState::Unresolved)
    } else {
        Ok(values)
    }
}

pub(crate) struct Derivation {
    target: WeakAccessor,
    parents: Vec<Binding>,
    rule: Rule,
    chained: RefCell<Option<Binding>>,
}

impl Derivation {
    /// Creates an accessor driven by `parents` and computes its initial state.
    pub(crate) fn build(
        parents: impl IntoIterator<Item = Accessor>,
        rule: Rule,
        capability: impl Capability,
    ) -> Accessor {
        let target = Accessor::from_parts(AccessorState::Unresolved, capability);
        let this = Rc::new_cyclic(|this: &Weak<Self>| {
            let sink: Weak<dyn Sink> = this.clone();
            Self {
                target: target.downgrade(),
                parents: parents
                    .into_iter()
                    .map(|p| Binding::new(&p, sink.clone()))
                    .collect(),
                rule,
                chained: RefCell::new(None),
            }
        });
        target.set_driver(this.clone());
        this.recompute();
        target
    }

    pub(crate) fn map(
        parents: impl IntoIterator<Item = Accessor>,
        f: impl Fn(Vec<Value>) -> AccessorState + 'static,
    ) -> Accessor {
        Self::build(parents, Rule::Map(Box::new(f)), DerivedCapability)
    }

    pub(crate) fn observe(parent: &Accessor, f: impl Fn(&AccessorState) -> bool + 'static) -> Accessor {
        Self::build([parent.clone()], Rule::Observe(Box::new(f)), DerivedCapability)
    }

    fn recompute(self: &Rc<Self>) {
        let Some(target) = self.target.upgrade() else {
            return;
        };
        let state = match &self.rule {
            Rule::Map(f) => match combine(&self.parents) {
                Ok(values) => f(values),
                Err(state) => state,
            },
            Rule::Observe(f) => {
                let state = self.parents[0].source().state();
                match state {
                    AccessorState::Errored(causes) => AccessorState::Errored(causes),
                    state => AccessorState::Resolved(Value::Bool(f(&state))),
                }
            }
        };
        let old = self.chained.borrow_mut().take();
        drop(old);
        if let AccessorState::Resolved(Value::Accessor(inner)) = state {
            let sink: Weak<dyn Sink> = Rc::downgrade(self) as Weak<dyn Sink>;
            *self.chained.borrow_mut() = Some(Binding::new(&inner, sink));
            target.transition(inner.state());
        } else {
            target.transition(state);
        }
    }

    fn mirror_chained(&self, source: &Accessor) {
        let Some(target) = self.target.upgrade() else {
            return;
        };
        let is_current = self
            .chained
            .borrow()
            .as_ref()
            .is_some_and(|b| Accessor::ptr_eq(b.source(), source));
        if is_current {
            target.transition(source.state());
        }
    }
}

impl Sink for Derivation {
    fn notify(self: Rc<Self>, source: &Accessor) {
        if self
            .parents
            .iter()
            .any(|p| Accessor::ptr_eq(p.source(), source))
        {
            self.recompute();
        } else {
            self.mirror_chained(source);
        }
    }
}
