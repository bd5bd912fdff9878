use std::{
    cell::RefCell,
    rc::{Rc, Weak},
    time::Duration,
};

use crate::{
    core::{Binding, DerivedCapability, Sink, WeakAccessor},
    runtime::Timer,
    Accessor, AccessorState,
};

#[cfg(test)]
mod tests;

impl Accessor {
    /// Resolves `duration` after this accessor resolves, with its value at that later instant.
    ///
    /// Each new transition of this accessor restarts the wait.
    /// Unresolved and errored transitions propagate immediately and cancel the wait.
    /// Timers are fired by the thread's [`Runtime`](crate::Runtime).
    pub fn delay(&self, duration: Duration) -> Accessor {
        Delay::build(self, duration)
    }
}

struct Delay {
    target: WeakAccessor,
    parent: Binding,
    duration: Duration,
    timer: RefCell<Option<Timer>>,
}

impl Delay {
    fn build(parent: &Accessor, duration: Duration) -> Accessor {
        let target = Accessor::from_parts(AccessorState::Unresolved, DerivedCapability);
        let this = Rc::new_cyclic(|this: &Weak<Self>| {
            let sink: Weak<dyn Sink> = this.clone();
            Self {
                target: target.downgrade(),
                parent: Binding::new(parent, sink),
                duration,
                timer: RefCell::new(None),
            }
        });
        target.set_driver(this.clone());
        this.on_parent(&parent.state());
        target
    }

    fn on_parent(self: &Rc<Self>, state: &AccessorState) {
        let old = self.timer.borrow_mut().take();
        drop(old);
        match state {
            AccessorState::Resolved(_) => {
                let this = Rc::downgrade(self);
                let timer = Timer::schedule(self.duration, move || {
                    if let Some(this) = this.upgrade() {
                        this.elapsed();
                    }
                });
                *self.timer.borrow_mut() = Some(timer);
            }
            state => {
                if let Some(target) = self.target.upgrade() {
                    target.transition(state.clone());
                }
            }
        }
    }

    fn elapsed(&self) {
        let old = self.timer.borrow_mut().take();
        drop(old);
        let Some(target) = self.target.upgrade() else {
            return;
        };
        if let AccessorState::Resolved(value) = self.parent.source().state() {
            target.transition(AccessorState::Resolved(value));
        }
    }
}

impl Sink for Delay {
    fn notify(self: Rc<Self>, source: &Accessor) {
        self.on_parent(&source.state());
    }
}
