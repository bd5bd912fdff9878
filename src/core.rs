use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

use parse_display::Display;
use tracing::{debug, trace};

use crate::{Cause, Causes, Error, Value};

mod bindings;

pub(crate) use bindings::{Binding, Sink, Subscriber, Subscribers};


/// The three mutually exclusive states of an accessor.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum AccessorState {
    #[default]
    Unresolved,
    Resolved(Value),
    Errored(Causes),
}

impl AccessorState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, AccessorState::Resolved(_))
    }
    pub fn is_unresolved(&self) -> bool {
        matches!(self, AccessorState::Unresolved)
    }
    pub fn is_errored(&self) -> bool {
        matches!(self, AccessorState::Errored(_))
    }
    pub fn value(&self) -> Option<&Value> {
        match self {
            AccessorState::Resolved(value) => Some(value),
            _ => None,
        }
    }
    pub fn causes(&self) -> Option<&Causes> {
        match self {
            AccessorState::Errored(causes) => Some(causes),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AccessorState::Unresolved => "unresolved",
            AccessorState::Resolved(_) => "resolved",
            AccessorState::Errored(_) => "errored",
        }
    }
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display(style = "snake_case")]
pub enum AccessorKind {
    State,
    Constant,
    Derived,
    Property,
}

/// What an accessor variant is able to do.
pub(crate) trait Capability: 'static {
    fn kind(&self) -> AccessorKind;

    fn is_gettable(&self) -> bool {
        true
    }
    fn is_settable(&self) -> bool {
        false
    }
    fn set(&self, _this: &Accessor, _value: Value) -> Result<(), Error> {
        Err(Error::InvalidOperation(self.kind()))
    }
}

pub(crate) struct DerivedCapability;

impl Capability for DerivedCapability {
    fn kind(&self) -> AccessorKind {
        AccessorKind::Derived
    }
}

pub(crate) struct Node {
    state: RefCell<AccessorState>,
    subscribers: RefCell<Subscribers>,
    pending: RefCell<VecDeque<AccessorState>>,
    is_notifying: Cell<bool>,
    capability: Box<dyn Capability>,
    driver: RefCell<Option<Rc<dyn Sink>>>,
}

/// A node of the reactive graph.
///
/// Cloning an `Accessor` clones the handle, not the node.
/// A derived accessor keeps its parents alive, but parents do not keep derived accessors alive:
/// a derivation stops receiving updates once every handle to it is dropped.
#[derive(Clone)]
pub struct Accessor(Rc<Node>);

impl Accessor {
    pub(crate) fn from_parts(state: AccessorState, capability: impl Capability) -> Self {
        Self(Rc::new(Node {
            state: RefCell::new(state),
            subscribers: RefCell::new(Subscribers::new()),
            pending: RefCell::new(VecDeque::new()),
            is_notifying: Cell::new(false),
            capability: Box::new(capability),
            driver: RefCell::new(None),
        }))
    }

    /// Attaches the sink that drives this accessor; it lives as long as the accessor.
    pub(crate) fn set_driver(&self, driver: Rc<dyn Sink>) {
        *self.0.driver.borrow_mut() = Some(driver);
    }

    pub(crate) fn downgrade(&self) -> WeakAccessor {
        WeakAccessor(Rc::downgrade(&self.0))
    }

    pub(crate) fn subscribers(&self) -> &RefCell<Subscribers> {
        &self.0.subscribers
    }

    pub(crate) fn is_fixed(&self) -> bool {
        self.kind() == AccessorKind::Constant
    }

    /// Returns the current value, or [`Value::Undefined`] if not resolved.
    pub fn get(&self) -> Value {
        match &*self.0.state.borrow() {
            AccessorState::Resolved(value) => value.clone(),
            _ => Value::Undefined,
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> AccessorState {
        self.0.state.borrow().clone()
    }

    pub fn kind(&self) -> AccessorKind {
        self.0.capability.kind()
    }
    pub fn is_gettable(&self) -> bool {
        self.0.capability.is_gettable()
    }
    pub fn is_settable(&self) -> bool {
        self.0.capability.is_settable()
    }

    /// Sets the value of a settable accessor and notifies subscribers.
    pub fn set(&self, value: impl Into<Value>) -> Result<(), Error> {
        self.0.capability.set(self, value.into())
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Rc::ptr_eq(&this.0, &other.0)
    }

    /// Registers a callback invoked on every transition into the resolved state.
    ///
    /// If the accessor is already resolved, the callback is also invoked immediately.
    pub fn on_resolve(&self, f: impl Fn(&Value) + 'static) -> &Self {
        self.subscribe(Subscriber::Resolve(Rc::new(f)))
    }

    /// Registers a callback invoked on every transition into the unresolved state.
    ///
    /// If the accessor is already unresolved, the callback is also invoked immediately.
    pub fn on_unresolve(&self, f: impl Fn() + 'static) -> &Self {
        self.subscribe(Subscriber::Unresolve(Rc::new(f)))
    }

    /// Registers a callback invoked on every transition into the errored state.
    ///
    /// If the accessor is already errored, the callback is also invoked immediately.
    pub fn on_error(&self, f: impl Fn(&Causes) + 'static) -> &Self {
        self.subscribe(Subscriber::Error(Rc::new(f)))
    }

    fn subscribe(&self, subscriber: Subscriber) -> &Self {
        if !self.is_fixed() {
            self.0.subscribers.borrow_mut().insert(subscriber.clone());
        }
        let state = self.state();
        subscriber.fire(self, &state);
        self
    }

    /// Transitions to the resolved state.
    pub fn resolve(&self, value: impl Into<Value>) {
        self.transition(AccessorState::Resolved(value.into()));
    }

    /// Transitions to the unresolved state.
    pub fn unresolve(&self) {
        self.transition(AccessorState::Unresolved);
    }

    /// Transitions to the errored state with a single cause.
    pub fn throw(&self, cause: impl Into<Cause>) {
        self.transition(AccessorState::Errored(Causes::new(cause)));
    }

    /// Replaces the state and notifies the matching subscribers in registration order.
    ///
    /// Every call is an event, even if the state does not change.
    /// A transition requested while this accessor is notifying is delivered after the current pass.
    pub(crate) fn transition(&self, state: AccessorState) {
        if self.is_fixed() {
            debug!(state = state.label(), "ignored transition on a constant accessor");
            return;
        }
        self.0.pending.borrow_mut().push_back(state);
        if self.0.is_notifying.replace(true) {
            trace!(kind = %self.kind(), "transition queued");
            return;
        }
        let _guard = NotifyingGuard(&self.0.is_notifying);
        loop {
            let Some(state) = self.0.pending.borrow_mut().pop_front() else {
                break;
            };
            trace!(kind = %self.kind(), state = state.label(), "transition");
            *self.0.state.borrow_mut() = state.clone();
            let subscribers = self.0.subscribers.borrow().snapshot(&state);
            for s in subscribers {
                s.fire(self, &state);
            }
        }
    }
}

struct NotifyingGuard<'a>(&'a Cell<bool>);

impl Drop for NotifyingGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl PartialEq for Accessor {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}
impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.state.try_borrow() {
            Ok(state) => f
                .debug_tuple("Accessor")
                .field(&self.kind())
                .field(&*state)
                .finish(),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

#[derive(Clone)]
pub(crate) struct WeakAccessor(Weak<Node>);

impl WeakAccessor {
    pub fn upgrade(&self) -> Option<Accessor> {
        self.0.upgrade().map(Accessor)
    }
}
