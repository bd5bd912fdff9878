use std::rc::{Rc, Weak};

use slabmap::SlabMap;

use crate::{Accessor, AccessorState, Causes, Value};

/// A node that recomputes when one of its sources transitions.
pub(crate) trait Sink: 'static {
    fn notify(self: Rc<Self>, source: &Accessor);
}

pub(crate) type ResolveFn = Rc<dyn Fn(&Value)>;
pub(crate) type UnresolveFn = Rc<dyn Fn()>;
pub(crate) type ErrorFn = Rc<dyn Fn(&Causes)>;

#[derive(Clone)]
pub(crate) enum Subscriber {
    Resolve(ResolveFn),
    Unresolve(UnresolveFn),
    Error(ErrorFn),
    Sink(Weak<dyn Sink>),
}
impl Subscriber {
    fn is_interested(&self, state: &AccessorState) -> bool {
        match (self, state) {
            (Subscriber::Sink(_), _) => true,
            (Subscriber::Resolve(_), AccessorState::Resolved(_)) => true,
            (Subscriber::Unresolve(_), AccessorState::Unresolved) => true,
            (Subscriber::Error(_), AccessorState::Errored(_)) => true,
            _ => false,
        }
    }

    pub fn fire(&self, source: &Accessor, state: &AccessorState) {
        match (self, state) {
            (Subscriber::Sink(sink), _) => {
                if let Some(sink) = sink.upgrade() {
                    sink.notify(source);
                }
            }
            (Subscriber::Resolve(f), AccessorState::Resolved(value)) => f(value),
            (Subscriber::Unresolve(f), AccessorState::Unresolved) => f(),
            (Subscriber::Error(f), AccessorState::Errored(causes)) => f(causes),
            _ => {}
        }
    }
}

struct Entry {
    seq: u64,
    subscriber: Subscriber,
}

/// Subscribers of one accessor, notified in registration order.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: SlabMap<Entry>,
    next_seq: u64,
}

impl Subscribers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subscriber: Subscriber) -> usize {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(Entry { seq, subscriber })
    }

    pub fn remove(&mut self, key: usize) {
        self.entries.remove(key);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Collects the subscribers interested in `state`.
    ///
    /// The registry is not borrowed while they run, so callbacks may subscribe or unbind freely.
    pub fn snapshot(&self, state: &AccessorState) -> Vec<Subscriber> {
        let mut items: Vec<_> = self
            .entries
            .values()
            .filter(|e| e.subscriber.is_interested(state))
            .map(|e| (e.seq, e.subscriber.clone()))
            .collect();
        items.sort_by_key(|(seq, _)| *seq);
        items.into_iter().map(|(_, s)| s).collect()
    }
}

/// A registration of a [`Sink`] on a source accessor.
///
/// Holds the source alive; the source only refers back to the sink weakly.
/// Dropping the binding unregisters the sink.
pub(crate) struct Binding {
    source: Accessor,
    key: Option<usize>,
}

impl Binding {
    pub fn new(source: &Accessor, sink: Weak<dyn Sink>) -> Self {
        let key = if source.is_fixed() {
            None
        } else {
            Some(source.subscribers().borrow_mut().insert(Subscriber::Sink(sink)))
        };
        Self {
            source: source.clone(),
            key,
        }
    }

    pub fn source(&self) -> &Accessor {
        &self.source
    }
}
impl Drop for Binding {
    fn drop(&mut self) {
        if let Some(key) = self.key {
            self.source.subscribers().borrow_mut().remove(key);
        }
    }
}
