use std::{
    cell::RefCell,
    collections::BTreeMap,
    future::Future,
    mem::replace,
    thread,
    time::{Duration, Instant},
};

use derive_ex::derive_ex;
use futures::{
    executor::{LocalPool, LocalSpawner},
    task::LocalSpawnExt,
};
use slabmap::SlabMap;
use tracing::debug;

use crate::Error;


thread_local! {
    static GLOBALS: RefCell<Globals> = RefCell::new(Globals::new());
}

struct Globals {
    is_runtime_exists: bool,
    clock: ClockState,
    timers: TimerQueue,
    spawner: Option<LocalSpawner>,
}
impl Globals {
    fn new() -> Self {
        Self {
            is_runtime_exists: false,
            clock: ClockState::System,
            timers: TimerQueue::new(),
            spawner: None,
        }
    }
    fn with<T>(f: impl FnOnce(&mut Self) -> T) -> T {
        GLOBALS.with(|g| f(&mut g.borrow_mut()))
    }
    fn try_with<T>(f: impl FnOnce(&mut Self) -> T) -> Option<T> {
        GLOBALS.try_with(|g| f(&mut g.borrow_mut())).ok()
    }
    fn now(&self) -> Instant {
        match self.clock {
            ClockState::System => Instant::now(),
            ClockState::Manual(now) => now,
        }
    }
}

/// Source of time for timers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Clock {
    /// Wall clock time. [`Runtime::run`] sleeps the thread until the next deadline.
    #[default]
    System,
    /// Virtual time that only moves through [`Runtime::advance`] and [`Runtime::run`].
    Manual,
}

#[derive(Clone, Copy)]
enum ClockState {
    System,
    Manual(Instant),
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
struct Key {
    deadline: Instant,
    seq: u64,
}

type Entry = Box<dyn FnOnce()>;

struct TimerQueue {
    next_seq: u64,
    tasks: BTreeMap<Key, usize>,
    entries: SlabMap<Entry>,
}

impl TimerQueue {
    fn new() -> Self {
        Self {
            next_seq: 0,
            tasks: BTreeMap::new(),
            entries: SlabMap::new(),
        }
    }

    fn insert(&mut self, deadline: Instant, f: Box<dyn FnOnce()>) -> Key {
        let key = Key {
            deadline,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let id = self.entries.insert(f);
        self.tasks.insert(key, id);
        key
    }

    fn remove(&mut self, key: &Key) -> Option<Entry> {
        let id = self.tasks.remove(key)?;
        self.entries.remove(id)
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.tasks.first_key_value().map(|(key, _)| key.deadline)
    }

    fn pop_due(&mut self, now: Instant) -> Option<Entry> {
        let (key, _) = self.tasks.first_key_value()?;
        if key.deadline > now {
            return None;
        }
        let key = *key;
        self.remove(&key)
    }

    fn len(&self) -> usize {
        self.tasks.len()
    }
}

/// A pending timer. Dropping it cancels the timer.
#[must_use]
pub(crate) struct Timer {
    key: Option<Key>,
}

impl Timer {
    /// Schedules `f` to run once `duration` has elapsed on the thread's clock.
    ///
    /// A deadline beyond the range of [`Instant`] never arrives, so `f` is dropped without being queued.
    pub fn schedule(duration: Duration, f: impl FnOnce() + 'static) -> Self {
        let deadline = Globals::with(|g| g.now()).checked_add(duration);
        let key = deadline.map(|deadline| Globals::with(|g| g.timers.insert(deadline, Box::new(f))));
        match key {
            Some(_) => debug!(?duration, "timer armed"),
            None => debug!(?duration, "timer deadline out of range, never fires"),
        }
        Self { key }
    }
}
impl Drop for Timer {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let entry = Globals::try_with(|g| g.timers.remove(&key)).flatten();
            if entry.is_some() {
                debug!("timer cancelled");
            }
        }
    }
}

/// Spawns a future on the runtime of the current thread.
pub(crate) fn spawn_local(fut: impl Future<Output = ()> + 'static) -> Result<(), Error> {
    let spawner = Globals::with(|g| g.spawner.clone()).ok_or(Error::RuntimeNotCreated)?;
    spawner
        .spawn_local(fut)
        .map_err(|_| Error::RuntimeNotCreated)
}

/// Drives timers and spawned futures on the current thread.
///
/// Accessor propagation is synchronous and needs no runtime;
/// only [`delay`](crate::Accessor::delay) and [`from_future`](crate::from_future) depend on one.
#[derive_ex(Default)]
#[default(Self::new())]
pub struct Runtime {
    pool: LocalPool,
    clock: Clock,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_clock(Clock::System)
    }

    pub fn with_clock(clock: Clock) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Globals::with(|g| {
            if replace(&mut g.is_runtime_exists, true) {
                panic!("Only one `Runtime` can exist in the same thread at the same time.");
            }
            g.clock = match clock {
                Clock::System => ClockState::System,
                Clock::Manual => ClockState::Manual(Instant::now()),
            };
            g.spawner = Some(spawner);
        });
        Self { pool, clock }
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn now(&self) -> Instant {
        Globals::with(|g| g.now())
    }

    /// Returns the number of timers waiting to fire.
    pub fn pending_timers(&self) -> usize {
        Globals::with(|g| g.timers.len())
    }

    /// Fires every timer whose deadline has passed, in deadline order.
    ///
    /// Returns `true` if any timer fired.
    pub fn run_timers(&mut self) -> bool {
        let mut handled = false;
        loop {
            let Some(entry) = Globals::with(|g| {
                let now = g.now();
                g.timers.pop_due(now)
            }) else {
                break;
            };
            debug!("timer fired");
            entry();
            handled = true;
        }
        handled
    }

    /// Polls spawned futures until none can make progress.
    pub fn run_futures(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Repeat [`run_futures`](Self::run_futures) and [`run_timers`](Self::run_timers)
    /// until there is nothing left to do right now.
    pub fn update(&mut self) {
        loop {
            self.run_futures();
            if !self.run_timers() {
                break;
            }
        }
    }

    /// Moves a manual clock forward by `duration`, firing the timers that fall due on the way.
    ///
    /// The clock is set to each timer's deadline before it fires,
    /// so timers armed by a firing timer are measured from that deadline.
    ///
    /// # Panics
    ///
    /// Panics if the runtime uses [`Clock::System`].
    pub fn advance(&mut self, duration: Duration) {
        let target = match Globals::with(|g| g.clock) {
            ClockState::Manual(now) => now + duration,
            ClockState::System => panic!("`advance` requires `Clock::Manual`."),
        };
        loop {
            self.update();
            let next = Globals::with(|g| g.timers.next_deadline());
            match next {
                Some(deadline) if deadline <= target => self.set_manual_now(deadline),
                _ => break,
            }
        }
        self.set_manual_now(target);
        self.update();
    }

    /// Runs until no timers remain, waiting for each deadline in turn.
    pub fn run(&mut self) {
        loop {
            self.update();
            let Some(deadline) = Globals::with(|g| g.timers.next_deadline()) else {
                break;
            };
            match self.clock {
                Clock::System => thread::sleep(deadline.saturating_duration_since(Instant::now())),
                Clock::Manual => self.set_manual_now(deadline),
            }
        }
    }

    fn set_manual_now(&mut self, now: Instant) {
        Globals::with(|g| {
            if let ClockState::Manual(current) = &mut g.clock {
                *current = (*current).max(now);
            }
        });
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let timers = Globals::try_with(|g| {
            g.is_runtime_exists = false;
            g.clock = ClockState::System;
            g.spawner = None;
            replace(&mut g.timers, TimerQueue::new())
        });
        drop(timers);
    }
}
