//! Repeating software timers.
//!
//! Drag detection polls the pointer on a fixed cadence instead of relying on
//! a native drag-and-drop protocol. The detector only needs to schedule and
//! cancel a repeating timer; the host decides how timers actually fire and
//! routes each expiry back to the owner via [`crate::Taskbar::timer_fired`].

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    pub fn raw(self) -> u64 {
        self.0
    }
}

pub trait TimerSource {
    /// Schedule a timer that fires every `interval` until cancelled.
    fn schedule_repeating(&self, interval: Duration) -> TimerId;
    /// Cancel `id`. Cancelling an unknown or already cancelled timer is a
    /// no-op.
    fn cancel(&self, id: TimerId);
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    interval: Duration,
    deadline: Instant,
}

/// Deadline-based timers for hosts that run their own poll loop.
///
/// The event loop asks for [`IntervalTimers::due`] timers after every poll
/// and dispatches them; `next_deadline` bounds the poll timeout so ticks are
/// not delayed by an idle input queue.
#[derive(Debug, Default)]
pub struct IntervalTimers {
    next_id: Cell<u64>,
    entries: RefCell<BTreeMap<TimerId, Entry>>,
}

impl IntervalTimers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.entries.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.borrow().values().map(|e| e.deadline).min()
    }

    /// Collect timers whose deadline has passed and re-arm them for their
    /// next interval. A timer that fell several intervals behind fires once.
    pub fn due(&self, now: Instant) -> Vec<TimerId> {
        let mut entries = self.entries.borrow_mut();
        let mut fired = Vec::new();
        for (id, entry) in entries.iter_mut() {
            if entry.deadline <= now {
                fired.push(*id);
                entry.deadline = now + entry.interval;
            }
        }
        fired
    }
}

impl TimerSource for IntervalTimers {
    fn schedule_repeating(&self, interval: Duration) -> TimerId {
        let raw = self.next_id.get().wrapping_add(1);
        self.next_id.set(raw);
        let id = TimerId(raw);
        self.entries.borrow_mut().insert(
            id,
            Entry {
                interval,
                deadline: Instant::now() + interval,
            },
        );
        tracing::trace!(timer = raw, ?interval, "scheduled repeating timer");
        id
    }

    fn cancel(&self, id: TimerId) {
        if self.entries.borrow_mut().remove(&id).is_some() {
            tracing::trace!(timer = id.0, "cancelled timer");
        }
    }
}
