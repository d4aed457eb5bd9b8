//! Deferred callback queue over a virtual millisecond clock
//!
//! Everything time-driven in a round (countdown, spawn cadence, per-hole
//! retracts, hit effects) is a payload in one of these queues. The owner
//! pops due entries and dispatches them, so ordering is fully determined by
//! deadlines: earliest first, ties in scheduling order.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Milliseconds on the queue's virtual clock
pub type Millis = u64;

/// Opaque handle to a scheduled entry. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TimerHandle,
    payload: T,
    /// `Some` for repeating timers
    interval: Option<Millis>,
}

/// Earliest-deadline-first timer queue
#[derive(Debug, Clone)]
pub struct TimerQueue<T> {
    now: Millis,
    next_seq: u64,
    next_handle: u64,
    /// (deadline, seq) -> entry; seq breaks ties in scheduling order
    queue: BTreeMap<(Millis, u64), Entry<T>>,
    /// handle -> queue key, for cancellation
    index: HashMap<TimerHandle, (Millis, u64)>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_seq: 0,
            next_handle: 1,
            queue: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Fire `payload` once, `delay` ms from now
    pub fn schedule_once(&mut self, delay: Millis, payload: T) -> TimerHandle {
        let handle = self.allocate_handle();
        self.insert(self.now.saturating_add(delay), Entry { handle, payload, interval: None });
        handle
    }

    /// Fire `payload` every `interval` ms, first firing one interval from now
    pub fn schedule_repeating(&mut self, interval: Millis, payload: T) -> TimerHandle {
        let interval = interval.max(1);
        let handle = self.allocate_handle();
        self.insert(
            self.now.saturating_add(interval),
            Entry { handle, payload, interval: Some(interval) },
        );
        handle
    }

    /// Cancel a pending entry. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.index.remove(&handle) {
            Some(key) => {
                self.queue.remove(&key);
                true
            }
            None => false,
        }
    }

    /// Drop every pending entry
    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.index.clear();
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.index.contains_key(&handle)
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Deadline of the next entry to fire
    pub fn next_deadline(&self) -> Option<Millis> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn advance_to(&mut self, time: Millis) {
        self.now = self.now.max(time);
    }

    fn allocate_handle(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    fn insert(&mut self, deadline: Millis, entry: Entry<T>) {
        let key = (deadline, self.next_seq);
        self.next_seq += 1;
        self.index.insert(entry.handle, key);
        self.queue.insert(key, entry);
    }
}

impl<T: Clone> TimerQueue<T> {
    /// Pop the earliest entry due at or before `until`, advancing the clock
    /// to its deadline. Repeating entries are re-armed under the same handle.
    pub fn pop_due(&mut self, until: Millis) -> Option<(TimerHandle, T)> {
        let (&key, _) = self.queue.iter().next()?;
        let (deadline, _) = key;
        if deadline > until {
            return None;
        }

        let entry = self.queue.remove(&key)?;
        self.index.remove(&entry.handle);
        self.now = self.now.max(deadline);

        // A repeating entry whose next deadline overflows the clock is retired
        if let Some(next) = entry.interval.and_then(|i| deadline.checked_add(i)) {
            self.insert(next, entry.clone());
        }
        Some((entry.handle, entry.payload))
    }
}
