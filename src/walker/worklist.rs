//! Shared worklist with built-in termination detection.
//!
//! The worklist is a monitor: one mutex guards the queue, the count of
//! workers currently executing an item, and the end-of-input marker;
//! one condition variable parks idle workers. Callers cannot get the
//! accounting wrong because the increment happens inside the pop and
//! the decrement lives in an RAII [`Lease`].
//!
//! Termination: no further work can ever appear once the queue is
//! empty, no worker is mid-item (a worker mid-item may still push), and
//! the external feed, if any, has ended. `pop_batch` returns `None`
//! exactly when that predicate holds. Self-feeding worklists (the
//! traversals, where all work is discovered by workers) are constructed
//! with the feed already marked ended, so both flavors share one
//! predicate.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

#[derive(Debug)]
struct State<T> {
    queue: VecDeque<T>,
    /// Workers that have popped an item and not yet completed it.
    wip: usize,
    /// No external producer will push again.
    eof: bool,
    /// Condvar waits taken; idle time spent out of work.
    spins: u64,
}

impl<T> State<T> {
    fn terminated(&self) -> bool {
        self.queue.is_empty() && self.wip == 0 && self.eof
    }
}

/// FIFO of pending work shared by all workers.
#[derive(Debug)]
pub struct Worklist<T> {
    state: Mutex<State<T>>,
    available: Condvar,
}

/// Receipt for a popped batch. Dropping it marks the work complete and,
/// if that completes the whole walk, wakes every parked worker so they
/// can observe shutdown. Held across the action so a panicking worker
/// still releases the others.
#[derive(Debug)]
pub struct Lease<'a, T> {
    list: &'a Worklist<T>,
}

impl<T> Drop for Lease<'_, T> {
    fn drop(&mut self) {
        self.list.complete_one();
    }
}

impl<T> Worklist<T> {
    /// A worklist fed only by its own workers (directory traversal).
    pub fn new() -> Self {
        Self::with_state(true)
    }

    /// A worklist fed by an external producer, which must call
    /// [`mark_eof`](Self::mark_eof) when done pushing.
    pub fn with_external_feed() -> Self {
        Self::with_state(false)
    }

    fn with_state(eof: bool) -> Self {
        Self {
            state: Mutex::new(State {
                queue: VecDeque::new(),
                wip: 0,
                eof,
                spins: 0,
            }),
            available: Condvar::new(),
        }
    }

    /// Append one item and wake one parked worker.
    pub fn push(&self, item: T) {
        let mut state = self.state.lock().unwrap();
        state.queue.push_back(item);
        self.available.notify_one();
    }

    /// Append several items and wake every parked worker.
    pub fn push_batch(&self, items: impl IntoIterator<Item = T>) {
        let mut state = self.state.lock().unwrap();
        state.queue.extend(items);
        self.available.notify_all();
    }

    /// Pop one item, blocking until work arrives or the walk is over.
    pub fn pop(&self) -> Option<(T, Lease<'_, T>)> {
        self.pop_batch(1)
            .map(|(mut items, lease)| (items.pop().unwrap(), lease))
    }

    /// Pop up to `max` items, blocking until work arrives or the walk
    /// is over. Returns `None` only on termination: the queue is empty,
    /// nobody is mid-item, and the feed has ended.
    ///
    /// The in-progress count is incremented under the same lock as the
    /// pop, so between the pop and the drop of the returned [`Lease`]
    /// the rest of the pool knows more work may still appear.
    pub fn pop_batch(&self, max: usize) -> Option<(Vec<T>, Lease<'_, T>)> {
        let mut state = self.state.lock().unwrap();
        while state.queue.is_empty() {
            if state.wip == 0 && state.eof {
                return None;
            }
            state.spins += 1;
            state = self.available.wait(state).unwrap();
        }
        let take = max.max(1).min(state.queue.len());
        let items: Vec<T> = state.queue.drain(..take).collect();
        state.wip += 1;
        Some((items, Lease { list: self }))
    }

    /// Declare the external feed finished. Without this an
    /// externally-fed worklist never terminates.
    pub fn mark_eof(&self) {
        let mut state = self.state.lock().unwrap();
        state.eof = true;
        if state.terminated() {
            self.available.notify_all();
        }
    }

    fn complete_one(&self) {
        let mut state = self.state.lock().unwrap();
        state.wip -= 1;
        if state.terminated() {
            self.available.notify_all();
        }
    }

    /// Number of condvar waits taken so far.
    pub fn spin_count(&self) -> u64 {
        self.state.lock().unwrap().spins
    }

    #[cfg(test)]
    fn queued(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }
}

impl<T> Default for Worklist<T> {
    fn default() -> Self {
        Self::new()
    }
}
