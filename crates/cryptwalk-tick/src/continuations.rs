//! Deferred work scheduled on the tick loop.
//!
//! "Wait N ticks, then spawn" becomes an entry in this queue. The owner
//! drains due entries once per tick and runs them itself, so deferred work
//! always executes on the loop, in a deterministic order.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A queue of `T` values, each due on a specific tick.
///
/// Entries due on the same tick come out in the order they were scheduled.
#[derive(Debug)]
pub struct Continuations<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    next_seq: u64,
}

#[derive(Debug)]
struct Entry<T> {
    due: u64,
    seq: u64,
    job: T,
}

// Ordering only looks at (due, seq); the payload never needs to be `Ord`.
impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        (self.due, self.seq) == (other.due, other.seq)
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl<T> Continuations<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Schedules `job` to run on tick `due`.
    pub fn schedule_at(&mut self, due: u64, job: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Entry { due, seq, job }));
    }

    /// Schedules `job` to run `delay` ticks after `now`. A delay of 0 makes
    /// the job due immediately (on the next drain at `now`).
    pub fn schedule_after(&mut self, now: u64, delay: u64, job: T) {
        self.schedule_at(now.saturating_add(delay), job);
    }

    /// Removes and returns every job due on or before `now`, earliest first.
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.due > now {
                break;
            }
            if let Some(Reverse(entry)) = self.heap.pop() {
                due.push(entry.job);
            }
        }
        due
    }

    /// The tick the earliest pending job is due on.
    pub fn next_due(&self) -> Option<u64> {
        self.heap.peek().map(|Reverse(entry)| entry.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drops every pending job without running it.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl<T> Default for Continuations<T> {
    fn default() -> Self {
        Self::new()
    }
}
