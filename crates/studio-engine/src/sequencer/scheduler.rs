//! Virtual-time scheduler
//!
//! A priority queue of delayed tasks keyed on a millisecond clock that only
//! moves when the owner advances it. Tests step it directly; the runtime
//! driver advances it in step with tokio's clock.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Milliseconds on the scheduler clock
pub type Millis = u64;

struct Entry<T> {
    due: Millis,
    /// Insertion sequence; breaks ties so equal deadlines fire FIFO
    seq: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

pub struct VirtualScheduler<T> {
    now: Millis,
    seq: u64,
    queue: BinaryHeap<Reverse<Entry<T>>>,
}

impl<T> VirtualScheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            seq: 0,
            queue: BinaryHeap::new(),
        }
    }

    /// Current clock reading
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Queue `task` to fire `delay` ms from now; returns its deadline
    pub fn schedule_after(&mut self, delay: Millis, task: T) -> Millis {
        let due = self.now.saturating_add(delay);
        self.seq += 1;
        self.queue.push(Reverse(Entry {
            due,
            seq: self.seq,
            task,
        }));
        due
    }

    /// Deadline of the earliest queued task
    pub fn next_deadline(&self) -> Option<Millis> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    /// Pop the earliest task due at or before `until`, moving the clock to
    /// its deadline
    pub fn pop_due(&mut self, until: Millis) -> Option<(Millis, T)> {
        if self.next_deadline()? > until {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        self.now = self.now.max(entry.due);
        Some((entry.due, entry.task))
    }

    /// Move the clock forward; never moves it back
    pub fn advance_clock(&mut self, to: Millis) {
        self.now = self.now.max(to);
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<T> Default for VirtualScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}
