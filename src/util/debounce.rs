// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Cancellable delayed tasks with last-writer-wins semantics.
//!
//! Scheduling a new task replaces the pending one; only the most recent
//! payload is ever delivered. Callers pass the current instant explicitly so
//! the frame loop (or a test) owns the clock.

use std::time::{Duration, Instant};

/// A single pending task that fires `delay` after it was last scheduled.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Schedule `payload`, superseding any pending task.
    ///
    /// Returns true if a pending task was replaced.
    pub fn schedule(&mut self, now: Instant, payload: T) -> bool {
        let replaced = self.pending.is_some();
        self.pending = Some((now + self.delay, payload));
        replaced
    }

    /// Drop the pending task without delivering it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending task becomes due.
    pub fn due_at(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// Deliver the pending payload if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((at, _)) if *at <= now => self.pending.take().map(|(_, payload)| payload),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut debouncer = Debouncer::from_millis(100);
        debouncer.schedule(start, 1);

        assert_eq!(debouncer.poll(start + Duration::from_millis(50)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(100)), Some(1));
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + Duration::from_millis(300)), None);
    }

    #[test]
    fn test_newer_event_supersedes() {
        let start = Instant::now();
        let mut debouncer = Debouncer::from_millis(100);
        assert!(!debouncer.schedule(start, "first"));
        assert!(debouncer.schedule(start + Duration::from_millis(80), "second"));

        // The first deadline has passed but it was replaced
        assert_eq!(debouncer.poll(start + Duration::from_millis(120)), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(180)), Some("second"));
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut debouncer = Debouncer::from_millis(10);
        debouncer.schedule(start, 7);
        assert_eq!(debouncer.cancel(), Some(7));
        assert_eq!(debouncer.poll(start + Duration::from_secs(1)), None);
    }
}
