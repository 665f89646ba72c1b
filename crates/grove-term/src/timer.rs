// SPDX-License-Identifier: MIT
//
// One-shot deadline timer.
//
// The parser needs "resolve this escape if nothing else arrives within
// N ms". There is no runtime here to schedule a callback, so the timer
// is just a stored deadline: the host asks for `deadline()` to size its
// wait, and calls back into the parser when the wait expires. Arming
// replaces any previous deadline, so at most one is ever pending.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline: None }
    }

    /// Arm to fire `after` from `now`, replacing any pending deadline.
    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    pub const fn cancel(&mut self) {
        self.deadline = None;
    }

    #[inline]
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// If the deadline has passed at `now`, disarm and return `true`.
    pub fn fire(&mut self, now: Instant) -> bool {
        if self.deadline.is_some_and(|d| now >= d) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.arm(t0, 50 * MS);
        assert!(!timer.fire(t0 + 49 * MS));
        assert!(timer.fire(t0 + 50 * MS));
        assert!(!timer.fire(t0 + 100 * MS));
        assert!(!timer.is_armed());
    }

    #[test]
    fn rearm_replaces_deadline() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.arm(t0, 10 * MS);
        timer.arm(t0 + 5 * MS, 10 * MS);
        assert_eq!(timer.deadline(), Some(t0 + 15 * MS));
        assert!(!timer.fire(t0 + 12 * MS));
    }

    #[test]
    fn cancel_disarms() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.arm(t0, MS);
        timer.cancel();
        assert!(!timer.fire(t0 + 10 * MS));
    }
}
