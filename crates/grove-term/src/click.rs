// SPDX-License-Identifier: MIT
//
// Click multiplicity.
//
// The parser reports raw button-down events. Whether a down is the second
// half of a double click depends on the previous down, so the host runs
// mouse events through a `ClickTracker` before dispatch. Counts cycle
// 1 → 2 → 3 → 1 while the same button keeps going down within the
// timeout of the previous down.

use std::time::{Duration, Instant};

use crate::input::{MouseButton, MouseEvent, MouseEventKind};

pub const DEFAULT_CLICK_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct ClickTracker {
    timeout: Duration,
    last: Option<(MouseButton, Instant)>,
    nclicks: u8,
}

impl ClickTracker {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last: None,
            nclicks: 0,
        }
    }

    #[inline]
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fill in `event.nclicks` for a down event seen at `now`.
    ///
    /// Other event kinds pass through untouched.
    pub fn track(&mut self, event: &mut MouseEvent, now: Instant) {
        if event.kind != MouseEventKind::Down {
            return;
        }
        let repeat = self.last.is_some_and(|(button, at)| {
            button == event.button && now.saturating_duration_since(at) <= self.timeout
        });
        self.nclicks = if repeat { self.nclicks % 3 + 1 } else { 1 };
        self.last = Some((event.button, now));
        event.nclicks = self.nclicks;
    }
}

impl Default for ClickTracker {
    fn default() -> Self {
        Self::new(DEFAULT_CLICK_TIMEOUT)
    }
}
