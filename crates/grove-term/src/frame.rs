// SPDX-License-Identifier: MIT
//
// FrameBuffers: the current and previous frame.
//
// Each frame the buffers are swapped (current becomes previous) and the
// new current is cleared to the background cell and repainted. Emission
// then diffs current against previous.
//
// Sizing is a small state machine:
//
//   sized ──request_resize──▶ resize-pending ──apply_resize──▶ sized
//
// The host records a size change as soon as it sees one (SIGWINCH);
// the compositor applies it at the start of its next pass, so buffers
// never change shape mid-paint. Applying a resize reallocates both
// buffers and sets the `resized` flag, which makes the next emission
// repaint every cell. The flag is cleared once that frame is emitted.
//
// The emission target (alternate screen or inline) is kept here too,
// along with the inline origin the terminal last reported.

use std::io::{self, Write};
use std::mem;

use grove_region::{Point, Size};

use crate::canvas::Canvas;
use crate::cell::Cell;
use crate::diff::{self, RenderStats, Target};

pub struct FrameBuffers {
    current: Canvas,
    previous: Canvas,
    background: Cell,
    resized: bool,
    pending: Option<Size>,
    target: Target,
}

impl FrameBuffers {
    /// Buffers of `size` cleared to `background`.
    ///
    /// Starts with `resized` set: nothing is on screen yet, so the first
    /// emission is a full repaint.
    #[must_use]
    pub fn new(size: Size, background: Cell) -> Self {
        Self {
            current: Canvas::new(size, background),
            previous: Canvas::new(size, background),
            background,
            resized: true,
            pending: None,
            target: Target::AltScreen,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.current.size()
    }

    #[inline]
    #[must_use]
    pub const fn background(&self) -> Cell {
        self.background
    }

    /// Change the cell frames are cleared to. Takes effect next frame.
    pub const fn set_background(&mut self, background: Cell) {
        self.background = background;
    }

    #[inline]
    #[must_use]
    pub const fn current(&self) -> &Canvas {
        &self.current
    }

    #[inline]
    pub const fn current_mut(&mut self) -> &mut Canvas {
        &mut self.current
    }

    #[inline]
    #[must_use]
    pub const fn previous(&self) -> &Canvas {
        &self.previous
    }

    /// Whether the next emission repaints every cell.
    #[inline]
    #[must_use]
    pub const fn resized(&self) -> bool {
        self.resized
    }

    /// Force the next emission to repaint everything (e.g. after the
    /// screen was cleared behind our back).
    pub const fn invalidate(&mut self) {
        self.resized = true;
    }

    // ─── Target ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn target(&self) -> Target {
        self.target
    }

    /// Switch targets. The next emission repaints everything.
    pub const fn set_target(&mut self, target: Target) {
        self.target = target;
        self.resized = true;
    }

    /// Where the inline frame's top-left cell is on screen, if known.
    #[inline]
    #[must_use]
    pub const fn inline_origin(&self) -> Option<Point> {
        match self.target {
            Target::Inline { origin } => origin,
            Target::AltScreen => None,
        }
    }

    /// Record where the inline frame starts. Ignored on the alternate
    /// screen.
    pub const fn set_inline_origin(&mut self, origin: Point) {
        if let Target::Inline { origin: current } = &mut self.target {
            *current = Some(origin);
        }
    }

    // ─── Resize ──────────────────────────────────────────────────────────

    /// Record a new terminal size to be applied by [`apply_resize`].
    ///
    /// [`apply_resize`]: Self::apply_resize
    pub const fn request_resize(&mut self, size: Size) {
        self.pending = Some(size);
    }

    #[inline]
    #[must_use]
    pub const fn resize_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Apply a pending resize. Returns whether one was applied.
    pub fn apply_resize(&mut self) -> bool {
        let Some(size) = self.pending.take() else {
            return false;
        };
        self.on_resize(size);
        true
    }

    /// Reallocate both buffers to `size`, clear them, and mark the next
    /// frame as a full repaint.
    pub fn on_resize(&mut self, size: Size) {
        tracing::debug!(height = size.height, width = size.width, "frame buffers resized");
        self.current.resize(size, self.background);
        self.previous.resize(size, self.background);
        self.pending = None;
        self.resized = true;
    }

    // ─── Frame cycle ─────────────────────────────────────────────────────

    /// Make the current frame the previous one and clear the new current
    /// frame to the background.
    pub fn swap_and_clear(&mut self) {
        mem::swap(&mut self.current, &mut self.previous);
        self.current.fill(self.background);
    }

    /// Cells that differ between the frames, row-major.
    pub fn changed_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        diff::changed_cells(&self.current, &self.previous, self.resized)
    }

    /// Emit the changed cells to `w` and clear the `resized` flag.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `w`. The `resized` flag is left set on
    /// error so the next attempt repaints everything.
    pub fn emit(&mut self, w: &mut impl Write) -> io::Result<RenderStats> {
        let stats = diff::emit(&self.current, &self.previous, self.resized, self.target, w)?;
        self.resized = false;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn frames(height: u16, width: u16) -> FrameBuffers {
        FrameBuffers::new(Size::new(height, width), Cell::BLANK)
    }

    #[test]
    fn first_frame_repaints_everything() {
        let f = frames(2, 3);
        assert!(f.resized());
        assert_eq!(f.changed_cells().count(), 6);
    }

    #[test]
    fn swap_moves_current_to_previous() {
        let mut f = frames(1, 2);
        f.current_mut()[(0, 0)] = Cell::BLANK.with_char('a');
        f.swap_and_clear();
        assert_eq!(f.previous()[(0, 0)].character(), Some('a'));
        assert_eq!(f.current()[(0, 0)], Cell::BLANK);
    }

    #[test]
    fn single_changed_cell_in_three_by_three() {
        let mut f = frames(3, 3);
        let mut sink = Vec::new();
        f.emit(&mut sink).unwrap();
        assert!(!f.resized());

        f.swap_and_clear();
        f.current_mut()[(1, 1)] = Cell::BLANK.with_char('X');
        let changed: Vec<_> = f.changed_cells().collect();
        assert_eq!(changed, vec![(1, 1)]);
    }

    #[test]
    fn resize_goes_through_pending_state() {
        let mut f = frames(2, 2);
        f.emit(&mut Vec::new()).unwrap();

        f.request_resize(Size::new(4, 5));
        assert!(f.resize_pending());
        assert_eq!(f.size(), Size::new(2, 2));

        assert!(f.apply_resize());
        assert!(!f.resize_pending());
        assert_eq!(f.size(), Size::new(4, 5));
        assert_eq!(f.previous().size(), Size::new(4, 5));
        assert!(f.resized());
        assert_eq!(f.changed_cells().count(), 20);

        assert!(!f.apply_resize());
    }

    #[test]
    fn inline_origin_only_sticks_to_inline_target() {
        let mut f = frames(2, 2);
        f.set_inline_origin(Point::new(4, 0));
        assert_eq!(f.inline_origin(), None);

        f.emit(&mut Vec::new()).unwrap();
        f.set_target(Target::Inline { origin: None });
        assert!(f.resized());
        f.set_inline_origin(Point::new(4, 0));
        assert_eq!(f.inline_origin(), Some(Point::new(4, 0)));
        assert_eq!(f.target(), Target::Inline { origin: Some(Point::new(4, 0)) });
    }

    #[test]
    fn inline_emission_is_relative() {
        let mut f = frames(2, 3);
        f.set_target(Target::Inline { origin: Some(Point::new(7, 0)) });
        let mut full = Vec::new();
        let stats = f.emit(&mut full).unwrap();
        assert!(stats.origin_requested);

        f.swap_and_clear();
        f.current_mut()[(1, 2)] = Cell::BLANK.with_char('x');
        let mut out = Vec::new();
        let stats = f.emit(&mut out).unwrap();
        assert!(!stats.origin_requested);
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("\x1b[?2026h\x1b7\x1b[8;1H\x1b[1B\x1b[3G"));
    }

    #[test]
    fn background_change_applies_on_next_clear() {
        let mut f = frames(1, 1);
        let bg = Cell::BLANK.with_char('.');
        f.set_background(bg);
        assert_eq!(f.current()[(0, 0)], Cell::BLANK);
        f.swap_and_clear();
        assert_eq!(f.current()[(0, 0)], bg);
    }
}
