// SPDX-License-Identifier: MIT
//
// Differential emission: write only the cells that changed.
//
// A cell is changed when its codepoint, any style flag, or either color
// differs from the previous frame. After a resize every cell is changed.
// Changed cells are emitted in row-major order, each as a cursor move
// followed by a full SGR reset-and-set and the glyph:
//
//   ESC[{row+1};{col+1}H ESC[0;{1;}{3;}{4;}{9;}{53;}{7;}38;2;r;g;b;48;2;r;g;bm {char}
//
// Every cell carries its complete style, so emission order never
// matters and no terminal state leaks between cells.
//
// Two corrections keep wide glyphs intact:
//
//   - A changed continuation cell re-emits the wide glyph to its left.
//     If the left cell is not wide, the diff clipped a glyph and a space
//     is emitted in place of the sentinel. When the glyph itself was
//     just written it is not written again.
//   - A wide glyph whose right neighbour is not the sentinel has been
//     split; it is emitted as a space.
//
// The frame is wrapped in save/restore cursor (`ESC 7` / `ESC 8`) and
// synchronized output (`CSI ?2026h` / `CSI ?2026l`). A frame with no
// changed cells writes nothing.
//
// Inline frames live below the shell prompt instead of on the alternate
// screen, so rows are addressed relative to an origin: `CSI {n}B` down
// from the previous changed row, `CSI {x+1}G` to the column. A full
// repaint first clears below the origin and feeds one line per row so
// the terminal scrolls enough room into view, moves back up with
// `CSI {h}F`, and asks for a cursor position report there: if the feed
// scrolled, the origin moved, and the report says where to.

use std::io::{self, Write};

use grove_region::Point;

use crate::ansi;
use crate::canvas::Canvas;
use crate::cell::Cell;

// ─── Target ──────────────────────────────────────────────────────────────────

/// Where frames are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    /// The alternate screen, addressed absolutely from its top-left.
    #[default]
    AltScreen,
    /// Rows below the prompt. `origin` is the screen position of the
    /// frame's top-left cell; `None` until the terminal has reported it,
    /// in which case the frame starts wherever the cursor is.
    Inline { origin: Option<Point> },
}

impl Target {
    #[inline]
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        matches!(self, Self::Inline { .. })
    }
}

// ─── RenderStats ─────────────────────────────────────────────────────────────

/// Counters from one emission, for profiling and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    /// Changed cells that were written.
    pub cells_rendered: usize,
    /// Unchanged cells that were skipped.
    pub cells_skipped: usize,
    /// Bytes written, including the frame wrapper.
    pub bytes_written: usize,
    /// The frame asked for a cursor position report to find the inline
    /// origin again.
    pub origin_requested: bool,
}

impl RenderStats {
    #[inline]
    #[must_use]
    pub const fn total_cells(&self) -> usize {
        self.cells_rendered + self.cells_skipped
    }
}

// ─── Diff ────────────────────────────────────────────────────────────────────

/// Coordinates `(y, x)` of cells that differ between `current` and
/// `previous`, row-major. With `full`, every cell of `current`.
///
/// # Panics
///
/// Panics if `full` is false and the canvases differ in shape.
pub fn changed_cells<'a>(
    current: &'a Canvas,
    previous: &'a Canvas,
    full: bool,
) -> impl Iterator<Item = (usize, usize)> + 'a {
    assert!(
        full || current.size() == previous.size(),
        "frame shape mismatch: {:?} vs {:?}",
        current.size(),
        previous.size()
    );
    let width = current.width().max(1);
    current
        .cells()
        .iter()
        .enumerate()
        .filter(move |&(i, cell)| full || previous.cells()[i] != *cell)
        .map(move |(i, _)| (i / width, i % width))
}

/// The cell to write when `(y, x)` is reported as changed, and the
/// column to write it at.
fn resolve_wide(canvas: &Canvas, y: usize, x: usize) -> (usize, Cell) {
    let cell = canvas[(y, x)];
    if cell.is_continuation() {
        if x > 0 {
            let owner = canvas[(y, x - 1)];
            if owner.is_wide() {
                return (x - 1, owner);
            }
        }
        return (x, cell.with_char(' '));
    }
    if cell.is_wide() {
        let split = canvas
            .get(y, x + 1)
            .is_none_or(|right| !right.is_continuation());
        if split {
            return (x, cell.with_char(' '));
        }
    }
    (x, cell)
}

/// SGR and glyph of one cell, at wherever the cursor is.
fn write_glyph(w: &mut impl Write, cell: &Cell) -> io::Result<()> {
    ansi::sgr(w, cell.style, cell.fg, cell.bg)?;
    let ch = cell.character().unwrap_or(' ');
    let mut enc = [0u8; 4];
    w.write_all(ch.encode_utf8(&mut enc).as_bytes())
}

/// Everything written before the first cell of a frame. Returns whether
/// a cursor position report was requested.
fn begin_frame(w: &mut impl Write, target: Target, full: bool, height: usize) -> io::Result<bool> {
    ansi::begin_sync(w)?;
    ansi::save_cursor(w)?;
    let Target::Inline { origin } = target else {
        return Ok(false);
    };
    if let Some(origin) = origin {
        let y = usize::try_from(origin.y).unwrap_or(0);
        let x = usize::try_from(origin.x).unwrap_or(0);
        ansi::cursor_to(w, y, x)?;
    }
    if !full || height == 0 {
        return Ok(false);
    }
    ansi::erase_below(w)?;
    for _ in 0..height {
        w.write_all(b"\n")?;
    }
    ansi::cursor_prev_line(w, height)?;
    w.write_all(ansi::REQUEST_CURSOR_POSITION)?;
    Ok(true)
}

/// Emit every changed cell of `current` relative to `previous`.
///
/// # Errors
///
/// Propagates write errors from `w`.
///
/// # Panics
///
/// Panics if `full` is false and the canvases differ in shape.
pub fn emit(
    current: &Canvas,
    previous: &Canvas,
    full: bool,
    target: Target,
    w: &mut impl Write,
) -> io::Result<RenderStats> {
    let mut counter = CountingWriter { inner: w, count: 0 };
    let mut stats = RenderStats::default();
    let mut last: Option<(usize, usize)> = None;

    for (y, x) in changed_cells(current, previous, full) {
        let (x, cell) = resolve_wide(current, y, x);
        if last == Some((y, x)) {
            continue;
        }
        if last.is_none() {
            stats.origin_requested = begin_frame(&mut counter, target, full, current.height())?;
        }
        match target {
            Target::AltScreen => ansi::cursor_to(&mut counter, y, x)?,
            Target::Inline { .. } => {
                let last_y = last.map_or(0, |(last_y, _)| last_y);
                if y > last_y {
                    ansi::cursor_down(&mut counter, y - last_y)?;
                }
                ansi::cursor_to_column(&mut counter, x)?;
            }
        }
        write_glyph(&mut counter, &cell)?;
        last = Some((y, x));
        stats.cells_rendered += 1;
    }

    if last.is_some() {
        ansi::restore_cursor(&mut counter)?;
        ansi::end_sync(&mut counter)?;
    }

    stats.cells_skipped = current.cells().len() - stats.cells_rendered;
    stats.bytes_written = counter.count;
    tracing::trace!(
        rendered = stats.cells_rendered,
        skipped = stats.cells_skipped,
        bytes = stats.bytes_written,
        inline = target.is_inline(),
        "frame emitted"
    );
    Ok(stats)
}

/// `Write` adapter that counts bytes passed through.
struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    count: usize,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
