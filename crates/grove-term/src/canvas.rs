// SPDX-License-Identifier: MIT
//
// Canvas: a 2-D grid of cells.
//
// Storage is a flat `Vec<Cell>` in row-major order, so a row is a
// contiguous slice and `index = y * width + x`. Indexing with `[(y, x)]`
// is bounds-checked and panics out of range: a painter addressing cells
// outside the grid is a geometry bug, not a runtime condition.
//
// The paint helpers take a `clip` rect in canvas coordinates. Painters
// receive one clip per rect of their assigned region, so nothing they
// draw can land outside it. Clips are intersected with the canvas
// bounds first.
//
// Wide glyphs: `paint_text` writes the glyph and a continuation cell.
// When the clip edge would split a glyph, the visible half is painted
// as a space instead.

use std::ops::{Index, IndexMut};

use grove_region::{Point, Rect, Size};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

use crate::cell::{Cell, Style};
use crate::color::Rgb;

#[derive(Clone, PartialEq, Eq)]
pub struct Canvas {
    size: Size,
    cells: Vec<Cell>,
}

impl Canvas {
    // ─── Construction ────────────────────────────────────────────────────

    /// A canvas of `size` with every cell set to `fill`.
    #[must_use]
    pub fn new(size: Size, fill: Cell) -> Self {
        Self {
            size,
            cells: vec![fill; size.area() as usize],
        }
    }

    /// Reallocate to `size`, discarding content.
    pub fn resize(&mut self, size: Size, fill: Cell) {
        self.size = size;
        self.cells.clear();
        self.cells.resize(size.area() as usize, fill);
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.size.height as usize
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.size.width as usize
    }

    /// The whole canvas as a rect at the origin.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::from_pos_size(Point::ORIGIN, self.size)
    }

    #[inline]
    const fn idx(&self, y: usize, x: usize) -> usize {
        y * self.width() + x
    }

    #[inline]
    #[must_use]
    pub fn get(&self, y: usize, x: usize) -> Option<&Cell> {
        if y < self.height() && x < self.width() {
            Some(&self.cells[self.idx(y, x)])
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self, y: usize, x: usize) -> Option<&mut Cell> {
        if y < self.height() && x < self.width() {
            let idx = self.idx(y, x);
            Some(&mut self.cells[idx])
        } else {
            None
        }
    }

    /// Row `y` as a slice. Panics if `y` is out of range.
    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> &[Cell] {
        let start = self.idx(y, 0);
        &self.cells[start..start + self.width()]
    }

    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    // ─── Painting ────────────────────────────────────────────────────────

    /// Set every cell to `cell`.
    pub fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    /// Set every cell of `rect` (clipped to the canvas) to `cell`.
    pub fn fill_rect(&mut self, rect: Rect, cell: Cell) {
        let Some(rect) = rect.intersection(&self.bounds()) else {
            return;
        };
        let s = rect.to_slices(None);
        for y in s.rows {
            let start = self.idx(y, s.cols.start);
            let end = self.idx(y, s.cols.end);
            self.cells[start..end].fill(cell);
        }
    }

    /// Paint one line of text starting at `pos`, constrained to `clip`.
    ///
    /// Text is split into grapheme clusters; each cluster takes the cell
    /// of its first codepoint and one or two columns by that codepoint's
    /// width. Zero-width clusters are skipped.
    ///
    /// Returns the number of columns the full text spans from `pos`,
    /// regardless of clipping.
    pub fn paint_text(
        &mut self,
        pos: Point,
        text: &str,
        style: Style,
        fg: Rgb,
        bg: Rgb,
        clip: Rect,
    ) -> usize {
        self.paint_text_masked(pos, text, style, fg, bg, |p| clip.contains(p))
    }

    /// [`paint_text`](Self::paint_text) with the writable cells decided by
    /// `writable` instead of a single rect. A wide glyph is kept whole when
    /// both of its columns are writable, wherever they fall; when only one
    /// is, that column gets a space. Cells off the canvas are never written.
    #[allow(clippy::cast_sign_loss)]
    pub fn paint_text_masked(
        &mut self,
        pos: Point,
        text: &str,
        style: Style,
        fg: Rgb,
        bg: Rgb,
        writable: impl Fn(Point) -> bool,
    ) -> usize {
        let bounds = self.bounds();
        let inside = |x: i32| {
            let p = Point::new(pos.y, x);
            bounds.contains(p) && writable(p)
        };
        let mut col = pos.x;

        for grapheme in text.graphemes(true) {
            let Some(ch) = grapheme.chars().next() else {
                continue;
            };
            let w = match ch.width().unwrap_or(0) {
                0 => continue,
                1 => 1,
                _ => 2,
            };
            let x = col;
            col += w;

            let y = pos.y as usize;
            let glyph = Cell::styled(ch, style, fg, bg);

            if w == 1 {
                if inside(x) {
                    let idx = self.idx(y, x as usize);
                    self.cells[idx] = glyph;
                }
                continue;
            }

            match (inside(x), inside(x + 1)) {
                (true, true) => {
                    let idx = self.idx(y, x as usize);
                    self.cells[idx] = glyph;
                    self.cells[idx + 1] = Cell::continuation_of(&glyph);
                }
                (true, false) => {
                    let idx = self.idx(y, x as usize);
                    self.cells[idx] = glyph.with_char(' ');
                }
                (false, true) => {
                    let idx = self.idx(y, (x + 1) as usize);
                    self.cells[idx] = glyph.with_char(' ');
                }
                (false, false) => {}
            }
        }

        (col - pos.x) as usize
    }

    /// Copy the cells of `dst` from `src`, where `src`'s top-left corner
    /// sits at `src_origin` in this canvas's coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `dst` is not inside this canvas or the corresponding
    /// window is not inside `src`.
    pub fn copy_from(&mut self, src: &Self, dst: Rect, src_origin: Point) {
        if dst.is_empty() {
            return;
        }
        let to = dst.to_slices(None);
        let from = dst.to_slices(Some(src_origin));
        assert!(
            to.rows.end <= self.height() && to.cols.end <= self.width(),
            "destination {dst:?} escapes canvas of size {:?}",
            self.size
        );
        assert!(
            from.rows.end <= src.height() && from.cols.end <= src.width(),
            "source window {from:?} escapes texture of size {:?}",
            src.size
        );
        for (dy, sy) in to.rows.zip(from.rows) {
            let d = self.idx(dy, to.cols.start);
            let s = src.idx(sy, from.cols.start);
            let n = to.cols.len();
            self.cells[d..d + n].copy_from_slice(&src.cells[s..s + n]);
        }
    }
}

impl Index<(usize, usize)> for Canvas {
    type Output = Cell;

    fn index(&self, (y, x): (usize, usize)) -> &Cell {
        assert!(
            y < self.height() && x < self.width(),
            "cell ({y}, {x}) outside canvas of size {:?}",
            self.size
        );
        &self.cells[self.idx(y, x)]
    }
}

impl IndexMut<(usize, usize)> for Canvas {
    fn index_mut(&mut self, (y, x): (usize, usize)) -> &mut Cell {
        assert!(
            y < self.height() && x < self.width(),
            "cell ({y}, {x}) outside canvas of size {:?}",
            self.size
        );
        let idx = self.idx(y, x);
        &mut self.cells[idx]
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Canvas({}x{})", self.size.height, self.size.width)
    }
}

/// Display width of `s` in columns, counted the way `paint_text` lays it out.
#[must_use]
pub fn text_width(s: &str) -> usize {
    s.graphemes(true)
        .filter_map(|g| g.chars().next())
        .map(|c| c.width().unwrap_or(0).min(2))
        .sum()
}
