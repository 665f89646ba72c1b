// SPDX-License-Identifier: MIT
//
// Painting.
//
// A node's painter never sees the whole screen. It gets a `CanvasView`:
// the frame canvas plus the region the compositor assigned to the node,
// and every write through the view is clipped to that region. Painters
// speak in node-local coordinates; the view adds the node's absolute
// position.

use grove_region::{Point, Rect, Region, Size};
use grove_term::{Canvas, Cell, Rgb, Style};

/// Something that can paint a node's cells.
pub trait Paintable {
    fn paint(&self, view: &mut CanvasView<'_>);
}

/// The part of the frame canvas one node may write to.
pub struct CanvasView<'a> {
    canvas: &'a mut Canvas,
    region: &'a Region,
    origin: Point,
    size: Size,
}

impl<'a> CanvasView<'a> {
    /// `origin` is the node's absolute position and `size` its extent;
    /// `region` is in absolute coordinates.
    pub const fn new(canvas: &'a mut Canvas, region: &'a Region, origin: Point, size: Size) -> Self {
        Self {
            canvas,
            region,
            origin,
            size,
        }
    }

    #[inline]
    #[must_use]
    pub const fn origin(&self) -> Point {
        self.origin
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn region(&self) -> &Region {
        self.region
    }

    /// The region's rects that land on the canvas.
    fn visible_rects(&self) -> impl Iterator<Item = Rect> + '_ {
        let bounds = self.canvas.bounds();
        self.region.rects().filter_map(move |r| r.intersection(&bounds))
    }

    /// Fill every writable cell.
    pub fn fill(&mut self, cell: Cell) {
        let rects: Vec<Rect> = self.visible_rects().collect();
        for rect in rects {
            self.canvas.fill_rect(rect, cell);
        }
    }

    /// Set one cell at node-local `pos`, if it is writable.
    pub fn set(&mut self, pos: Point, cell: Cell) {
        let abs = self.origin + pos;
        if !self.region.contains(abs) {
            return;
        }
        #[allow(clippy::cast_sign_loss)]
        if let Some(slot) = self.canvas.get_mut(abs.y as usize, abs.x as usize) {
            *slot = cell;
        }
    }

    /// Paint a line of text at node-local `pos`. Returns the columns the
    /// text spans, clipped or not.
    pub fn paint_text(&mut self, pos: Point, text: &str, style: Style, fg: Rgb, bg: Rgb) -> usize {
        let abs = self.origin + pos;
        let region = self.region;
        self.canvas
            .paint_text_masked(abs, text, style, fg, bg, |p| region.contains(p))
    }

    /// Copy `texture` with its top-left corner at node-local `pos`.
    pub fn blit(&mut self, texture: &Canvas, pos: Point) {
        let abs = self.origin + pos;
        let extent = Rect::from_pos_size(abs, texture.size());
        let rects: Vec<Rect> = self
            .visible_rects()
            .filter_map(|r| r.intersection(&extent))
            .collect();
        for rect in rects {
            self.canvas.copy_from(texture, rect, abs);
        }
    }
}

// ─── Painters ───────────────────────────────────────────────────────────────

/// Solid fill.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    pub cell: Cell,
}

impl Fill {
    #[must_use]
    pub const fn new(cell: Cell) -> Self {
        Self { cell }
    }
}

impl Paintable for Fill {
    fn paint(&self, view: &mut CanvasView<'_>) {
        view.fill(self.cell);
    }
}

/// Blits an owned canvas at the node's origin.
#[derive(Debug, Clone)]
pub struct Texture {
    pub canvas: Canvas,
}

impl Texture {
    #[must_use]
    pub const fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }
}

impl Paintable for Texture {
    fn paint(&self, view: &mut CanvasView<'_>) {
        view.blit(&self.canvas, Point::ORIGIN);
    }
}

/// One line of styled text over a background fill.
#[derive(Debug, Clone)]
pub struct Label {
    pub text: String,
    pub style: Style,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Label {
    pub fn new(text: impl Into<String>, fg: Rgb, bg: Rgb) -> Self {
        Self {
            text: text.into(),
            style: Style::empty(),
            fg,
            bg,
        }
    }

    #[must_use]
    pub const fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }
}

impl Paintable for Label {
    fn paint(&self, view: &mut CanvasView<'_>) {
        view.fill(Cell::new(' ', self.fg, self.bg));
        view.paint_text(Point::ORIGIN, &self.text, self.style, self.fg, self.bg);
    }
}
