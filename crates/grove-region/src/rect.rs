// SPDX-License-Identifier: MIT
//
// Half-open integer rectangles.
//
// A `Rect` covers rows `top..bottom` and columns `left..right`. The
// bottom and right edges are excluded, so two rects that share an edge
// do not overlap and a rect with `top == bottom` is empty.
//
// Subtraction is the standard four-strip tiling: whatever is left of
// `a` after removing `a ∩ b` is described by at most a top strip, a
// bottom strip, and the left and right pieces of the middle band.

use std::ops::Range;

use crate::point::{Point, Size};

/// An axis-aligned, half-open rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub top: i32,
    pub bottom: i32,
    pub left: i32,
    pub right: i32,
}

/// Array index ranges produced by [`Rect::to_slices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slices {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Rect {
    /// Build a rect from its four edges.
    ///
    /// Inverted edges are a caller bug and trip a debug assertion.
    #[inline]
    #[must_use]
    pub const fn new(top: i32, bottom: i32, left: i32, right: i32) -> Self {
        debug_assert!(top <= bottom && left <= right, "inverted rect");
        Self {
            top,
            bottom,
            left,
            right,
        }
    }

    /// Build a rect from its top-left corner and size.
    #[inline]
    #[must_use]
    pub const fn from_pos_size(pos: Point, size: Size) -> Self {
        Self {
            top: pos.y,
            bottom: pos.y + size.height as i32,
            left: pos.x,
            right: pos.x + size.width as i32,
        }
    }

    #[inline]
    #[must_use]
    pub const fn pos(&self) -> Point {
        Point::new(self.top, self.left)
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom - self.top
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Number of cells covered.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub const fn area(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            self.height() as u64 * self.width() as u64
        }
    }

    /// Whether the rect covers no cells.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.top >= self.bottom || self.left >= self.right
    }

    #[inline]
    #[must_use]
    pub const fn contains(&self, point: Point) -> bool {
        self.top <= point.y && point.y < self.bottom && self.left <= point.x && point.x < self.right
    }

    /// Whether the two rects share at least one cell.
    #[inline]
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.top < other.bottom
            && other.top < self.bottom
            && self.left < other.right
            && other.left < self.right
    }

    /// The cells common to both rects, or `None` if they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Self {
            top: self.top.max(other.top),
            bottom: self.bottom.min(other.bottom),
            left: self.left.max(other.left),
            right: self.right.min(other.right),
        })
    }

    /// The cells of `self` not in `other`, as at most four disjoint strips.
    ///
    /// Strips are yielded top, bottom, left, right. Empty strips are
    /// skipped, so disjoint inputs yield `self` unchanged.
    pub fn subtract(&self, other: &Self) -> impl Iterator<Item = Self> + use<> {
        let strips = match self.intersection(other) {
            None => [Some(*self), None, None, None],
            Some(i) => [
                (self.top < i.top).then(|| Self::new(self.top, i.top, self.left, self.right)),
                (i.bottom < self.bottom)
                    .then(|| Self::new(i.bottom, self.bottom, self.left, self.right)),
                (self.left < i.left).then(|| Self::new(i.top, i.bottom, self.left, i.left)),
                (i.right < self.right).then(|| Self::new(i.top, i.bottom, i.right, self.right)),
            ],
        };
        strips.into_iter().flatten().filter(|r| !r.is_empty())
    }

    /// Translate so that `origin` becomes `(0, 0)`.
    #[inline]
    #[must_use]
    pub const fn offset(&self, origin: Point) -> Self {
        Self {
            top: self.top - origin.y,
            bottom: self.bottom - origin.y,
            left: self.left - origin.x,
            right: self.right - origin.x,
        }
    }

    /// Index ranges addressing this rect in a row-major 2-D array.
    ///
    /// With `Some(origin)`, the rect is first translated into the local
    /// coordinates of an array whose top-left sits at `origin`. This maps a
    /// screen-space paint rect back into a texture.
    ///
    /// # Panics
    ///
    /// Panics if the (translated) rect has a negative edge. That means the
    /// caller is addressing cells outside the array.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn to_slices(&self, offset: Option<Point>) -> Slices {
        let r = offset.map_or(*self, |origin| self.offset(origin));
        assert!(
            r.top >= 0 && r.left >= 0 && r.top <= r.bottom && r.left <= r.right,
            "rect {r:?} does not address a valid array window"
        );
        Slices {
            rows: r.top as usize..r.bottom as usize,
            cols: r.left as usize..r.right as usize,
        }
    }
}
