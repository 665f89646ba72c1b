// SPDX-License-Identifier: MIT
//
// Points and sizes.
//
// Coordinates are `(y, x)`, row first, matching how the canvas is
// indexed. Points are signed so a gadget can sit partially off-screen
// (scrolled content, windows dragged past the left edge). Sizes are
// unsigned: a negative extent is not representable.

use std::ops::{Add, Sub};

// ─── Point ──────────────────────────────────────────────────────────────────

/// A position on the integer grid, row first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    /// Row.
    pub y: i32,
    /// Column.
    pub x: i32,
}

impl Point {
    /// The origin, `(0, 0)`.
    pub const ORIGIN: Self = Self { y: 0, x: 0 };

    #[inline]
    #[must_use]
    pub const fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.y + rhs.y, self.x + rhs.x)
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.y - rhs.y, self.x - rhs.x)
    }
}

// ─── Size ───────────────────────────────────────────────────────────────────

/// Extent of a rectangular area in cells, height first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Number of rows.
    pub height: u16,
    /// Number of columns.
    pub width: u16,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(height: u16, width: u16) -> Self {
        Self { height, width }
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn area(self) -> u32 {
        self.height as u32 * self.width as u32
    }

    /// Whether either dimension is zero.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.height == 0 || self.width == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_arithmetic() {
        let a = Point::new(3, 4);
        let b = Point::new(1, 10);
        assert_eq!(a + b, Point::new(4, 14));
        assert_eq!(a - b, Point::new(2, -6));
    }

    #[test]
    fn size_area_and_emptiness() {
        assert_eq!(Size::new(3, 7).area(), 21);
        assert!(Size::new(0, 7).is_empty());
        assert!(Size::new(7, 0).is_empty());
        assert!(!Size::new(1, 1).is_empty());
    }
}
