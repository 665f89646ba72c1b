// SPDX-License-Identifier: MIT
//
// Regions: sets of cells described by non-overlapping rects.
//
// Invariant: `rects` never holds an empty rect and no two rects share a
// cell. Every constructor and operator preserves this, so `area()` is a
// plain sum and emptiness is `rects.is_empty()`.
//
// Intersection is pairwise rect intersection (disjoint inputs give
// disjoint outputs). Difference subtracts each rect of the right side
// from every remaining piece of the left side. Union is
// `self ∪ (other − self)`, which is disjoint by construction, followed
// by a coalescing pass that merges rects sharing a full edge.
//
// Equality compares point sets, not tilings: two regions built in
// different orders compare equal when they cover the same cells.

use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use crate::point::{Point, Size};
use crate::rect::Rect;

#[derive(Debug, Clone, Default)]
pub struct Region {
    rects: Vec<Rect>,
}

impl Region {
    /// A region covering nothing.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { rects: Vec::new() }
    }

    /// A region covering exactly one rect. Empty if `size` has no area.
    #[must_use]
    pub fn from_rect(pos: Point, size: Size) -> Self {
        Self::from(Rect::from_pos_size(pos, size))
    }

    /// Build a region from arbitrary, possibly overlapping rects.
    pub fn from_rects(rects: impl IntoIterator<Item = Rect>) -> Self {
        rects
            .into_iter()
            .fold(Self::empty(), |acc, rect| acc | Self::from(rect))
    }

    /// The rects tiling this region.
    ///
    /// Order is unspecified but fixed for a given region value. The
    /// iterator is `Clone`, so it can be restarted.
    pub fn rects(&self) -> impl Iterator<Item = Rect> + Clone + '_ {
        self.rects.iter().copied()
    }

    /// Number of rects in the tiling.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of cells covered.
    #[must_use]
    pub fn area(&self) -> u64 {
        self.rects.iter().map(Rect::area).sum()
    }

    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.rects.iter().any(|r| r.contains(point))
    }

    /// Smallest rect enclosing the whole region, `None` when empty.
    #[must_use]
    pub fn bbox(&self) -> Option<Rect> {
        let first = *self.rects.first()?;
        Some(self.rects[1..].iter().fold(first, |acc, r| Rect {
            top: acc.top.min(r.top),
            bottom: acc.bottom.max(r.bottom),
            left: acc.left.min(r.left),
            right: acc.right.max(r.right),
        }))
    }

    // ─── Set algebra ────────────────────────────────────────────────────

    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut rects = Vec::new();
        for a in &self.rects {
            for b in &other.rects {
                if let Some(i) = a.intersection(b) {
                    rects.push(i);
                }
            }
        }
        Self { rects }
    }

    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        let mut rects = self.rects.clone();
        for b in &other.rects {
            if rects.is_empty() {
                break;
            }
            rects = rects.iter().flat_map(|a| a.subtract(b)).collect();
        }
        Self {
            rects: coalesce(rects),
        }
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        let mut rects = self.rects.clone();
        rects.extend(other.difference(self).rects);
        Self {
            rects: coalesce(rects),
        }
    }

    #[must_use]
    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut rects = self.difference(other).rects;
        rects.extend(other.difference(self).rects);
        Self {
            rects: coalesce(rects),
        }
    }
}

impl From<Rect> for Region {
    fn from(rect: Rect) -> Self {
        if rect.is_empty() {
            Self::empty()
        } else {
            Self { rects: vec![rect] }
        }
    }
}

impl PartialEq for Region {
    fn eq(&self, other: &Self) -> bool {
        self.area() == other.area() && self.difference(other).is_empty()
    }
}

impl Eq for Region {}

/// Merge rects that share a full edge until no pair can be merged.
///
/// Each pass sorts once per direction and merges neighbours in a single
/// sweep: first runs within a band (same top and bottom), then stacks
/// within a column (same left and right). A vertical merge can line two
/// rects up for a horizontal one, so passes repeat until nothing shrinks.
///
/// Input must already be disjoint; merging two disjoint rects that
/// exactly abut keeps the set disjoint.
fn coalesce(mut rects: Vec<Rect>) -> Vec<Rect> {
    loop {
        let before = rects.len();
        rects = merge_columns(merge_bands(rects));
        if rects.len() == before {
            return rects;
        }
    }
}

fn merge_bands(mut rects: Vec<Rect>) -> Vec<Rect> {
    rects.sort_unstable_by_key(|r| (r.top, r.bottom, r.left));
    let mut out: Vec<Rect> = Vec::with_capacity(rects.len());
    for r in rects {
        match out.last_mut() {
            Some(last) if last.top == r.top && last.bottom == r.bottom && last.right == r.left => {
                last.right = r.right;
            }
            _ => out.push(r),
        }
    }
    out
}

fn merge_columns(mut rects: Vec<Rect>) -> Vec<Rect> {
    rects.sort_unstable_by_key(|r| (r.left, r.right, r.top));
    let mut out: Vec<Rect> = Vec::with_capacity(rects.len());
    for r in rects {
        match out.last_mut() {
            Some(last) if last.left == r.left && last.right == r.right && last.bottom == r.top => {
                last.bottom = r.bottom;
            }
            _ => out.push(r),
        }
    }
    out
}

// ─── Operators ──────────────────────────────────────────────────────────────

macro_rules! region_op {
    ($op:ident, $method:ident, $assign:ident, $assign_method:ident, $impl:ident) => {
        impl $op<&Region> for &Region {
            type Output = Region;

            fn $method(self, rhs: &Region) -> Region {
                self.$impl(rhs)
            }
        }

        impl $op<&Region> for Region {
            type Output = Region;

            fn $method(self, rhs: &Region) -> Region {
                self.$impl(rhs)
            }
        }

        impl $op for Region {
            type Output = Region;

            fn $method(self, rhs: Region) -> Region {
                self.$impl(&rhs)
            }
        }

        impl $assign<&Region> for Region {
            fn $assign_method(&mut self, rhs: &Region) {
                *self = self.$impl(rhs);
            }
        }

        impl $assign for Region {
            fn $assign_method(&mut self, rhs: Region) {
                *self = self.$impl(&rhs);
            }
        }
    };
}

region_op!(BitOr, bitor, BitOrAssign, bitor_assign, union);
region_op!(BitAnd, bitand, BitAndAssign, bitand_assign, intersection);
region_op!(Sub, sub, SubAssign, sub_assign, difference);
region_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, symmetric_difference);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rect(top: i32, bottom: i32, left: i32, right: i32) -> Region {
        Region::from(Rect::new(top, bottom, left, right))
    }

    fn assert_disjoint(region: &Region) {
        let rects: Vec<_> = region.rects().collect();
        for (i, a) in rects.iter().enumerate() {
            assert!(!a.is_empty(), "empty rect {a:?} in tiling");
            for b in &rects[i + 1..] {
                assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
            }
        }
    }

    // ── Construction ──

    #[test]
    fn from_rect_with_zero_size_is_empty() {
        assert!(Region::from_rect(Point::new(4, 4), Size::new(0, 10)).is_empty());
        assert!(Region::from_rect(Point::new(4, 4), Size::new(10, 0)).is_empty());
        assert_eq!(
            Region::from_rect(Point::new(1, 2), Size::new(3, 4)).area(),
            12
        );
    }

    #[test]
    fn from_rects_merges_overlaps() {
        let region = Region::from_rects([
            Rect::new(0, 4, 0, 4),
            Rect::new(2, 6, 2, 6),
            Rect::new(0, 4, 0, 4),
        ]);
        assert_disjoint(&region);
        assert_eq!(region.area(), 16 + 16 - 4);
    }

    // ── Identities ──

    #[test]
    fn union_with_empty_is_identity() {
        let a = rect(1, 5, 2, 9);
        assert_eq!(&a | &Region::empty(), a);
        assert_eq!(&Region::empty() | &a, a);
    }

    #[test]
    fn self_intersection_is_identity() {
        let a = rect(0, 3, 0, 3) | rect(5, 8, 5, 8);
        assert_eq!(&a & &a, a);
    }

    #[test]
    fn self_difference_is_empty() {
        let a = rect(0, 3, 0, 3) | rect(2, 8, 1, 5);
        assert!((&a - &a).is_empty());
        assert_eq!(&a - &a, Region::empty());
    }

    #[test]
    fn xor_with_self_is_empty() {
        let a = rect(0, 3, 0, 3);
        assert!((&a ^ &a).is_empty());
    }

    // ── Algebra ──

    #[test]
    fn union_coalesces_adjacent_rects() {
        let a = rect(0, 2, 0, 5) | rect(2, 4, 0, 5);
        assert_eq!(a.len(), 1);
        assert_eq!(a.bbox(), Some(Rect::new(0, 4, 0, 5)));

        let b = rect(0, 2, 0, 3) | rect(0, 2, 3, 7);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn coalesce_repeats_until_stable() {
        // The left column only lines up with the right one once its two
        // halves are stacked.
        let rects = vec![
            Rect::new(0, 1, 0, 1),
            Rect::new(1, 2, 0, 1),
            Rect::new(0, 2, 1, 2),
        ];
        assert_eq!(coalesce(rects), vec![Rect::new(0, 2, 0, 2)]);
    }

    #[test]
    fn unit_cells_coalesce_to_one_rect() {
        let cells = (0..30).flat_map(|y| (0..30).map(move |x| Rect::new(y, y + 1, x, x + 1)));
        let merged = coalesce(cells.collect());
        assert_eq!(merged, vec![Rect::new(0, 30, 0, 30)]);
    }

    #[test]
    fn punched_hole() {
        let a = rect(0, 10, 0, 10) - rect(4, 6, 4, 6);
        assert_disjoint(&a);
        assert_eq!(a.area(), 96);
        assert!(!a.contains(Point::new(4, 4)));
        assert!(!a.contains(Point::new(5, 5)));
        assert!(a.contains(Point::new(6, 6)));
        assert!(a.contains(Point::new(3, 5)));
        assert_eq!(a.bbox(), Some(Rect::new(0, 10, 0, 10)));
    }

    #[test]
    fn equality_ignores_tiling() {
        let horizontal = rect(0, 1, 0, 2) | rect(1, 2, 0, 1);
        let vertical = rect(0, 2, 0, 1) | rect(0, 1, 1, 2);
        assert_eq!(horizontal, vertical);
        assert_ne!(horizontal, rect(0, 2, 0, 2));
    }

    #[test]
    fn xor_is_union_minus_intersection() {
        let a = rect(0, 4, 0, 4);
        let b = rect(2, 6, 2, 6);
        let xor = &a ^ &b;
        assert_disjoint(&xor);
        assert_eq!(xor, (&a | &b) - (&a & &b));
        assert_eq!(xor.area(), 24);
    }

    #[test]
    fn assign_operators() {
        let mut a = rect(0, 4, 0, 4);
        a |= rect(0, 4, 4, 8);
        assert_eq!(a.area(), 32);
        a &= &rect(1, 3, 0, 8);
        assert_eq!(a.area(), 16);
        a -= rect(0, 10, 0, 1);
        assert_eq!(a, rect(1, 3, 1, 8));
        a ^= rect(1, 3, 1, 8);
        assert!(a.is_empty());
    }

    #[test]
    fn rects_iterator_restarts() {
        let a = rect(0, 2, 0, 2) | rect(5, 6, 5, 6);
        let iter = a.rects();
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn empty_bbox() {
        assert_eq!(Region::empty().bbox(), None);
    }
}
