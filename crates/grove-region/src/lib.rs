// SPDX-License-Identifier: MIT
//
// grove-region: integer geometry for the grove compositor.
//
// Every gadget in a grove tree is assigned a `Region`: the exact set of
// screen cells it is responsible for painting this frame. Regions are
// built from half-open `Rect`s and combined with set algebra (`|`, `&`,
// `-`, `^`). The compositor uses intersection to clip children to their
// parents and subtraction to remove cells covered by opaque gadgets
// drawn in front.
//
// No bitmaps. A region is a list of non-overlapping rects, so a mostly
// rectangular screen area costs a handful of rects no matter how large
// it is.

pub mod point;
pub mod rect;
pub mod region;

pub use point::{Point, Size};
pub use rect::{Rect, Slices};
pub use region::Region;
