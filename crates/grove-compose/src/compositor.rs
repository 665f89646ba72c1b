// SPDX-License-Identifier: MIT
//
// Region compositor.
//
// One render pass:
//
//   1. Apply a pending resize to the frame buffers and the root.
//   2. If the tree changed, recompute regions. Each drawable node gets
//      its bounding rect clipped to its parent's region. In `Regions`
//      mode a front-to-back walk then hands each node only the cells no
//      opaque node in front of it already claimed.
//   3. Swap frames, clear the new one to the background.
//   4. Walk back to front and let each drawable node paint its region.
//
// `diff_and_emit` then writes only the cells that changed.
//
// In `Regions` mode no cell is painted by two opaque nodes. `Painter`
// mode skips the occlusion walk and repaints every node's clipped rect
// back to front, which is simpler and fine for a few gadgets that do not
// overlap much.

use std::io::{self, Write};

use grove_region::{Region, Size};
use grove_term::diff::RenderStats;
use grove_term::{Cell, FrameBuffers};
use tracing::trace;

use crate::tree::Tree;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Occlusion pass: each cell is assigned to at most one opaque node.
    #[default]
    Regions,
    /// No occlusion: every node repaints its clipped rect.
    Painter,
}

pub struct Compositor {
    frames: FrameBuffers,
    mode: RenderMode,
    /// Mode the current regions were computed for.
    regions_mode: Option<RenderMode>,
}

impl Compositor {
    #[must_use]
    pub fn new(size: Size, background: Cell, mode: RenderMode) -> Self {
        Self {
            frames: FrameBuffers::new(size, background),
            mode,
            regions_mode: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn frames(&self) -> &FrameBuffers {
        &self.frames
    }

    #[inline]
    pub const fn frames_mut(&mut self) -> &mut FrameBuffers {
        &mut self.frames
    }

    #[inline]
    #[must_use]
    pub const fn mode(&self) -> RenderMode {
        self.mode
    }

    pub const fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
    }

    /// Apply `size` at the start of the next render pass.
    pub const fn request_resize(&mut self, size: Size) {
        self.frames.request_resize(size);
    }

    /// Run one render pass over `tree` into the current frame.
    pub fn render(&mut self, tree: &mut Tree) {
        if self.frames.apply_resize() {
            tree.set_size(tree.root(), self.frames.size());
        }
        if !tree.regions_valid() || self.regions_mode != Some(self.mode) {
            compute_regions(tree, self.mode);
            self.regions_mode = Some(self.mode);
        }

        self.frames.swap_and_clear();
        let canvas = self.frames.current_mut();
        for id in tree.walk(tree.root()) {
            if tree.is_drawable(id) {
                tree.paint(id, canvas);
            }
        }
    }

    /// Write the cells changed since the previous frame to `w`.
    ///
    /// # Errors
    ///
    /// Propagates write errors from `w`.
    pub fn diff_and_emit(&mut self, w: &mut impl Write) -> io::Result<RenderStats> {
        self.frames.emit(w)
    }
}

/// Assign every node the cells it paints this frame.
pub fn compute_regions(tree: &mut Tree, mode: RenderMode) {
    let root = tree.root();
    let root_spec = *tree.spec(root);
    tree.set_region(root, Region::from_rect(root_spec.pos, root_spec.size));

    let order: Vec<_> = tree.walk(root).collect();
    for &id in &order {
        let region = match tree.parent(id) {
            Some(parent) if tree.is_drawable(id) => {
                let spec = tree.spec(id);
                let bounds = Region::from_rect(tree.absolute_pos(id), spec.size);
                tree.region(parent) & &bounds
            }
            _ => Region::empty(),
        };
        tree.set_region(id, region);
    }

    if mode == RenderMode::Regions {
        let mut remaining = tree.region(root).clone();
        for &id in order.iter().rev() {
            if !tree.is_drawable(id) {
                continue;
            }
            let region = tree.region(id) & &remaining;
            if !tree.spec(id).transparent {
                remaining -= &region;
            }
            tree.set_region(id, region);
        }
        tree.set_region(root, remaining);
    }

    trace!(nodes = order.len(), ?mode, "regions recomputed");
    tree.mark_regions_valid();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Fill;
    use crate::tree::GadgetSpec;
    use grove_region::Point;
    use pretty_assertions::assert_eq;

    fn spec(y: i32, x: i32, h: u16, w: u16) -> GadgetSpec {
        GadgetSpec::new(Point::new(y, x), Size::new(h, w))
    }

    fn fill(ch: char) -> Fill {
        Fill::new(Cell::BLANK.with_char(ch))
    }

    fn rows(compositor: &Compositor) -> Vec<String> {
        let canvas = compositor.frames().current();
        (0..canvas.height())
            .map(|y| {
                canvas
                    .row(y)
                    .iter()
                    .map(|c| c.character().unwrap_or('\0'))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn front_node_occludes_back_node() {
        let mut tree = Tree::new(Size::new(3, 5));
        let root = tree.root();
        let back = tree.add(root, spec(0, 0, 3, 3), fill('a'));
        let front = tree.add(root, spec(1, 1, 2, 3), fill('b'));

        let mut comp = Compositor::new(Size::new(3, 5), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);

        assert_eq!(rows(&comp), vec!["aaa  ", "abbb ", "abbb "]);
        assert_eq!(tree.region(front).area(), 6);
        assert_eq!(tree.region(back).area(), 9 - 4);
        assert!((tree.region(back) & tree.region(front)).is_empty());
        assert_eq!(tree.region(root).area(), 15 - 5 - 6);
    }

    #[test]
    fn transparent_node_does_not_occlude() {
        let mut tree = Tree::new(Size::new(1, 3));
        let root = tree.root();
        let back = tree.add(root, spec(0, 0, 1, 3), fill('a'));
        let glass = tree.add(root, spec(0, 1, 1, 1).transparent(true), fill('g'));

        let mut comp = Compositor::new(Size::new(1, 3), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);

        assert_eq!(tree.region(back).area(), 3);
        assert_eq!(tree.region(glass).area(), 1);
        assert_eq!(rows(&comp), vec!["aga"]);
    }

    #[test]
    fn child_is_clipped_to_parent() {
        let mut tree = Tree::new(Size::new(4, 4));
        let root = tree.root();
        let parent = tree.add(root, spec(1, 1, 2, 2), fill('p'));
        let child = tree.add(parent, spec(1, 1, 5, 5), fill('c'));

        let mut comp = Compositor::new(Size::new(4, 4), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);

        assert_eq!(
            *tree.region(child),
            Region::from_rect(Point::new(2, 2), Size::new(1, 1))
        );
        assert_eq!(rows(&comp), vec!["    ", " pp ", " pc ", "    "]);
    }

    #[test]
    fn invisible_parent_hides_subtree() {
        let mut tree = Tree::new(Size::new(2, 2));
        let root = tree.root();
        let parent = tree.add(root, spec(0, 0, 2, 2).visible(false), fill('p'));
        let child = tree.add(parent, spec(0, 0, 1, 1), fill('c'));

        let mut comp = Compositor::new(Size::new(2, 2), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);

        assert!(tree.region(child).is_empty());
        assert_eq!(rows(&comp), vec!["  ", "  "]);
    }

    #[test]
    fn painter_mode_matches_regions_for_opaque_fills() {
        let build = || {
            let mut tree = Tree::new(Size::new(4, 6));
            let root = tree.root();
            tree.add(root, spec(0, 0, 3, 4), fill('a'));
            tree.add(root, spec(1, 2, 3, 4), fill('b'));
            tree.add(root, spec(2, 1, 1, 2), fill('c'));
            tree
        };

        let mut regions = Compositor::new(Size::new(4, 6), Cell::BLANK, RenderMode::Regions);
        let mut painter = Compositor::new(Size::new(4, 6), Cell::BLANK, RenderMode::Painter);
        regions.render(&mut build());
        painter.render(&mut build());
        assert_eq!(rows(&regions), rows(&painter));
    }

    #[test]
    fn diff_after_single_change_emits_one_cell() {
        let mut tree = Tree::new(Size::new(2, 2));
        let root = tree.root();
        let node = tree.add(root, spec(0, 0, 1, 1), fill('a'));

        let mut comp = Compositor::new(Size::new(2, 2), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);
        let first = comp.diff_and_emit(&mut Vec::new()).unwrap();
        assert_eq!(first.cells_rendered, 4);

        tree.set_painter(node, fill('z'));
        comp.render(&mut tree);
        let mut out = Vec::new();
        let second = comp.diff_and_emit(&mut out).unwrap();
        assert_eq!(second.cells_rendered, 1);
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("\x1b[1;1H"));
        assert!(out.ends_with("z\x1b8\x1b[?2026l"));
    }

    #[test]
    fn unchanged_frame_emits_nothing() {
        let mut tree = Tree::new(Size::new(2, 2));
        let root = tree.root();
        tree.add(root, spec(0, 0, 1, 1), fill('a'));
        let mut comp = Compositor::new(Size::new(2, 2), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);
        comp.diff_and_emit(&mut Vec::new()).unwrap();

        comp.render(&mut tree);
        let mut out = Vec::new();
        comp.diff_and_emit(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn resize_updates_root_and_repaints() {
        let mut tree = Tree::new(Size::new(2, 2));
        let mut comp = Compositor::new(Size::new(2, 2), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);
        comp.diff_and_emit(&mut Vec::new()).unwrap();

        comp.request_resize(Size::new(3, 4));
        comp.render(&mut tree);
        assert_eq!(tree.spec(tree.root()).size, Size::new(3, 4));
        assert_eq!(tree.region(tree.root()).area(), 12);
        let stats = comp.diff_and_emit(&mut Vec::new()).unwrap();
        assert_eq!(stats.cells_rendered, 12);
    }

    #[test]
    fn regions_are_cached_until_invalidated() {
        let mut tree = Tree::new(Size::new(2, 2));
        let root = tree.root();
        let node = tree.add(root, spec(0, 0, 1, 1), fill('a'));
        let mut comp = Compositor::new(Size::new(2, 2), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);
        assert!(tree.regions_valid());

        tree.set_pos(node, Point::new(1, 1));
        assert!(!tree.regions_valid());
        comp.render(&mut tree);
        assert!(tree.region(node).contains(Point::new(1, 1)));
    }

    #[test]
    fn switching_mode_recomputes_regions() {
        let mut tree = Tree::new(Size::new(1, 2));
        let root = tree.root();
        let back = tree.add(root, spec(0, 0, 1, 2), fill('a'));
        tree.add(root, spec(0, 0, 1, 1), fill('b'));
        let mut comp = Compositor::new(Size::new(1, 2), Cell::BLANK, RenderMode::Regions);
        comp.render(&mut tree);
        assert_eq!(tree.region(back).area(), 1);

        comp.set_mode(RenderMode::Painter);
        comp.render(&mut tree);
        assert_eq!(tree.region(back).area(), 2);
    }
}
