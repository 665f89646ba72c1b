// SPDX-License-Identifier: MIT
//
// Gadget tree.
//
// Nodes live in an arena and refer to each other by `NodeId`. A node
// stores its parent's id and an ordered list of child ids; the last child
// is drawn last, so it is frontmost. Removing a node frees its whole
// subtree and its slots are reused by later insertions.
//
// Every mutation that can change what a node covers on screen (geometry,
// visibility, enablement, transparency, z-order, structure) clears the
// `regions_valid` flag. The compositor recomputes regions only when the
// flag is clear.
//
// Passing an id that was removed is a caller bug and panics.

use grove_region::{Point, Rect, Region, Size};

use crate::paint::{CanvasView, Paintable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Geometry and flags of a node. `pos` is relative to the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GadgetSpec {
    pub pos: Point,
    pub size: Size,
    pub visible: bool,
    pub enabled: bool,
    /// A transparent node paints but does not hide what is behind it.
    pub transparent: bool,
}

impl GadgetSpec {
    /// A visible, enabled, opaque node.
    #[must_use]
    pub const fn new(pos: Point, size: Size) -> Self {
        Self {
            pos,
            size,
            visible: true,
            enabled: true,
            transparent: false,
        }
    }

    #[must_use]
    pub const fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    #[must_use]
    pub const fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for GadgetSpec {
    fn default() -> Self {
        Self::new(Point::ORIGIN, Size::default())
    }
}

struct Node {
    spec: GadgetSpec,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    painter: Option<Box<dyn Paintable>>,
    /// Cells this node paints, absolute. Valid while `regions_valid`.
    region: Region,
}

pub struct Tree {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    regions_valid: bool,
}

impl Tree {
    const ROOT: NodeId = NodeId(0);

    /// A tree holding only a root of `size` at the origin.
    #[must_use]
    pub fn new(size: Size) -> Self {
        let root = Node {
            spec: GadgetSpec::new(Point::ORIGIN, size),
            parent: None,
            children: Vec::new(),
            painter: None,
            region: Region::empty(),
        };
        Self {
            nodes: vec![Some(root)],
            free: Vec::new(),
            regions_valid: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn root(&self) -> NodeId {
        Self::ROOT
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Always false: the root cannot be removed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(Option::is_some)
    }

    fn node(&self, id: NodeId) -> &Node {
        match self.nodes.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("{id:?} is not in the tree"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("{id:?} is not in the tree"),
        }
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Add a painted node as the frontmost child of `parent`.
    pub fn add(&mut self, parent: NodeId, spec: GadgetSpec, painter: impl Paintable + 'static) -> NodeId {
        self.insert(parent, spec, Some(Box::new(painter)))
    }

    /// Add a node that paints nothing itself, only groups its children.
    pub fn add_group(&mut self, parent: NodeId, spec: GadgetSpec) -> NodeId {
        self.insert(parent, spec, None)
    }

    fn insert(
        &mut self,
        parent: NodeId,
        spec: GadgetSpec,
        painter: Option<Box<dyn Paintable>>,
    ) -> NodeId {
        let node = Node {
            spec,
            parent: Some(parent),
            children: Vec::new(),
            painter,
            region: Region::empty(),
        };
        let id = if let Some(slot) = self.free.pop() {
            self.nodes[slot] = Some(node);
            NodeId(slot)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        };
        self.node_mut(parent).children.push(id);
        self.regions_valid = false;
        id
    }

    /// Detach `id` from its parent and free its subtree.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the root.
    pub fn remove(&mut self, id: NodeId) {
        assert!(id != Self::ROOT, "the root cannot be removed");
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
        let doomed: Vec<NodeId> = std::iter::once(id).chain(self.walk(id)).collect();
        for NodeId(slot) in doomed {
            self.nodes[slot] = None;
            self.free.push(slot);
        }
        self.regions_valid = false;
    }

    /// Move `id` to the end of its parent's children so it draws last.
    pub fn pull_to_front(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };
        let children = &mut self.node_mut(parent).children;
        if children.last() == Some(&id) {
            return;
        }
        children.retain(|&c| c != id);
        children.push(id);
        self.regions_valid = false;
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Children back to front.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    // ─── Geometry & flags ───────────────────────────────────────────────

    #[must_use]
    pub fn spec(&self, id: NodeId) -> &GadgetSpec {
        &self.node(id).spec
    }

    /// Replace geometry and flags at once.
    pub fn set_spec(&mut self, id: NodeId, spec: GadgetSpec) {
        let node = self.node_mut(id);
        if node.spec != spec {
            node.spec = spec;
            self.regions_valid = false;
        }
    }

    pub fn set_pos(&mut self, id: NodeId, pos: Point) {
        self.set_spec(id, GadgetSpec { pos, ..*self.spec(id) });
    }

    pub fn set_size(&mut self, id: NodeId, size: Size) {
        self.set_spec(id, GadgetSpec { size, ..*self.spec(id) });
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.set_spec(id, self.spec(id).visible(visible));
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) {
        self.set_spec(id, self.spec(id).enabled(enabled));
    }

    pub fn set_transparent(&mut self, id: NodeId, transparent: bool) {
        self.set_spec(id, self.spec(id).transparent(transparent));
    }

    /// Swap the painter. Regions stay valid; only content changes.
    pub fn set_painter(&mut self, id: NodeId, painter: impl Paintable + 'static) {
        self.node_mut(id).painter = Some(Box::new(painter));
    }

    /// Whether the node itself takes part in rendering.
    #[must_use]
    pub fn is_drawable(&self, id: NodeId) -> bool {
        let spec = self.spec(id);
        spec.visible && spec.enabled
    }

    /// Position in screen coordinates.
    #[must_use]
    pub fn absolute_pos(&self, id: NodeId) -> Point {
        let mut pos = Point::ORIGIN;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.node(current);
            pos = pos + node.spec.pos;
            cursor = node.parent;
        }
        pos
    }

    /// Bounding rect in screen coordinates.
    #[must_use]
    pub fn absolute_rect(&self, id: NodeId) -> Rect {
        Rect::from_pos_size(self.absolute_pos(id), self.spec(id).size)
    }

    // ─── Traversal ───────────────────────────────────────────────────────

    /// Descendants of `id` in draw order (preorder, back to front).
    #[must_use]
    pub fn walk(&self, id: NodeId) -> Walk<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Walk { tree: self, stack }
    }

    /// Descendants of `id` front to back (reverse postorder): children
    /// before their parent, later siblings before earlier ones.
    pub fn walk_reverse(&self, id: NodeId) -> impl DoubleEndedIterator<Item = NodeId> + use<> {
        let order: Vec<NodeId> = self.walk(id).collect();
        order.into_iter().rev()
    }

    // ─── Regions ─────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn regions_valid(&self) -> bool {
        self.regions_valid
    }

    pub const fn invalidate_regions(&mut self) {
        self.regions_valid = false;
    }

    pub(crate) const fn mark_regions_valid(&mut self) {
        self.regions_valid = true;
    }

    /// Cells `id` painted in the last render pass.
    ///
    /// For the root this is what no opaque node covers.
    #[must_use]
    pub fn region(&self, id: NodeId) -> &Region {
        &self.node(id).region
    }

    pub(crate) fn set_region(&mut self, id: NodeId, region: Region) {
        self.node_mut(id).region = region;
    }

    /// Whether `point` hits the visible part of `id` or of any of its
    /// drawable descendants.
    #[must_use]
    pub fn collides_point(&self, id: NodeId, point: Point) -> bool {
        if !self.is_drawable(id) {
            return false;
        }
        self.region(id).contains(point)
            || self
                .walk(id)
                .any(|c| self.is_drawable(c) && self.region(c).contains(point))
    }

    /// The frontmost drawable node whose region contains `point`.
    #[must_use]
    pub fn topmost_at(&self, point: Point) -> Option<NodeId> {
        self.walk_reverse(Self::ROOT)
            .find(|&id| self.is_drawable(id) && self.region(id).contains(point))
    }

    /// Run `id`'s painter against `canvas`, clipped to its region.
    pub(crate) fn paint(&self, id: NodeId, canvas: &mut grove_term::Canvas) {
        let node = self.node(id);
        let Some(painter) = node.painter.as_deref() else {
            return;
        };
        if node.region.is_empty() {
            return;
        }
        let mut view = CanvasView::new(canvas, &node.region, self.absolute_pos(id), node.spec.size);
        painter.paint(&mut view);
    }
}

/// Preorder iterator returned by [`Tree::walk`].
pub struct Walk<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl Iterator for Walk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev());
        Some(id)
    }
}
