// SPDX-License-Identifier: MIT
//
// grove-compose: gadget tree, region compositor, and host loop.
//
// An application describes its screen as a tree of gadgets: rectangles
// with a position relative to their parent, a few flags, and a painter.
// Each frame the compositor works out which cells each gadget owns
// (clipped to its parent, minus whatever opaque gadgets cover it), lets
// every gadget paint only those cells, and hands the changed cells to
// the terminal emitter in grove-term.
//
// The host loop ties that to a real terminal: stdin reader, parser,
// click tracking, resize handling and the render tick.

pub mod compositor;
pub mod host;
pub mod paint;
pub mod tree;

pub use compositor::{Compositor, RenderMode};
pub use host::{Action, App, Context, EventLoop, LoopConfig, Session};
pub use paint::{CanvasView, Fill, Label, Paintable, Texture};
pub use tree::{GadgetSpec, NodeId, Tree};
