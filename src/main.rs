// SPDX-License-Identifier: MIT
//
// grove: overlapping-panel demo for the grove compositor.
//
// A few panels stacked on top of each other, a status line, and the
// input parser feeding them:
//
//   Tab            bring the next panel to the front
//   arrows         move the front panel
//   mouse drag     grab any panel by a visible cell and move it
//   double-click   toggle the panel's pattern
//   r / c          ask the terminal for the cursor position / background
//   q, Ctrl+C      quit
//
// Each panel is a subtree: a solid body, a title label and a patterned
// texture. The compositor clips the children to the body and hands each
// node only the cells no panel in front of it covers.

mod config;
mod logging;

use std::env;
use std::process;

use grove_compose::{
    Action, App, Context, EventLoop, Fill, GadgetSpec, Label, NodeId, Texture, Tree,
};
use grove_region::{Point, Size};
use grove_term::input::{
    ColorKind, Event, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind,
};
use grove_term::{Canvas, Cell, Rgb, Style};
use tracing::{debug, info};

use crate::config::Config;

const PANEL_SIZE: Size = Size::new(9, 28);

const PANEL_COLORS: [Rgb; 3] = [
    Rgb::new(0x2e, 0x34, 0x40),
    Rgb::new(0x3b, 0x42, 0x52),
    Rgb::new(0x43, 0x4c, 0x5e),
];
const ACCENTS: [Rgb; 3] = [
    Rgb::new(0x88, 0xc0, 0xd0),
    Rgb::new(0xa3, 0xbe, 0x8c),
    Rgb::new(0xeb, 0xcb, 0x8b),
];
const TEXT: Rgb = Rgb::new(0xec, 0xef, 0xf4);

// ─── Panels ─────────────────────────────────────────────────────────────────

struct Panel {
    body: NodeId,
    pattern: NodeId,
    accent: Rgb,
    dotted: bool,
}

/// A checker or dot texture filling the panel's interior.
fn pattern(size: Size, accent: Rgb, bg: Rgb, dotted: bool) -> Texture {
    let mut canvas = Canvas::new(size, Cell::new(' ', accent, bg));
    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            let ch = match (dotted, (y + x) % 2 == 0) {
                (true, true) => '·',
                (false, true) => '▚',
                (_, false) => ' ',
            };
            canvas[(y, x)] = Cell::new(ch, accent, bg);
        }
    }
    Texture::new(canvas)
}

fn interior(size: Size) -> Size {
    Size::new(size.height.saturating_sub(2), size.width.saturating_sub(2))
}

// ─── Demo ───────────────────────────────────────────────────────────────────

struct Drag {
    panel: usize,
    /// Grab point relative to the panel's origin.
    grab: Point,
}

struct Demo {
    background: Rgb,
    panels: Vec<Panel>,
    /// Panel indices back to front.
    stack: Vec<usize>,
    status: Option<NodeId>,
    drag: Option<Drag>,
}

impl Demo {
    const fn new(background: Rgb) -> Self {
        Self {
            background,
            panels: Vec::new(),
            stack: Vec::new(),
            status: None,
            drag: None,
        }
    }

    fn add_panel(&mut self, tree: &mut Tree, pos: Point, title: &str) {
        let index = self.panels.len();
        let bg = PANEL_COLORS[index % PANEL_COLORS.len()];
        let accent = ACCENTS[index % ACCENTS.len()];
        let root = tree.root();

        let body = tree.add(
            root,
            GadgetSpec::new(pos, PANEL_SIZE),
            Fill::new(Cell::new(' ', TEXT, bg)),
        );
        tree.add(
            body,
            GadgetSpec::new(Point::ORIGIN, Size::new(1, PANEL_SIZE.width)),
            Label::new(format!(" {title}"), bg, accent).with_style(Style::BOLD),
        );
        let pattern_node = tree.add(
            body,
            GadgetSpec::new(Point::new(2, 1), interior(PANEL_SIZE)),
            pattern(interior(PANEL_SIZE), accent, bg, false),
        );

        self.panels.push(Panel {
            body,
            pattern: pattern_node,
            accent,
            dotted: false,
        });
        self.stack.push(index);
    }

    fn front(&self) -> Option<usize> {
        self.stack.last().copied()
    }

    fn raise(&mut self, tree: &mut Tree, index: usize) {
        self.stack.retain(|&i| i != index);
        self.stack.push(index);
        tree.pull_to_front(self.panels[index].body);
        if let Some(status) = self.status {
            tree.pull_to_front(status);
        }
    }

    fn cycle(&mut self, tree: &mut Tree) {
        if let Some(&back) = self.stack.first() {
            self.raise(tree, back);
        }
    }

    fn nudge(&self, tree: &mut Tree, dy: i32, dx: i32) {
        if let Some(index) = self.front() {
            let body = self.panels[index].body;
            let pos = tree.spec(body).pos;
            tree.set_pos(body, pos + Point::new(dy, dx));
        }
    }

    /// The panel owning the cell at `point`, if any.
    fn panel_at(&self, tree: &Tree, point: Point) -> Option<usize> {
        let mut node = tree.topmost_at(point)?;
        while let Some(parent) = tree.parent(node) {
            if parent == tree.root() {
                break;
            }
            node = parent;
        }
        self.panels.iter().position(|p| p.body == node)
    }

    fn toggle_pattern(&mut self, tree: &mut Tree, index: usize) {
        let bg = PANEL_COLORS[index % PANEL_COLORS.len()];
        let panel = &mut self.panels[index];
        panel.dotted = !panel.dotted;
        let size = tree.spec(panel.pattern).size;
        tree.set_painter(panel.pattern, pattern(size, panel.accent, bg, panel.dotted));
    }

    fn on_mouse(&mut self, tree: &mut Tree, mouse: &MouseEvent) {
        match (mouse.kind, mouse.button) {
            (MouseEventKind::Down, MouseButton::Left) => {
                let Some(index) = self.panel_at(tree, mouse.pos) else {
                    return;
                };
                self.raise(tree, index);
                if mouse.nclicks == 2 {
                    self.toggle_pattern(tree, index);
                }
                let origin = tree.spec(self.panels[index].body).pos;
                self.drag = Some(Drag {
                    panel: index,
                    grab: mouse.pos - origin,
                });
            }
            (MouseEventKind::Move, MouseButton::Left) => {
                if let Some(drag) = &self.drag {
                    tree.set_pos(self.panels[drag.panel].body, mouse.pos - drag.grab);
                }
            }
            (MouseEventKind::Up, _) => self.drag = None,
            _ => {}
        }
    }

    fn on_key(&mut self, cx: &mut Context<'_>, key: KeyEvent) {
        match key.code {
            KeyCode::Tab => self.cycle(cx.tree),
            KeyCode::Up => self.nudge(cx.tree, -1, 0),
            KeyCode::Down => self.nudge(cx.tree, 1, 0),
            KeyCode::Left => self.nudge(cx.tree, 0, -1),
            KeyCode::Right => self.nudge(cx.tree, 0, 1),
            KeyCode::Char('r') => {
                let _ = cx.request_cursor_position_report();
            }
            KeyCode::Char('c') => {
                let _ = cx.request_background_color();
            }
            _ => {}
        }
    }

    /// Keep the status line on the last row, full width.
    fn place_status(&self, tree: &mut Tree, size: Size) {
        if let Some(status) = self.status {
            let y = i32::from(size.height.saturating_sub(1));
            tree.set_spec(
                status,
                GadgetSpec::new(Point::new(y, 0), Size::new(1, size.width)),
            );
        }
    }

    fn set_status(&self, tree: &mut Tree, text: impl Into<String>) {
        if let Some(status) = self.status {
            tree.set_painter(status, Label::new(text, TEXT, self.background));
        }
    }
}

impl App for Demo {
    fn on_start(&mut self, cx: &mut Context<'_>) {
        let _ = cx.set_title("grove");
        self.add_panel(cx.tree, Point::new(1, 2), "one");
        self.add_panel(cx.tree, Point::new(4, 16), "two");
        self.add_panel(cx.tree, Point::new(7, 8), "three");

        let root = cx.tree.root();
        self.status = Some(cx.tree.add(
            root,
            GadgetSpec::default(),
            Label::new("", TEXT, self.background),
        ));
        let size = cx.size();
        self.place_status(cx.tree, size);
        self.set_status(cx.tree, "Tab: raise  arrows/drag: move  q: quit");
    }

    fn on_event(&mut self, cx: &mut Context<'_>, event: &Event) -> Action {
        match event {
            Event::Key(KeyEvent {
                code: KeyCode::Char('q'),
                ..
            }) => return Action::Quit,
            Event::Key(KeyEvent {
                code: KeyCode::Char('c'),
                modifiers,
            }) if modifiers.contains(Modifiers::CTRL) => return Action::Quit,
            Event::Key(key) => self.on_key(cx, *key),
            Event::Mouse(mouse) => self.on_mouse(cx.tree, mouse),
            Event::Resize(_) => {
                let size = cx.size();
                self.place_status(cx.tree, size);
            }
            Event::CursorPositionReport(pos) => {
                self.set_status(cx.tree, format!("cursor at row {} col {}", pos.y, pos.x));
            }
            Event::ColorReport { kind, color } => {
                let which = match kind {
                    ColorKind::Fg => "foreground",
                    ColorKind::Bg => "background",
                };
                self.set_status(cx.tree, format!("{which} is {color}"));
            }
            Event::UnknownEscape(seq) => debug!(?seq, "unhandled escape"),
            _ => {}
        }
        Action::Continue
    }
}

fn main() {
    let log_file = logging::init();

    let config = Config::load(env::args().skip(1)).unwrap_or_else(|e| {
        eprintln!("grove: {e}");
        process::exit(2);
    });

    let mut event_loop = EventLoop::new(config.loop_config()).unwrap_or_else(|e| {
        eprintln!("grove: failed to initialize terminal: {e}");
        process::exit(1);
    });
    info!(size = ?event_loop.size(), ?log_file, "starting");

    let mut tree = Tree::new(event_loop.size());
    let mut demo = Demo::new(config.background());
    if let Err(e) = event_loop.run(&mut tree, &mut demo) {
        eprintln!("grove: {e}");
        process::exit(1);
    }
    info!("bye");
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use grove_compose::{LoopConfig, Session};
    use std::time::{Duration, Instant};

    fn start() -> (Session, Tree, Demo) {
        let size = Size::new(24, 80);
        let mut session = Session::new(size, &LoopConfig::default());
        let mut tree = Tree::new(size);
        let mut demo = Demo::new(Rgb::BLACK);
        session.start(&mut tree, &mut demo);
        (session, tree, demo)
    }

    fn send(session: &mut Session, tree: &mut Tree, demo: &mut Demo, bytes: &[u8]) -> Action {
        let now = Instant::now();
        session.feed(bytes, now);
        session.dispatch(tree, demo, now + Duration::from_millis(1))
    }

    #[test]
    fn starts_with_three_panels_and_status() {
        let (_, tree, demo) = start();
        assert_eq!(demo.panels.len(), 3);
        // Root, three panels of three nodes each, status line.
        assert_eq!(tree.len(), 1 + 9 + 1);
        let status = demo.status.unwrap();
        assert_eq!(tree.spec(status).pos, Point::new(23, 0));
        assert_eq!(tree.spec(status).size, Size::new(1, 80));
    }

    #[test]
    fn q_quits() {
        let (mut s, mut tree, mut demo) = start();
        assert_eq!(send(&mut s, &mut tree, &mut demo, b"q"), Action::Quit);
        let (mut s, mut tree, mut demo) = start();
        assert_eq!(send(&mut s, &mut tree, &mut demo, b"\x03"), Action::Quit);
    }

    #[test]
    fn tab_raises_back_panel() {
        let (mut s, mut tree, mut demo) = start();
        assert_eq!(demo.front(), Some(2));
        send(&mut s, &mut tree, &mut demo, b"\t");
        assert_eq!(demo.front(), Some(0));
        let root = tree.root();
        let order: Vec<_> = tree.children(root).to_vec();
        assert_eq!(order[order.len() - 2], demo.panels[0].body);
        assert_eq!(order[order.len() - 1], demo.status.unwrap());
    }

    #[test]
    fn arrows_move_front_panel() {
        let (mut s, mut tree, mut demo) = start();
        let body = demo.panels[2].body;
        let before = tree.spec(body).pos;
        send(&mut s, &mut tree, &mut demo, b"\x1b[B\x1b[C\x1b[C");
        assert_eq!(tree.spec(body).pos, before + Point::new(1, 2));
    }

    #[test]
    fn drag_moves_clicked_panel() {
        let (mut s, mut tree, mut demo) = start();
        s.render(&mut tree).unwrap();

        // Row 2 is covered by panel one only.
        send(&mut s, &mut tree, &mut demo, b"\x1b[<0;4;3M");
        assert_eq!(demo.front(), Some(0));
        s.render(&mut tree).unwrap();

        send(&mut s, &mut tree, &mut demo, b"\x1b[<32;14;8M\x1b[<0;14;8m");
        assert_eq!(tree.spec(demo.panels[0].body).pos, Point::new(6, 12));
        assert!(demo.drag.is_none());
    }

    #[test]
    fn resize_moves_status_line() {
        let (mut s, mut tree, mut demo) = start();
        s.resize(Size::new(10, 40));
        s.dispatch(&mut tree, &mut demo, Instant::now());
        let status = demo.status.unwrap();
        assert_eq!(tree.spec(status).pos, Point::new(9, 0));
        assert_eq!(tree.spec(status).size, Size::new(1, 40));
    }

    #[test]
    fn inline_status_sits_on_last_inline_row() {
        let config = LoopConfig {
            inline_height: Some(12),
            ..LoopConfig::default()
        };
        let mut s = Session::new(Size::new(24, 80), &config);
        let mut tree = Tree::new(Size::new(24, 80));
        let mut demo = Demo::new(Rgb::BLACK);
        s.start(&mut tree, &mut demo);
        assert_eq!(tree.spec(demo.status.unwrap()).pos, Point::new(11, 0));

        s.resize(Size::new(8, 40));
        s.dispatch(&mut tree, &mut demo, Instant::now());
        assert_eq!(tree.spec(demo.status.unwrap()).pos, Point::new(7, 0));
    }

    #[test]
    fn cursor_report_reaches_status() {
        let (mut s, mut tree, mut demo) = start();
        send(&mut s, &mut tree, &mut demo, b"r");
        assert!(s.output().as_bytes().ends_with(b"\x1b[6n"));
        send(&mut s, &mut tree, &mut demo, b"\x1b[5;9R");
        assert!(!s.parser().is_expecting_dsr());
    }
}
