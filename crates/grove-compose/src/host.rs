// SPDX-License-Identifier: MIT
//
// Host event loop.
//
// Stdin bytes come in from the background reader, get parsed into
// events, and are handed to the application together with the gadget
// tree. When something changed, the compositor renders a frame and the
// changed cells go out in a single write.
//
// The loop blocks on the stdin channel with a timeout. The timeout is
// the render tick (8.3ms, 120 Hz) or the parser's escape deadline,
// whichever comes first, so a lone ESC resolves on time without a
// separate timer thread. Idle screens cost nothing: a frame is rendered
// only when the dirty flag is set.
//
// Terminal resize arrives as SIGWINCH. The loop re-queries the size and
// injects an `Event::Resize` into the parser, so the application sees
// it in order with the input that preceded it. The compositor applies
// the new size at the start of the next render pass.
//
// Inline sessions draw into the rows below the prompt instead of the
// alternate screen, at most `inline_height` rows tall. Their origin is
// known only from the cursor position report the emitter requests on
// every full repaint; mouse positions are translated by it before the
// application sees them.
//
// Everything that does not touch the real terminal lives in `Session`,
// which tests drive directly with a simulated clock.

use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use grove_region::{Point, Size};
use grove_term::ansi;
use grove_term::click::{ClickTracker, DEFAULT_CLICK_TIMEOUT};
use grove_term::diff::Target;
use grove_term::input::{Event, Parser, ParserConfig};
use grove_term::output::OutputBuffer;
use grove_term::reader::StdinReader;
use grove_term::terminal::{self, Modes, Terminal};
use grove_term::Cell;
use tracing::debug;

use crate::compositor::{Compositor, RenderMode};
use crate::tree::Tree;

// ─── App Trait ──────────────────────────────────────────────────────────────

/// What the application tells the loop to do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// What the application gets to work with while handling a callback.
pub struct Context<'a> {
    pub tree: &'a mut Tree,
    parser: &'a mut Parser,
    out: &'a mut OutputBuffer,
    size: Size,
}

impl Context<'_> {
    /// Size of the drawing area as of the last resize event: the whole
    /// terminal, or the inline rows.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Ask the terminal where the cursor is. The reply arrives as
    /// [`Event::CursorPositionReport`].
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be buffered.
    pub fn request_cursor_position_report(&mut self) -> io::Result<()> {
        self.parser.request_cursor_position_report(self.out)
    }

    /// # Errors
    ///
    /// Returns an error if the query cannot be buffered.
    pub fn request_foreground_color(&mut self) -> io::Result<()> {
        self.parser.request_foreground_color(self.out)
    }

    /// # Errors
    ///
    /// Returns an error if the query cannot be buffered.
    pub fn request_background_color(&mut self) -> io::Result<()> {
        self.parser.request_background_color(self.out)
    }

    /// # Errors
    ///
    /// Returns an error if the query cannot be buffered.
    pub fn request_device_attributes(&mut self) -> io::Result<()> {
        self.parser.request_device_attributes(self.out)
    }

    /// # Errors
    ///
    /// Returns an error if the query cannot be buffered.
    pub fn request_pixel_geometry(&mut self) -> io::Result<()> {
        self.parser.request_pixel_geometry(self.out)
    }

    /// # Errors
    ///
    /// Returns an error if the query cannot be buffered.
    pub fn request_terminal_geometry(&mut self) -> io::Result<()> {
        self.parser.request_terminal_geometry(self.out)
    }

    /// # Errors
    ///
    /// Returns an error if the sequence cannot be buffered.
    pub fn set_title(&mut self, title: &str) -> io::Result<()> {
        ansi::set_title(self.out, title)
    }
}

/// Application interface for the event loop.
///
/// The application owns no screen state of its own: it mutates the
/// gadget tree in [`Context::tree`] and the compositor paints it.
/// Every callback has a default, so an app implements only what it
/// reacts to.
pub trait App {
    /// Called once, before the first frame.
    fn on_start(&mut self, _cx: &mut Context<'_>) {}

    /// Handle one parsed event. Return [`Action::Quit`] to leave the loop.
    fn on_event(&mut self, _cx: &mut Context<'_>, _event: &Event) -> Action {
        Action::Continue
    }

    /// Called every loop iteration, even when no input arrived. Return
    /// `true` if a repaint is needed.
    fn on_tick(&mut self, _cx: &mut Context<'_>) -> bool {
        false
    }
}

// ─── Loop Config ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Longest the loop blocks waiting for input. Default: 8333μs (120 Hz).
    pub tick_interval: Duration,
    pub render_mode: RenderMode,
    pub mouse: bool,
    pub bracketed_paste: bool,
    pub focus_reporting: bool,
    pub parser: ParserConfig,
    /// Window for double and triple clicks.
    pub click_timeout: Duration,
    /// What every frame is cleared to.
    pub background: Cell,
    /// Draw below the prompt, this many rows tall (clipped to the
    /// terminal), instead of on the alternate screen.
    pub inline_height: Option<u16>,
}

impl LoopConfig {
    /// Terminal modes to enable on entry.
    #[must_use]
    pub const fn modes(&self) -> Modes {
        Modes {
            alt_screen: self.inline_height.is_none(),
            mouse: self.mouse,
            bracketed_paste: self.bracketed_paste,
            focus_reporting: self.focus_reporting,
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_micros(8333),
            render_mode: RenderMode::default(),
            mouse: true,
            bracketed_paste: true,
            focus_reporting: true,
            parser: ParserConfig::default(),
            click_timeout: DEFAULT_CLICK_TIMEOUT,
            background: Cell::BLANK,
            inline_height: None,
        }
    }
}

// ─── Session ────────────────────────────────────────────────────────────────

/// Parser, click tracker, compositor, and output buffer: one loop
/// iteration's worth of state, independent of the real terminal.
pub struct Session {
    parser: Parser,
    clicks: ClickTracker,
    compositor: Compositor,
    out: OutputBuffer,
    /// Terminal size.
    size: Size,
    tick_interval: Duration,
    dirty: bool,
    inline_height: Option<u16>,
    /// A full inline frame asked where its origin ended up.
    resync_pending: bool,
}

/// The part of a terminal of `size` that frames are drawn into.
fn draw_size(size: Size, inline_height: Option<u16>) -> Size {
    match inline_height {
        Some(height) => Size::new(height.min(size.height), size.width),
        None => size,
    }
}

impl Session {
    #[must_use]
    pub fn new(size: Size, config: &LoopConfig) -> Self {
        let layout = draw_size(size, config.inline_height);
        let mut compositor = Compositor::new(layout, config.background, config.render_mode);
        if config.inline_height.is_some() {
            compositor
                .frames_mut()
                .set_target(Target::Inline { origin: None });
        }
        Self {
            parser: Parser::with_config(config.parser),
            clicks: ClickTracker::new(config.click_timeout),
            compositor,
            out: OutputBuffer::new(),
            size,
            tick_interval: config.tick_interval,
            // The first frame always renders.
            dirty: true,
            inline_height: config.inline_height,
            resync_pending: false,
        }
    }

    #[inline]
    #[must_use]
    pub const fn parser(&self) -> &Parser {
        &self.parser
    }

    #[inline]
    #[must_use]
    pub const fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    #[inline]
    pub const fn compositor_mut(&mut self) -> &mut Compositor {
        &mut self.compositor
    }

    /// Bytes waiting to be written to the terminal.
    #[inline]
    #[must_use]
    pub const fn output(&self) -> &OutputBuffer {
        &self.out
    }

    #[inline]
    pub const fn output_mut(&mut self) -> &mut OutputBuffer {
        &mut self.out
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Size of the drawing area.
    #[inline]
    #[must_use]
    pub fn draw_size(&self) -> Size {
        draw_size(self.size, self.inline_height)
    }

    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub const fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Bring the root to the drawing area's size and run [`App::on_start`].
    pub fn start(&mut self, tree: &mut Tree, app: &mut impl App) {
        let size = self.draw_size();
        if tree.spec(tree.root()).size != size {
            tree.set_size(tree.root(), size);
        }
        let mut cx = Context {
            tree,
            parser: &mut self.parser,
            out: &mut self.out,
            size,
        };
        app.on_start(&mut cx);
        self.dirty = true;
    }

    pub fn feed(&mut self, bytes: &[u8], now: Instant) {
        self.parser.feed_bytes_at(bytes, now);
    }

    /// Queue a resize behind the input parsed so far.
    pub fn resize(&mut self, size: Size) {
        self.parser.push_resize(size);
    }

    /// Resolve expired timeouts and hand every pending event to `app`,
    /// then tick it.
    pub fn dispatch(&mut self, tree: &mut Tree, app: &mut impl App, now: Instant) -> Action {
        self.parser.tick(now);
        if !self.parser.is_expecting_dsr() {
            self.resync_pending = false;
        }

        for mut event in self.parser.events() {
            match &mut event {
                Event::Mouse(mouse) => {
                    if let Some(origin) = self.compositor.frames().inline_origin() {
                        mouse.pos = mouse.pos - origin;
                    }
                    self.clicks.track(mouse, now);
                }
                Event::Resize(size) => {
                    self.size = *size;
                    let layout = self.draw_size();
                    self.compositor.request_resize(layout);
                    // Reflow leaves the old origin meaningless: start over
                    // from the top of the screen.
                    self.compositor.frames_mut().set_inline_origin(Point::ORIGIN);
                }
                // Our own request; the application did not ask.
                Event::CursorPositionReport(pos) if self.resync_pending => {
                    self.resync_pending = false;
                    self.compositor.frames_mut().set_inline_origin(*pos);
                    debug!(origin = ?pos, "inline origin resynced");
                    continue;
                }
                _ => {}
            }
            self.dirty = true;

            let mut cx = Context {
                tree: &mut *tree,
                parser: &mut self.parser,
                out: &mut self.out,
                size: draw_size(self.size, self.inline_height),
            };
            if app.on_event(&mut cx, &event) == Action::Quit {
                return Action::Quit;
            }
        }

        let mut cx = Context {
            tree: &mut *tree,
            parser: &mut self.parser,
            out: &mut self.out,
            size: draw_size(self.size, self.inline_height),
        };
        if app.on_tick(&mut cx) {
            self.dirty = true;
        }
        Action::Continue
    }

    /// Render and emit a frame into the output buffer if anything changed.
    /// Returns whether a frame was produced.
    ///
    /// While a report request is outstanding the frame is held back so
    /// the reply is not interleaved with a frame's cursor moves.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be buffered.
    pub fn render(&mut self, tree: &mut Tree) -> io::Result<bool> {
        if !self.dirty || self.parser.is_expecting_dsr() {
            return Ok(false);
        }
        self.compositor.render(tree);
        let stats = self.compositor.diff_and_emit(&mut self.out)?;
        if stats.origin_requested {
            self.parser.expect_dsr();
            self.resync_pending = true;
        }
        self.dirty = false;
        Ok(true)
    }

    /// How long the loop may block before it has work to do.
    #[must_use]
    pub fn next_wait(&self, now: Instant) -> Duration {
        self.parser
            .next_deadline()
            .map_or(self.tick_interval, |deadline| {
                deadline.saturating_duration_since(now).min(self.tick_interval)
            })
    }

    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        self.out.flush_stdout()
    }
}

// ─── EventLoop ──────────────────────────────────────────────────────────────

/// The terminal event loop.
///
/// ```no_run
/// use grove_compose::host::{Action, App, Context, EventLoop, LoopConfig};
/// use grove_compose::tree::Tree;
/// use grove_term::input::{Event, KeyCode, KeyEvent};
///
/// struct Demo;
///
/// impl App for Demo {
///     fn on_event(&mut self, _cx: &mut Context<'_>, event: &Event) -> Action {
///         if let Event::Key(KeyEvent { code: KeyCode::Char('q'), .. }) = event {
///             return Action::Quit;
///         }
///         Action::Continue
///     }
/// }
///
/// let mut event_loop = EventLoop::new(LoopConfig::default())?;
/// let mut tree = Tree::new(event_loop.size());
/// event_loop.run(&mut tree, &mut Demo)?;
/// # Ok::<(), grove_term::Error>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    session: Session,
    config: LoopConfig,
}

impl EventLoop {
    /// # Errors
    ///
    /// Returns an error if stdin or stdout is not a usable terminal.
    pub fn new(config: LoopConfig) -> grove_term::Result<Self> {
        let terminal = Terminal::acquire()?;
        let session = Session::new(terminal.size(), &config);
        Ok(Self {
            terminal,
            session,
            config,
        })
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Run until the application returns [`Action::Quit`] or stdin closes.
    ///
    /// The terminal is restored on the way out, also when the loop fails.
    ///
    /// # Errors
    ///
    /// Returns an error if entering or leaving the terminal, spawning the
    /// reader, or writing output fails.
    pub fn run(&mut self, tree: &mut Tree, app: &mut impl App) -> grove_term::Result<()> {
        self.terminal.enter(self.config.modes())?;
        terminal::install_resize_handler();

        let (mut reader, rx) = match StdinReader::spawn() {
            Ok(spawned) => spawned,
            Err(err) => {
                self.terminal.leave()?;
                return Err(err.into());
            }
        };

        let result = self.run_inner(tree, app, &rx);

        reader.stop();
        self.terminal.leave()?;
        result.map_err(Into::into)
    }

    fn run_inner(
        &mut self,
        tree: &mut Tree,
        app: &mut impl App,
        rx: &Receiver<Vec<u8>>,
    ) -> io::Result<()> {
        self.session.start(tree, app);

        loop {
            match rx.recv_timeout(self.session.next_wait(Instant::now())) {
                Ok(bytes) => self.session.feed(&bytes, Instant::now()),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("input closed, leaving loop");
                    return self.session.flush_stdout();
                }
            }

            if terminal::take_resize() {
                let size = self.terminal.refresh_size();
                self.session.resize(size);
            }

            if self.session.dispatch(tree, app, Instant::now()) == Action::Quit {
                return self.session.flush_stdout();
            }

            self.session.render(tree)?;
            self.session.flush_stdout()?;
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
