// SPDX-License-Identifier: MIT
//
// VT100 input parser.
//
// Turns raw terminal input into typed events: keys, mouse actions,
// bracketed paste, focus changes, and replies to the report requests
// this parser issued (cursor position, default colors, device attributes,
// pixel geometry).
//
// # Design
//
// A character-at-a-time state machine accumulates an escape buffer until
// the sequence is unambiguously complete, then resolves it (`execute`)
// into exactly one event, or none for a paste start marker. Unrecognized
// sequences become `Event::UnknownEscape` rather than being dropped.
//
// A lone ESC cannot be told apart from the start of a sequence until
// more input arrives or does not. After each feed that leaves the parser
// mid-sequence, an escape timer is armed; the host sizes its wait with
// [`Parser::next_deadline`] and calls [`Parser::tick`] when it expires,
// which force-resolves whatever is buffered.
//
// Every entry point taking `now` has a wall-clock twin so tests can drive
// a simulated clock.

use std::collections::{BTreeSet, VecDeque};
use std::io::{self, Write};
use std::mem;
use std::time::{Duration, Instant};

use bitflags::bitflags;
use grove_region::{Point, Size};
use tracing::{debug, trace};

use crate::ansi;
use crate::color::Rgb;
use crate::keys;
use crate::timer::Timer;

// ─── Event Types ────────────────────────────────────────────────────────────

/// A parsed terminal input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// Bracketed paste content, markers stripped and newlines normalized
    /// to `\n`.
    Paste(String),
    Focus(Focus),
    /// Injected by the host through [`Parser::push_resize`].
    Resize(Size),
    /// Reply to [`Parser::request_cursor_position_report`]. Zero-indexed.
    CursorPositionReport(Point),
    ColorReport { kind: ColorKind, color: Rgb },
    DeviceAttributesReport(BTreeSet<u32>),
    PixelGeometryReport { kind: GeometryKind, size: Size },
    /// A complete escape the parser could not decode.
    UnknownEscape(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// An unmodified key.
    #[must_use]
    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::empty())
    }
}

/// Identity of a key.
///
/// Named keys have dedicated variants; printable characters use
/// [`Char`](KeyCode::Char). Function keys F1–F20 use [`F`](KeyCode::F).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    // ── Named keys ──────────────────────────────────────────────
    Enter,
    Tab,
    Backspace,
    Escape,
    Delete,
    Insert,
    // ── Navigation ──────────────────────────────────────────────
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    // ── Function keys ───────────────────────────────────────────
    F(u8),
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0000_0001;
        const ALT   = 0b0000_0010;
        const CTRL  = 0b0000_0100;
    }
}

/// A mouse report.
///
/// `dy`/`dx` are relative to the previous mouse report seen by the same
/// parser. `nclicks` is always 0 from the parser; the host fills it in
/// with a [`ClickTracker`](crate::click::ClickTracker).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub pos: Point,
    pub button: MouseButton,
    pub kind: MouseEventKind,
    pub modifiers: Modifiers,
    pub dy: i32,
    pub dx: i32,
    pub nclicks: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    NoButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Down,
    Up,
    Move,
    ScrollUp,
    ScrollDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorKind {
    Fg,
    Bg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// One character cell, in pixels.
    Cell,
    /// The whole text area, in pixels.
    Terminal,
}

// ─── Parser ─────────────────────────────────────────────────────────────────

/// Bracketed paste opening delimiter: `ESC [ 200 ~`
pub const PASTE_START: &str = "\x1b[200~";
/// Bracketed paste closing delimiter: `ESC [ 201 ~`
pub const PASTE_END: &str = "\x1b[201~";

const FOCUS_IN: &str = "\x1b[I";
const FOCUS_OUT: &str = "\x1b[O";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// How long an incomplete escape may wait for more input before it is
    /// resolved as-is.
    pub escape_timeout: Duration,
    /// How long a report request stays outstanding.
    pub dsr_timeout: Duration,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            escape_timeout: Duration::from_millis(50),
            dsr_timeout: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Ground,
    /// Saw ESC.
    Escape,
    /// Saw `ESC [`.
    Csi,
    /// Inside an operating system command (`ESC ]`).
    Osc,
    /// Accumulating CSI parameters.
    Params,
    /// Inside a bracketed paste.
    Paste,
    /// The next character completes the sequence.
    ExecuteNext,
}

pub struct Parser {
    config: ParserConfig,
    state: State,
    escape: String,
    paste: String,
    events: Vec<Event>,
    timer: Timer,
    /// Deadlines of outstanding report requests, oldest first.
    dsr_pending: VecDeque<Instant>,
    last_mouse: Point,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    partial: Vec<u8>,
}

impl Parser {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            state: State::Ground,
            escape: String::new(),
            paste: String::new(),
            events: Vec::new(),
            timer: Timer::new(),
            dsr_pending: VecDeque::new(),
            last_mouse: Point::ORIGIN,
            partial: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> State {
        self.state
    }

    /// When the escape timer fires, if armed.
    #[inline]
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    /// Whether any report request is still outstanding.
    #[inline]
    #[must_use]
    pub fn is_expecting_dsr(&self) -> bool {
        !self.dsr_pending.is_empty()
    }

    /// Drain the events produced so far.
    pub fn events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    /// Queue a resize behind whatever input has already been parsed.
    pub fn push_resize(&mut self, size: Size) {
        self.events.push(Event::Resize(size));
    }

    // ── Feeding ─────────────────────────────────────────────────

    pub fn feed(&mut self, data: &str) {
        self.feed_at(data, Instant::now());
    }

    /// Process `data` in order, then re-arm the escape timer if the
    /// parser was left mid-sequence.
    pub fn feed_at(&mut self, data: &str, now: Instant) {
        self.timer.cancel();
        for c in data.chars() {
            self.process(c, now);
        }
        if self.state != State::Ground {
            self.timer.arm(now, self.config.escape_timeout);
        }
    }

    pub fn feed_bytes(&mut self, data: &[u8]) {
        self.feed_bytes_at(data, Instant::now());
    }

    /// Decode `data` as UTF-8 and feed it.
    ///
    /// A multi-byte character split across chunks is held back until the
    /// rest arrives. Invalid bytes become U+FFFD.
    pub fn feed_bytes_at(&mut self, data: &[u8], now: Instant) {
        let mut bytes = mem::take(&mut self.partial);
        bytes.extend_from_slice(data);

        let mut text = String::with_capacity(bytes.len());
        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    if let Some(len) = err.error_len() {
                        text.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    } else {
                        self.partial = after.to_vec();
                        break;
                    }
                }
            }
        }
        self.feed_at(&text, now);
        if !self.partial.is_empty() {
            self.timer.arm(now, self.config.escape_timeout);
        }
    }

    /// Handle an expired escape timer, and let lapsed report requests go.
    ///
    /// A timed-out paste is delivered as far as it got, minus any prefix
    /// of the end marker cut off by the chunk boundary. A UTF-8 sequence
    /// whose remaining bytes never arrived becomes U+FFFD.
    pub fn tick(&mut self, now: Instant) {
        self.prune_dsr(now);
        if !self.timer.fire(now) {
            return;
        }
        if !self.partial.is_empty() {
            trace!(bytes = ?self.partial, "truncated utf-8 timed out");
            self.partial.clear();
            self.process(char::REPLACEMENT_CHARACTER, now);
            if self.state != State::Ground {
                self.timer.arm(now, self.config.escape_timeout);
            }
            return;
        }
        if self.state == State::Paste {
            if let Some(i) = self.paste.rfind('\x1b') {
                if PASTE_END.starts_with(&self.paste[i..]) {
                    self.paste.truncate(i);
                }
            }
            trace!(len = self.paste.len(), "paste timed out");
            self.finish_paste();
        } else {
            trace!(escape = ?self.escape, "escape timed out");
            self.execute(now);
        }
    }

    // ── Report requests ─────────────────────────────────────────

    /// Write `CSI 6n` to `out`; the reply arrives as
    /// [`Event::CursorPositionReport`].
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn request_cursor_position_report(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.request(out, ansi::REQUEST_CURSOR_POSITION)
    }

    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn request_foreground_color(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.request(out, ansi::REQUEST_FOREGROUND_COLOR)
    }

    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn request_background_color(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.request(out, ansi::REQUEST_BACKGROUND_COLOR)
    }

    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn request_device_attributes(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.request(out, ansi::REQUEST_DEVICE_ATTRIBUTES)
    }

    /// Ask for the cell size in pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn request_pixel_geometry(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.request(out, ansi::REQUEST_PIXEL_GEOMETRY)
    }

    /// Ask for the text area size in pixels.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn request_terminal_geometry(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.request(out, ansi::REQUEST_TERMINAL_GEOMETRY)
    }

    /// Record a report request written by someone else.
    pub fn expect_dsr(&mut self) {
        self.expect_dsr_at(Instant::now());
    }

    pub fn expect_dsr_at(&mut self, now: Instant) {
        self.dsr_pending.push_back(now + self.config.dsr_timeout);
    }

    fn request(&mut self, out: &mut impl Write, query: &[u8]) -> io::Result<()> {
        out.write_all(query)?;
        self.expect_dsr();
        Ok(())
    }

    fn prune_dsr(&mut self, now: Instant) {
        while self.dsr_pending.front().is_some_and(|&deadline| now >= deadline) {
            self.dsr_pending.pop_front();
        }
    }

    // ── State machine ───────────────────────────────────────────

    fn process(&mut self, c: char, now: Instant) {
        match self.state {
            State::Paste => {
                self.paste.push(c);
                if c == '~' && self.paste.ends_with(PASTE_END) {
                    self.paste.truncate(self.paste.len() - PASTE_END.len());
                    self.finish_paste();
                }
            }
            State::Osc => {
                self.escape.push(c);
                if c == '\x07' || self.escape.ends_with("\x1b\\") {
                    self.execute(now);
                }
            }
            _ if c == '\x1b' => {
                // A new escape resolves whatever was pending first.
                if self.state != State::Ground {
                    self.execute(now);
                }
                self.escape.push(c);
                self.state = State::Escape;
            }
            State::Ground => {
                if c < ' ' || c == '\x7f' || c == '\u{9b}' {
                    self.escape.push(c);
                    self.execute(now);
                } else {
                    self.events.push(Event::Key(KeyEvent::plain(KeyCode::Char(c))));
                }
            }
            State::Escape => {
                self.escape.push(c);
                match c {
                    '[' => self.state = State::Csi,
                    'O' => self.state = State::ExecuteNext,
                    ']' => self.state = State::Osc,
                    _ => self.execute(now),
                }
            }
            State::Csi => {
                self.escape.push(c);
                match c {
                    '[' => self.state = State::ExecuteNext,
                    '<' | '?' => self.state = State::Params,
                    c if is_param(c) => self.state = State::Params,
                    _ => self.execute(now),
                }
            }
            State::Params => {
                self.escape.push(c);
                if !is_param(c) {
                    self.execute(now);
                }
            }
            State::ExecuteNext => {
                self.escape.push(c);
                self.execute(now);
            }
        }
    }

    fn finish_paste(&mut self) {
        let paste = mem::take(&mut self.paste);
        self.state = State::Ground;
        self.events
            .push(Event::Paste(paste.replace("\r\n", "\n").replace('\r', "\n")));
    }

    /// Resolve the escape buffer.
    fn execute(&mut self, now: Instant) {
        self.state = State::Ground;
        let escape = mem::take(&mut self.escape);
        if escape.is_empty() {
            return;
        }

        self.prune_dsr(now);
        if !self.dsr_pending.is_empty() {
            if let Some(report) = decode_report(&escape) {
                self.dsr_pending.pop_front();
                self.events.push(report);
                return;
            }
        }

        if escape == PASTE_START {
            self.state = State::Paste;
            self.paste.clear();
            return;
        }

        let event = match escape.as_str() {
            FOCUS_IN => Event::Focus(Focus::In),
            FOCUS_OUT => Event::Focus(Focus::Out),
            _ => {
                if let Some(mouse) = self.decode_mouse(&escape) {
                    Event::Mouse(mouse)
                } else if let Some(key) = decode_key(&escape) {
                    Event::Key(key)
                } else {
                    debug!(escape = ?escape, "unknown escape sequence");
                    Event::UnknownEscape(escape)
                }
            }
        };
        self.events.push(event);
    }

    /// SGR mouse: `CSI < b ; x ; y M` (press/motion) or `m` (release).
    fn decode_mouse(&mut self, escape: &str) -> Option<MouseEvent> {
        let body = escape.strip_prefix("\x1b[<")?;
        let (body, release) = match body.strip_suffix('M') {
            Some(body) => (body, false),
            None => (body.strip_suffix('m')?, true),
        };
        let [code, x, y] = params::<3>(body)?;

        let pos = Point::new(one_based(y), one_based(x));
        let dy = pos.y - self.last_mouse.y;
        let dx = pos.x - self.last_mouse.x;
        self.last_mouse = pos;

        let mut button = [
            MouseButton::Left,
            MouseButton::Middle,
            MouseButton::Right,
            MouseButton::NoButton,
        ][(code % 4) as usize];

        let kind = if code & 64 != 0 {
            button = MouseButton::NoButton;
            if code & 1 != 0 {
                MouseEventKind::ScrollDown
            } else {
                MouseEventKind::ScrollUp
            }
        } else if code & 32 != 0 {
            MouseEventKind::Move
        } else if release {
            MouseEventKind::Up
        } else if button == MouseButton::NoButton {
            MouseEventKind::Move
        } else {
            MouseEventKind::Down
        };

        let mut modifiers = Modifiers::empty();
        modifiers.set(Modifiers::SHIFT, code & 4 != 0);
        modifiers.set(Modifiers::ALT, code & 8 != 0);
        modifiers.set(Modifiers::CTRL, code & 16 != 0);

        Some(MouseEvent {
            pos,
            button,
            kind,
            modifiers,
            dy,
            dx,
            nclicks: 0,
        })
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Decoding helpers ───────────────────────────────────────────────────────

#[inline]
const fn is_param(c: char) -> bool {
    c.is_ascii_digit() || c == ';'
}

/// A non-empty run of ASCII digits that fits in `u32`.
fn parse_u32(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Exactly `N` semicolon-separated numbers.
fn params<const N: usize>(body: &str) -> Option<[u32; N]> {
    let mut out = [0; N];
    let mut parts = body.split(';');
    for slot in &mut out {
        *slot = parse_u32(parts.next()?)?;
    }
    parts.next().is_none().then_some(out)
}

/// Terminal coordinates are 1-based.
fn one_based(v: u32) -> i32 {
    i32::try_from(v.saturating_sub(1)).unwrap_or(i32::MAX)
}

fn decode_key(escape: &str) -> Option<KeyEvent> {
    if let Some(key) = keys::lookup(escape) {
        return Some(key);
    }
    // Alt+key arrives as ESC followed by the key.
    let rest = escape.strip_prefix('\x1b')?;
    let mut chars = rest.chars();
    if let (Some(c @ ' '..='~'), None) = (chars.next(), chars.next()) {
        return Some(KeyEvent::new(KeyCode::Char(c), Modifiers::ALT));
    }
    keys::lookup(rest).map(|key| KeyEvent::new(key.code, key.modifiers | Modifiers::ALT))
}

/// Replies to report requests. Only consulted while one is outstanding.
fn decode_report(escape: &str) -> Option<Event> {
    if let Some(body) = escape.strip_prefix("\x1b]") {
        return decode_color(body);
    }
    let body = escape.strip_prefix("\x1b[")?;

    if let Some(body) = body.strip_suffix('R') {
        let [row, col] = params::<2>(body)?;
        return Some(Event::CursorPositionReport(Point::new(
            one_based(row),
            one_based(col),
        )));
    }
    if let Some(body) = body.strip_prefix('?').and_then(|b| b.strip_suffix('c')) {
        let attrs = body
            .split(';')
            .map(parse_u32)
            .collect::<Option<BTreeSet<_>>>()?;
        return Some(Event::DeviceAttributesReport(attrs));
    }
    if let Some(body) = body.strip_suffix('t') {
        let [kind, height, width] = params::<3>(body)?;
        let kind = match kind {
            6 => GeometryKind::Cell,
            4 => GeometryKind::Terminal,
            _ => return None,
        };
        let size = Size::new(
            u16::try_from(height).ok()?,
            u16::try_from(width).ok()?,
        );
        return Some(Event::PixelGeometryReport { kind, size });
    }
    None
}

/// `OSC 1{0|1} ; rgb:rrrr/gggg/bbbb` terminated by ST or BEL.
///
/// Only the high byte of each channel is kept.
fn decode_color(body: &str) -> Option<Event> {
    let body = body
        .strip_suffix("\x1b\\")
        .or_else(|| body.strip_suffix('\x07'))?;
    let (kind, spec) = body.split_once(";rgb:")?;
    let kind = match kind {
        "10" => ColorKind::Fg,
        "11" => ColorKind::Bg,
        _ => return None,
    };

    let mut channels = [0u8; 3];
    let mut parts = spec.split('/');
    for channel in &mut channels {
        let part = parts.next()?;
        if part.len() < 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        *channel = u8::from_str_radix(&part[..2], 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Event::ColorReport {
        kind,
        color: Rgb::from(channels),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MS: Duration = Duration::from_millis(1);

    /// Feed `data`, then let any escape timer expire.
    fn parse(data: &str) -> Vec<Event> {
        let mut parser = Parser::new();
        let t0 = Instant::now();
        parser.feed_at(data, t0);
        parser.tick(t0 + 1000 * MS);
        parser.events()
    }

    fn parse_one(data: &str) -> Event {
        let events = parse(data);
        assert_eq!(events.len(), 1, "expected 1 event, got {events:?}");
        events.into_iter().next().unwrap()
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::plain(code))
    }

    fn key_mod(code: KeyCode, modifiers: Modifiers) -> Event {
        Event::Key(KeyEvent::new(code, modifiers))
    }

    fn mouse(data: &str) -> MouseEvent {
        match parse_one(data) {
            Event::Mouse(m) => m,
            other => panic!("expected mouse event, got {other:?}"),
        }
    }

    // ── Keys ────────────────────────────────────────────────────────────

    #[test]
    fn printable_chars() {
        assert_eq!(
            parse("aZ~é"),
            vec![
                key(KeyCode::Char('a')),
                key(KeyCode::Char('Z')),
                key(KeyCode::Char('~')),
                key(KeyCode::Char('é')),
            ]
        );
    }

    #[test]
    fn left_arrow() {
        assert_eq!(parse_one("\x1b[D"), key(KeyCode::Left));
    }

    #[test]
    fn ctrl_c() {
        assert_eq!(parse_one("\x03"), key_mod(KeyCode::Char('c'), Modifiers::CTRL));
    }

    #[test]
    fn enter_and_backspace() {
        assert_eq!(parse_one("\r"), key(KeyCode::Enter));
        assert_eq!(parse_one("\x7f"), key(KeyCode::Backspace));
    }

    #[test]
    fn ss3_function_key() {
        assert_eq!(parse_one("\x1bOP"), key(KeyCode::F(1)));
    }

    #[test]
    fn tilde_keys() {
        assert_eq!(parse_one("\x1b[3~"), key(KeyCode::Delete));
        assert_eq!(parse_one("\x1b[5;5~"), key_mod(KeyCode::PageUp, Modifiers::CTRL));
        assert_eq!(parse_one("\x1b[24~"), key(KeyCode::F(12)));
    }

    #[test]
    fn modified_arrow() {
        assert_eq!(
            parse_one("\x1b[1;6C"),
            key_mod(KeyCode::Right, Modifiers::SHIFT | Modifiers::CTRL)
        );
    }

    #[test]
    fn linux_console_function_key() {
        assert_eq!(parse_one("\x1b[[C"), key(KeyCode::F(3)));
    }

    #[test]
    fn alt_printable() {
        assert_eq!(parse_one("\x1bx"), key_mod(KeyCode::Char('x'), Modifiers::ALT));
    }

    #[test]
    fn alt_control() {
        assert_eq!(
            parse_one("\x1b\x7f"),
            key_mod(KeyCode::Backspace, Modifiers::ALT)
        );
        assert_eq!(
            parse_one("\x1b\x01"),
            key_mod(KeyCode::Char('a'), Modifiers::CTRL | Modifiers::ALT)
        );
    }

    #[test]
    fn keys_after_escape_sequence() {
        assert_eq!(
            parse("\x1b[Aab"),
            vec![key(KeyCode::Up), key(KeyCode::Char('a')), key(KeyCode::Char('b'))]
        );
    }

    // ── Escape timeout ──────────────────────────────────────────────────

    #[test]
    fn lone_escape_waits_for_timeout() {
        let mut parser = Parser::new();
        let t0 = Instant::now();
        parser.feed_at("\x1b", t0);
        assert!(parser.events().is_empty());
        assert_eq!(parser.state(), State::Escape);
        assert_eq!(parser.next_deadline(), Some(t0 + 50 * MS));

        parser.tick(t0 + 49 * MS);
        assert!(parser.events().is_empty());

        parser.tick(t0 + 50 * MS);
        assert_eq!(parser.events(), vec![key(KeyCode::Escape)]);
        assert_eq!(parser.state(), State::Ground);
        assert_eq!(parser.next_deadline(), None);
    }

    #[test]
    fn new_input_rearms_timer() {
        let mut parser = Parser::new();
        let t0 = Instant::now();
        parser.feed_at("\x1b", t0);
        parser.feed_at("[", t0 + 40 * MS);
        parser.tick(t0 + 60 * MS);
        assert!(parser.events().is_empty());
        parser.feed_at("B", t0 + 70 * MS);
        assert_eq!(parser.events(), vec![key(KeyCode::Down)]);
        assert_eq!(parser.next_deadline(), None);
    }

    #[test]
    fn timed_out_csi_prefix_is_alt_bracket() {
        assert_eq!(parse_one("\x1b["), key_mod(KeyCode::Char('['), Modifiers::ALT));
    }

    #[test]
    fn second_escape_resolves_the_first() {
        assert_eq!(
            parse("\x1b\x1b[A"),
            vec![key(KeyCode::Escape), key(KeyCode::Up)]
        );
    }

    #[test]
    fn tick_without_timer_is_a_no_op() {
        let mut parser = Parser::new();
        parser.feed("a");
        parser.tick(Instant::now() + 1000 * MS);
        assert_eq!(parser.events(), vec![key(KeyCode::Char('a'))]);
    }

    // ── Mouse ───────────────────────────────────────────────────────────

    #[test]
    fn sgr_left_down() {
        let m = mouse("\x1b[<0;11;6M");
        assert_eq!(m.pos, Point::new(5, 10));
        assert_eq!(m.button, MouseButton::Left);
        assert_eq!(m.kind, MouseEventKind::Down);
        assert_eq!(m.modifiers, Modifiers::empty());
        assert_eq!(m.nclicks, 0);
    }

    #[test]
    fn sgr_release() {
        let m = mouse("\x1b[<2;1;1m");
        assert_eq!(m.button, MouseButton::Right);
        assert_eq!(m.kind, MouseEventKind::Up);
    }

    #[test]
    fn sgr_motion_and_drag() {
        let drag = mouse("\x1b[<32;5;5M");
        assert_eq!(drag.kind, MouseEventKind::Move);
        assert_eq!(drag.button, MouseButton::Left);

        let hover = mouse("\x1b[<35;5;5M");
        assert_eq!(hover.kind, MouseEventKind::Move);
        assert_eq!(hover.button, MouseButton::NoButton);
    }

    #[test]
    fn sgr_scroll() {
        let up = mouse("\x1b[<64;3;3M");
        assert_eq!(up.kind, MouseEventKind::ScrollUp);
        assert_eq!(up.button, MouseButton::NoButton);
        assert_eq!(mouse("\x1b[<65;3;3M").kind, MouseEventKind::ScrollDown);
    }

    #[test]
    fn sgr_modifiers() {
        let m = mouse("\x1b[<28;1;1M");
        assert_eq!(
            m.modifiers,
            Modifiers::SHIFT | Modifiers::ALT | Modifiers::CTRL
        );
        assert_eq!(m.kind, MouseEventKind::Down);
    }

    #[test]
    fn mouse_deltas_track_last_position() {
        let events = parse("\x1b[<35;3;2M\x1b[<35;6;1M");
        let [Event::Mouse(a), Event::Mouse(b)] = events.as_slice() else {
            panic!("expected two mouse events, got {events:?}");
        };
        assert_eq!((a.dy, a.dx), (1, 2));
        assert_eq!((b.dy, b.dx), (-1, 3));
    }

    #[test]
    fn malformed_mouse_is_unknown() {
        assert_eq!(
            parse_one("\x1b[<0;11M"),
            Event::UnknownEscape("\x1b[<0;11M".into())
        );
    }

    // ── Paste ───────────────────────────────────────────────────────────

    #[test]
    fn bracketed_paste() {
        assert_eq!(
            parse_one("\x1b[200~hello\nworld\x1b[201~"),
            Event::Paste("hello\nworld".into())
        );
    }

    #[test]
    fn paste_keeps_escapes_and_normalizes_newlines() {
        assert_eq!(
            parse_one("\x1b[200~a\r\nb\rc\x1b[Ad\x1b[201~"),
            Event::Paste("a\nb\nc\x1b[Ad".into())
        );
    }

    #[test]
    fn paste_then_keys() {
        assert_eq!(
            parse("\x1b[200~x\x1b[201~y"),
            vec![Event::Paste("x".into()), key(KeyCode::Char('y'))]
        );
    }

    #[test]
    fn timed_out_paste_drops_partial_end_marker() {
        let mut parser = Parser::new();
        let t0 = Instant::now();
        parser.feed_at("\x1b[200~some text\x1b[20", t0);
        assert_eq!(parser.state(), State::Paste);
        parser.tick(t0 + 50 * MS);
        assert_eq!(parser.events(), vec![Event::Paste("some text".into())]);
        assert_eq!(parser.state(), State::Ground);
    }

    #[test]
    fn timed_out_paste_keeps_unrelated_escape() {
        let mut parser = Parser::new();
        let t0 = Instant::now();
        parser.feed_at("\x1b[200~abc\x1b[Ad", t0);
        parser.tick(t0 + 50 * MS);
        assert_eq!(parser.events(), vec![Event::Paste("abc\x1b[Ad".into())]);
    }

    // ── Focus & resize ──────────────────────────────────────────────────

    #[test]
    fn focus_events() {
        assert_eq!(parse_one("\x1b[I"), Event::Focus(Focus::In));
        assert_eq!(parse_one("\x1b[O"), Event::Focus(Focus::Out));
    }

    #[test]
    fn resize_is_ordered_with_input() {
        let mut parser = Parser::new();
        parser.feed("a");
        parser.push_resize(Size::new(24, 80));
        parser.feed("b");
        assert_eq!(
            parser.events(),
            vec![
                key(KeyCode::Char('a')),
                Event::Resize(Size::new(24, 80)),
                key(KeyCode::Char('b')),
            ]
        );
    }

    // ── Reports ─────────────────────────────────────────────────────────

    #[test]
    fn cursor_position_report_when_requested() {
        let mut parser = Parser::new();
        let mut out = Vec::new();
        parser.request_cursor_position_report(&mut out).unwrap();
        assert_eq!(out, b"\x1b[6n");
        assert!(parser.is_expecting_dsr());

        parser.feed("\x1b[12;40R");
        assert_eq!(
            parser.events(),
            vec![Event::CursorPositionReport(Point::new(11, 39))]
        );
        assert!(!parser.is_expecting_dsr());
    }

    #[test]
    fn report_shaped_input_without_request_is_a_key() {
        // Shift+F3 and a cursor position report share an encoding.
        assert_eq!(parse_one("\x1b[1;2R"), key_mod(KeyCode::F(3), Modifiers::SHIFT));
    }

    #[test]
    fn lapsed_request_stops_matching() {
        let mut parser = Parser::new();
        let t0 = Instant::now();
        parser.expect_dsr_at(t0);
        parser.tick(t0 + 200 * MS);
        assert!(!parser.is_expecting_dsr());
        parser.feed_at("\x1b[1;2R", t0 + 200 * MS);
        assert_eq!(
            parser.events(),
            vec![key_mod(KeyCode::F(3), Modifiers::SHIFT)]
        );
    }

    #[test]
    fn each_report_consumes_one_request() {
        let mut parser = Parser::new();
        let mut out = Vec::new();
        parser.request_cursor_position_report(&mut out).unwrap();
        parser.request_device_attributes(&mut out).unwrap();
        parser.feed("\x1b[1;1R\x1b[?61;4;22c\x1b[1;1R");
        let mut attrs = BTreeSet::new();
        attrs.extend([4, 22, 61]);
        assert_eq!(
            parser.events(),
            vec![
                Event::CursorPositionReport(Point::new(0, 0)),
                Event::DeviceAttributesReport(attrs),
                Event::UnknownEscape("\x1b[1;1R".into()),
            ]
        );
    }

    #[test]
    fn color_report_with_st() {
        let mut parser = Parser::new();
        let mut out = Vec::new();
        parser.request_background_color(&mut out).unwrap();
        assert_eq!(out, b"\x1b]11;?\x1b\\");
        parser.feed("\x1b]11;rgb:1e1e/2f2f/ffff\x1b\\");
        assert_eq!(
            parser.events(),
            vec![Event::ColorReport {
                kind: ColorKind::Bg,
                color: Rgb::new(0x1e, 0x2f, 0xff),
            }]
        );
    }

    #[test]
    fn color_report_with_bel() {
        let mut parser = Parser::new();
        let mut out = Vec::new();
        parser.request_foreground_color(&mut out).unwrap();
        parser.feed("\x1b]10;rgb:c0/c0/c0\x07");
        assert_eq!(
            parser.events(),
            vec![Event::ColorReport {
                kind: ColorKind::Fg,
                color: Rgb::new(0xc0, 0xc0, 0xc0),
            }]
        );
    }

    #[test]
    fn pixel_geometry_reports() {
        let mut parser = Parser::new();
        let mut out = Vec::new();
        parser.request_pixel_geometry(&mut out).unwrap();
        parser.request_terminal_geometry(&mut out).unwrap();
        assert_eq!(out, b"\x1b[16t\x1b[14t");
        parser.feed("\x1b[6;18;9t\x1b[4;432;720t");
        assert_eq!(
            parser.events(),
            vec![
                Event::PixelGeometryReport {
                    kind: GeometryKind::Cell,
                    size: Size::new(18, 9),
                },
                Event::PixelGeometryReport {
                    kind: GeometryKind::Terminal,
                    size: Size::new(432, 720),
                },
            ]
        );
    }

    #[test]
    fn unrequested_osc_is_unknown() {
        assert_eq!(
            parse_one("\x1b]11;rgb:0000/0000/0000\x1b\\"),
            Event::UnknownEscape("\x1b]11;rgb:0000/0000/0000\x1b\\".into())
        );
    }

    // ── Unknown & bytes ─────────────────────────────────────────────────

    #[test]
    fn unknown_csi() {
        assert_eq!(
            parse_one("\x1b[99~"),
            Event::UnknownEscape("\x1b[99~".into())
        );
    }

    #[test]
    fn c1_csi_is_a_one_char_escape() {
        assert_eq!(parse_one("\u{9b}"), Event::UnknownEscape("\u{9b}".into()));
    }

    #[test]
    fn split_utf8_across_byte_chunks() {
        let mut parser = Parser::new();
        let bytes = "日".as_bytes();
        parser.feed_bytes(&bytes[..1]);
        assert!(parser.events().is_empty());
        parser.feed_bytes(&bytes[1..]);
        assert_eq!(parser.events(), vec![key(KeyCode::Char('日'))]);
    }

    #[test]
    fn truncated_utf8_resolves_after_timeout() {
        let mut parser = Parser::new();
        let t0 = Instant::now();
        parser.feed_bytes_at(&"日".as_bytes()[..2], t0);
        assert!(parser.events().is_empty());
        assert_eq!(parser.next_deadline(), Some(t0 + 50 * MS));

        parser.tick(t0 + 10 * MS);
        assert!(parser.events().is_empty());
        parser.tick(t0 + 60 * MS);
        assert_eq!(
            parser.events(),
            vec![key(KeyCode::Char(char::REPLACEMENT_CHARACTER))]
        );
        assert_eq!(parser.next_deadline(), None);

        parser.feed_bytes_at(b"a", t0 + 70 * MS);
        assert_eq!(parser.events(), vec![key(KeyCode::Char('a'))]);
    }

    #[test]
    fn invalid_bytes_become_replacement_chars() {
        let mut parser = Parser::new();
        parser.feed_bytes(b"a\xffb");
        assert_eq!(
            parser.events(),
            vec![
                key(KeyCode::Char('a')),
                key(KeyCode::Char(char::REPLACEMENT_CHARACTER)),
                key(KeyCode::Char('b')),
            ]
        );
    }

    #[test]
    fn events_drains() {
        let mut parser = Parser::new();
        parser.feed("q");
        assert_eq!(parser.events().len(), 1);
        assert!(parser.events().is_empty());
    }
}
