// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No
// state and no decisions about when to emit; callers (the diff emitter,
// terminal setup, the parser's report requests) decide that. This module
// only knows the byte-level encoding.
//
// Positions are 0-indexed `(y, x)` in our API and converted to the
// terminal's 1-indexed form here.
//
// All functions return `io::Result` propagated from the underlying
// writer. Writing into a `Vec` or `OutputBuffer` never fails.

use std::io::{self, Write};

use crate::cell::Style;
use crate::color::Rgb;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(y, x)` (CUP).
#[inline]
pub fn cursor_to(w: &mut impl Write, y: usize, x: usize) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Move the cursor down `n` rows (CUD).
#[inline]
pub fn cursor_down(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}B")
}

/// Move the cursor to column `x` of the current row (CHA).
#[inline]
pub fn cursor_to_column(w: &mut impl Write, x: usize) -> io::Result<()> {
    write!(w, "\x1b[{}G", x + 1)
}

/// Move the cursor to the start of the line `n` rows up (CPL).
#[inline]
pub fn cursor_prev_line(w: &mut impl Write, n: usize) -> io::Result<()> {
    write!(w, "\x1b[{n}F")
}

/// Save cursor position and attributes (DECSC).
#[inline]
pub fn save_cursor(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b7")
}

/// Restore what [`save_cursor`] saved (DECRC).
#[inline]
pub fn restore_cursor(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b8")
}

#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Clear from the cursor to the end of the screen (ED 0).
#[inline]
pub fn erase_below(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0J")
}

/// Reset all SGR attributes (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

/// Set the window title (OSC 2).
#[inline]
pub fn set_title(w: &mut impl Write, title: &str) -> io::Result<()> {
    write!(w, "\x1b]2;{title}\x07")
}

// ─── SGR ─────────────────────────────────────────────────────────────────────

/// Reset, then set style flags and both colors in one CSI sequence.
///
/// `\x1b[0;` + one `N;` per set flag (bold, italic, underline,
/// strikethrough, overline, reverse) + `38;2;r;g;b;48;2;r;g;bm`.
pub fn sgr(w: &mut impl Write, style: Style, fg: Rgb, bg: Rgb) -> io::Result<()> {
    w.write_all(b"\x1b[0;")?;
    for (flag, code) in Style::SGR_CODES {
        if style.contains(flag) {
            w.write_all(code.as_bytes())?;
            w.write_all(b";")?;
        }
    }
    write!(
        w,
        "38;2;{};{};{};48;2;{};{};{}m",
        fg.r, fg.g, fg.b, bg.r, bg.g, bg.b
    )
}

// ─── Synchronized Output ─────────────────────────────────────────────────────

/// Begin synchronized output (DEC private mode 2026).
#[inline]
pub fn begin_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026h")
}

#[inline]
pub fn end_sync(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2026l")
}

// ─── Terminal Modes ──────────────────────────────────────────────────────────

/// Enter the alternate screen buffer (DEC 1049) and home the cursor.
#[inline]
pub fn enter_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049h\x1b[H")
}

#[inline]
pub fn exit_alt_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1049l")
}

/// Enable mouse reporting: button events (1000), any-motion (1003), SGR
/// coordinates (1006), and urxvt coordinates (1015) as a fallback.
#[inline]
pub fn enable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000h\x1b[?1003h\x1b[?1006h\x1b[?1015h")
}

#[inline]
pub fn disable_mouse(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1000l\x1b[?1003l\x1b[?1006l\x1b[?1015l")
}

/// Enable bracketed paste (DEC 2004).
#[inline]
pub fn enable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004h")
}

#[inline]
pub fn disable_bracketed_paste(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?2004l")
}

/// Enable focus in/out reports (DEC 1004).
#[inline]
pub fn enable_focus_reporting(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004h")
}

#[inline]
pub fn disable_focus_reporting(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?1004l")
}

// ─── Queries ─────────────────────────────────────────────────────────────────
//
// Each query makes the terminal write a report back on stdin. The input
// parser only decodes reports while it has an outstanding request.

/// Device status report: cursor position (`CSI 6n`).
pub const REQUEST_CURSOR_POSITION: &[u8] = b"\x1b[6n";
/// OSC 10 query: default foreground color.
pub const REQUEST_FOREGROUND_COLOR: &[u8] = b"\x1b]10;?\x1b\\";
/// OSC 11 query: default background color.
pub const REQUEST_BACKGROUND_COLOR: &[u8] = b"\x1b]11;?\x1b\\";
/// Primary device attributes (`CSI c`).
pub const REQUEST_DEVICE_ATTRIBUTES: &[u8] = b"\x1b[c";
/// Cell size in pixels (`CSI 16t`).
pub const REQUEST_PIXEL_GEOMETRY: &[u8] = b"\x1b[16t";
/// Text area size in pixels (`CSI 14t`).
pub const REQUEST_TERMINAL_GEOMETRY: &[u8] = b"\x1b[14t";
