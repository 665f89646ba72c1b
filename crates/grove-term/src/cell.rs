// SPDX-License-Identifier: MIT
//
// Cell: one character position on screen.
//
// A cell holds a single codepoint, six style flags, and a foreground and
// background color. Cells are plain values: the canvas is a flat array
// of them and the diff is `!=` between two arrays.
//
// Wide characters (CJK, most emoji) occupy two columns. The left cell
// holds the codepoint; the right cell holds the continuation sentinel
// (`ch == 0`). A wide glyph whose right neighbour is anything other than
// the sentinel has been split by a later write and must not be emitted
// as a glyph.

use unicode_width::UnicodeWidthChar;

use crate::color::Rgb;

// ─── Style ───────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text style flags.
    ///
    /// Bit order is also SGR emission order: each set flag contributes its
    /// parameter to the per-cell SGR sequence in the order listed here.
    ///
    /// ```
    /// use grove_term::cell::Style;
    ///
    /// let style = Style::BOLD | Style::REVERSE;
    /// assert!(style.contains(Style::BOLD));
    /// assert!(!style.contains(Style::ITALIC));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Style: u8 {
        /// SGR 1.
        const BOLD          = 1 << 0;
        /// SGR 3.
        const ITALIC        = 1 << 1;
        /// SGR 4.
        const UNDERLINE     = 1 << 2;
        /// SGR 9.
        const STRIKETHROUGH = 1 << 3;
        /// SGR 53.
        const OVERLINE      = 1 << 4;
        /// SGR 7: swap foreground and background.
        const REVERSE       = 1 << 5;
    }
}

impl Style {
    /// `(flag, SGR parameter)` pairs in emission order.
    pub const SGR_CODES: [(Self, &'static str); 6] = [
        (Self::BOLD, "1"),
        (Self::ITALIC, "3"),
        (Self::UNDERLINE, "4"),
        (Self::STRIKETHROUGH, "9"),
        (Self::OVERLINE, "53"),
        (Self::REVERSE, "7"),
    ];
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// Codepoint stored in the right half of a wide character.
pub const CONTINUATION: u32 = 0;

const SPACE: u32 = b' ' as u32;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    /// Unicode codepoint, or [`CONTINUATION`].
    pub ch: u32,
    pub style: Style,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Cell {
    /// A space, white on black, no style.
    pub const BLANK: Self = Self {
        ch: SPACE,
        style: Style::empty(),
        fg: Rgb::WHITE,
        bg: Rgb::BLACK,
    };

    #[inline]
    #[must_use]
    pub const fn new(ch: char, fg: Rgb, bg: Rgb) -> Self {
        Self {
            ch: ch as u32,
            style: Style::empty(),
            fg,
            bg,
        }
    }

    #[inline]
    #[must_use]
    pub const fn styled(ch: char, style: Style, fg: Rgb, bg: Rgb) -> Self {
        Self {
            ch: ch as u32,
            style,
            fg,
            bg,
        }
    }

    /// The right half of a wide character painted with `owner`'s colors.
    #[inline]
    #[must_use]
    pub const fn continuation_of(owner: &Self) -> Self {
        Self {
            ch: CONTINUATION,
            ..*owner
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        self.ch == CONTINUATION
    }

    /// The codepoint as a `char`; `None` for continuation cells.
    #[inline]
    #[must_use]
    pub const fn character(&self) -> Option<char> {
        if self.ch == CONTINUATION {
            return None;
        }
        char::from_u32(self.ch)
    }

    /// Whether this cell holds a two-column glyph.
    #[inline]
    #[must_use]
    pub fn is_wide(&self) -> bool {
        self.character()
            .is_some_and(|c| c.width().unwrap_or(0) == 2)
    }

    #[inline]
    #[must_use]
    pub const fn with_char(self, ch: char) -> Self {
        Self {
            ch: ch as u32,
            ..self
        }
    }

    #[inline]
    #[must_use]
    pub const fn with_style(self, style: Style) -> Self {
        Self { style, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Rgb) -> Self {
        Self { fg, ..self }
    }

    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Rgb) -> Self {
        Self { bg, ..self }
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::BLANK
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_continuation() {
            write!(f, "Cell(continuation")?;
        } else {
            let ch = char::from_u32(self.ch).unwrap_or('?');
            write!(f, "Cell({ch:?}")?;
        }
        if !self.style.is_empty() {
            write!(f, ", {:?}", self.style)?;
        }
        write!(f, ", fg={}, bg={})", self.fg, self.bg)
    }
}
