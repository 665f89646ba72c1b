// SPDX-License-Identifier: MIT
//
// Static escape table: complete escape strings → named keys.
//
// Terminals disagree about how keys are encoded, so this is an explicit
// table rather than a decoder. Entries cover the xterm, VT220, rxvt and
// Linux console encodings the parser's state machine can deliver as a
// single resolved buffer. Modifier variants use xterm's `1 + bitmask`
// parameter (2 = Shift, 3 = Alt, 4 = Shift+Alt, 5 = Ctrl, 6 = Shift+Ctrl,
// 7 = Alt+Ctrl, 8 = Shift+Alt+Ctrl), spelled out entry by entry.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::input::{KeyCode, KeyEvent, Modifiers};

const N: Modifiers = Modifiers::empty();
const S: Modifiers = Modifiers::SHIFT;
const A: Modifiers = Modifiers::ALT;
const C: Modifiers = Modifiers::CTRL;
const SA: Modifiers = S.union(A);
const SC: Modifiers = S.union(C);
const AC: Modifiers = A.union(C);
const SAC: Modifiers = SA.union(C);

use KeyCode::{
    Backspace, Char, Delete, Down, End, Enter, Escape, Home, Insert, Left, PageDown, PageUp,
    Right, Tab, Up, F,
};

#[rustfmt::skip]
static TABLE: &[(&str, KeyCode, Modifiers)] = &[
    // ── C0 controls ─────────────────────────────────────────────
    ("\x00", Char(' '), C),
    ("\x01", Char('a'), C),
    ("\x02", Char('b'), C),
    ("\x03", Char('c'), C),
    ("\x04", Char('d'), C),
    ("\x05", Char('e'), C),
    ("\x06", Char('f'), C),
    ("\x07", Char('g'), C),
    ("\x08", Backspace, N),
    ("\x09", Tab, N),
    ("\x0a", Enter, N),
    ("\x0b", Char('k'), C),
    ("\x0c", Char('l'), C),
    ("\x0d", Enter, N),
    ("\x0e", Char('n'), C),
    ("\x0f", Char('o'), C),
    ("\x10", Char('p'), C),
    ("\x11", Char('q'), C),
    ("\x12", Char('r'), C),
    ("\x13", Char('s'), C),
    ("\x14", Char('t'), C),
    ("\x15", Char('u'), C),
    ("\x16", Char('v'), C),
    ("\x17", Char('w'), C),
    ("\x18", Char('x'), C),
    ("\x19", Char('y'), C),
    ("\x1a", Char('z'), C),
    ("\x1b", Escape, N),
    ("\x1c", Char('\\'), C),
    ("\x1d", Char(']'), C),
    ("\x1e", Char('^'), C),
    ("\x1f", Char('_'), C),
    ("\x7f", Backspace, N),

    // ── Cursor keys, normal and application mode ────────────────
    ("\x1b[A", Up, N),
    ("\x1b[B", Down, N),
    ("\x1b[C", Right, N),
    ("\x1b[D", Left, N),
    ("\x1b[H", Home, N),
    ("\x1b[F", End, N),
    ("\x1bOA", Up, N),
    ("\x1bOB", Down, N),
    ("\x1bOC", Right, N),
    ("\x1bOD", Left, N),
    ("\x1bOH", Home, N),
    ("\x1bOF", End, N),
    ("\x1bOM", Enter, N),
    ("\x1b[Z", Tab, S),

    // ── Modified cursor keys (xterm) ────────────────────────────
    ("\x1b[1;2A", Up, S),    ("\x1b[1;2B", Down, S),   ("\x1b[1;2C", Right, S),
    ("\x1b[1;2D", Left, S),  ("\x1b[1;2H", Home, S),   ("\x1b[1;2F", End, S),
    ("\x1b[1;3A", Up, A),    ("\x1b[1;3B", Down, A),   ("\x1b[1;3C", Right, A),
    ("\x1b[1;3D", Left, A),  ("\x1b[1;3H", Home, A),   ("\x1b[1;3F", End, A),
    ("\x1b[1;4A", Up, SA),   ("\x1b[1;4B", Down, SA),  ("\x1b[1;4C", Right, SA),
    ("\x1b[1;4D", Left, SA), ("\x1b[1;4H", Home, SA),  ("\x1b[1;4F", End, SA),
    ("\x1b[1;5A", Up, C),    ("\x1b[1;5B", Down, C),   ("\x1b[1;5C", Right, C),
    ("\x1b[1;5D", Left, C),  ("\x1b[1;5H", Home, C),   ("\x1b[1;5F", End, C),
    ("\x1b[1;6A", Up, SC),   ("\x1b[1;6B", Down, SC),  ("\x1b[1;6C", Right, SC),
    ("\x1b[1;6D", Left, SC), ("\x1b[1;6H", Home, SC),  ("\x1b[1;6F", End, SC),
    ("\x1b[1;7A", Up, AC),   ("\x1b[1;7B", Down, AC),  ("\x1b[1;7C", Right, AC),
    ("\x1b[1;7D", Left, AC), ("\x1b[1;7H", Home, AC),  ("\x1b[1;7F", End, AC),
    ("\x1b[1;8A", Up, SAC),  ("\x1b[1;8B", Down, SAC), ("\x1b[1;8C", Right, SAC),
    ("\x1b[1;8D", Left, SAC),("\x1b[1;8H", Home, SAC), ("\x1b[1;8F", End, SAC),

    // ── Editing keys (VT220) ────────────────────────────────────
    ("\x1b[1~", Home, N),
    ("\x1b[2~", Insert, N),
    ("\x1b[3~", Delete, N),
    ("\x1b[4~", End, N),
    ("\x1b[5~", PageUp, N),
    ("\x1b[6~", PageDown, N),
    ("\x1b[7~", Home, N),
    ("\x1b[8~", End, N),
    ("\x1b[2;2~", Insert, S),   ("\x1b[2;3~", Insert, A),   ("\x1b[2;5~", Insert, C),
    ("\x1b[3;2~", Delete, S),   ("\x1b[3;3~", Delete, A),   ("\x1b[3;5~", Delete, C),
    ("\x1b[5;2~", PageUp, S),   ("\x1b[5;3~", PageUp, A),   ("\x1b[5;5~", PageUp, C),
    ("\x1b[6;2~", PageDown, S), ("\x1b[6;3~", PageDown, A), ("\x1b[6;5~", PageDown, C),

    // ── Function keys ───────────────────────────────────────────
    ("\x1bOP", F(1), N),
    ("\x1bOQ", F(2), N),
    ("\x1bOR", F(3), N),
    ("\x1bOS", F(4), N),
    ("\x1b[11~", F(1), N),
    ("\x1b[12~", F(2), N),
    ("\x1b[13~", F(3), N),
    ("\x1b[14~", F(4), N),
    ("\x1b[15~", F(5), N),
    ("\x1b[17~", F(6), N),
    ("\x1b[18~", F(7), N),
    ("\x1b[19~", F(8), N),
    ("\x1b[20~", F(9), N),
    ("\x1b[21~", F(10), N),
    ("\x1b[23~", F(11), N),
    ("\x1b[24~", F(12), N),
    ("\x1b[25~", F(13), N),
    ("\x1b[26~", F(14), N),
    ("\x1b[28~", F(15), N),
    ("\x1b[29~", F(16), N),
    ("\x1b[31~", F(17), N),
    ("\x1b[32~", F(18), N),
    ("\x1b[33~", F(19), N),
    ("\x1b[34~", F(20), N),

    // Linux console sends F1-F5 as a doubled CSI.
    ("\x1b[[A", F(1), N),
    ("\x1b[[B", F(2), N),
    ("\x1b[[C", F(3), N),
    ("\x1b[[D", F(4), N),
    ("\x1b[[E", F(5), N),

    // ── Modified function keys (xterm) ──────────────────────────
    ("\x1b[1;2P", F(1), S),    ("\x1b[1;5P", F(1), C),
    ("\x1b[1;2Q", F(2), S),    ("\x1b[1;5Q", F(2), C),
    ("\x1b[1;2R", F(3), S),    ("\x1b[1;5R", F(3), C),
    ("\x1b[1;2S", F(4), S),    ("\x1b[1;5S", F(4), C),
    ("\x1b[15;2~", F(5), S),   ("\x1b[15;5~", F(5), C),
    ("\x1b[17;2~", F(6), S),   ("\x1b[17;5~", F(6), C),
    ("\x1b[18;2~", F(7), S),   ("\x1b[18;5~", F(7), C),
    ("\x1b[19;2~", F(8), S),   ("\x1b[19;5~", F(8), C),
    ("\x1b[20;2~", F(9), S),   ("\x1b[20;5~", F(9), C),
    ("\x1b[21;2~", F(10), S),  ("\x1b[21;5~", F(10), C),
    ("\x1b[23;2~", F(11), S),  ("\x1b[23;5~", F(11), C),
    ("\x1b[24;2~", F(12), S),  ("\x1b[24;5~", F(12), C),
];

static LOOKUP: LazyLock<HashMap<&'static str, KeyEvent>> = LazyLock::new(|| {
    TABLE
        .iter()
        .map(|&(seq, code, modifiers)| (seq, KeyEvent { code, modifiers }))
        .collect()
});

/// The key a complete escape string encodes, if it is in the table.
pub fn lookup(escape: &str) -> Option<KeyEvent> {
    LOOKUP.get(escape).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn no_duplicate_sequences() {
        let mut seen = HashSet::new();
        for (seq, ..) in TABLE {
            assert!(seen.insert(seq), "duplicate entry {seq:?}");
        }
    }

    #[test]
    fn every_c0_control_is_mapped() {
        for b in 0u8..0x20 {
            let s = char::from(b).to_string();
            assert!(lookup(&s).is_some(), "missing C0 {b:#04x}");
        }
    }

    #[test]
    fn representative_entries() {
        assert_eq!(lookup("\x1b[D"), Some(KeyEvent { code: Left, modifiers: N }));
        assert_eq!(lookup("\x03"), Some(KeyEvent { code: Char('c'), modifiers: C }));
        assert_eq!(lookup("\x1b[1;5C"), Some(KeyEvent { code: Right, modifiers: C }));
        assert_eq!(lookup("\x1b[24~"), Some(KeyEvent { code: F(12), modifiers: N }));
        assert_eq!(lookup("\x1b[[E"), Some(KeyEvent { code: F(5), modifiers: N }));
        assert_eq!(lookup("\x1b[99~"), None);
    }
}
