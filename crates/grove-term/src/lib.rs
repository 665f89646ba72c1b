// SPDX-License-Identifier: MIT
//
// grove-term: the terminal half of the grove compositor.
//
// Output side: a grid of styled cells (`Canvas`), a double-buffered
// frame pair (`FrameBuffers`), and the differential emitter that turns
// the cells changed since the last frame into cursor moves and SGR
// sequences. Input side: a VT100 state machine (`input::Parser`) that
// turns raw stdin into key, mouse, paste, focus, and report events,
// with timeout-based resolution of ambiguous escapes.
//
// No TUI framework underneath. Raw mode is termios, output is ANSI
// bytes, input is a byte stream.

pub mod ansi;
pub mod canvas;
pub mod cell;
pub mod click;
pub mod color;
pub mod diff;
pub mod error;
pub mod frame;
pub mod input;
mod keys;
pub mod output;
pub mod reader;
pub mod terminal;
pub mod timer;

pub use canvas::Canvas;
pub use cell::{Cell, Style};
pub use color::Rgb;
pub use error::{Error, Result};
pub use frame::FrameBuffers;
pub use input::{Event, Parser, ParserConfig};
