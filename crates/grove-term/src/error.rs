// SPDX-License-Identifier: MIT
//
// Errors from acquiring and driving the terminal.
//
// Only the terminal layer can fail. The canvas, emitter and parser have
// no error paths: emission propagates `io::Error` from its writer and
// the parser turns every input into some event.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// stdin or stdout is not attached to a terminal.
    #[error("not a terminal: {0} is not a tty")]
    NotATty(&'static str),

    /// The terminal did not report a usable size.
    #[error("could not determine terminal size")]
    UnknownSize,

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
