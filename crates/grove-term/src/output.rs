// SPDX-License-Identifier: MIT
//
// Output buffering.
//
// Everything written to the terminal during one loop iteration (mode
// switches, report requests, a whole emitted frame) accumulates here and
// goes out in a single `write()` at the end. One syscall per frame keeps
// the terminal from ever seeing half a frame outside synchronized
// output, and keeps report requests ordered with the frame they follow.

use std::io::{self, Write};

/// 16 KB covers a full repaint of a typical terminal without reallocating.
const DEFAULT_CAPACITY: usize = 16_384;

pub struct OutputBuffer {
    buf: Vec<u8>,
}

impl OutputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for tests and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Discard accumulated bytes, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to stdout and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to stdout fails.
    pub fn flush_stdout(&mut self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.flush_to(&mut lock)
    }

    /// Write accumulated output to `w` and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails. The buffer is kept so
    /// the caller may retry.
    pub fn flush_to(&mut self, w: &mut impl Write) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // No-op: real flushing goes through flush_stdout() / flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_writes() {
        let mut out = OutputBuffer::new();
        out.write_all(b"\x1b[6n").unwrap();
        write!(out, "{}", 42).unwrap();
        assert_eq!(out.as_bytes(), b"\x1b[6n42");
        assert_eq!(out.len(), 6);
    }

    #[test]
    fn flush_to_drains() {
        let mut out = OutputBuffer::new();
        out.write_all(b"abc").unwrap();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert_eq!(sink, b"abc");
        assert!(out.is_empty());
    }

    #[test]
    fn flush_of_empty_buffer_writes_nothing() {
        let mut out = OutputBuffer::new();
        let mut sink = Vec::new();
        out.flush_to(&mut sink).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut out = OutputBuffer::new();
        out.write_all(&[0; 100]).unwrap();
        out.clear();
        assert!(out.is_empty());
        assert!(out.buf.capacity() >= DEFAULT_CAPACITY);
    }
}
