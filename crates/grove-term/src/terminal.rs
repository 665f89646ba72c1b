// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, mode switches, resize signal, RAII cleanup.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), isatty,
// sigaction and the raw fd write in the panic hook are all `unsafe` libc
// calls. Each block is as small as the call it wraps.
#![allow(unsafe_code)]
//
// `Terminal::acquire` is the one place startup can fail: both ends must be
// ttys and the size must be known. After `enter`, the terminal is in raw
// mode with the input reports the loop asked for, on the alternate screen
// unless frames are drawn inline below the prompt. `leave` (or drop, or a
// panic) puts everything back.
//
// The panic hook writes a pre-built restore sequence straight to fd 1
// instead of going through `io::stdout()`, because the panic may have
// happened while the stdout lock was held mid-frame.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, Once};

use grove_region::Size;
use tracing::debug;

use crate::ansi;
use crate::error::{Error, Result};

/// Used when the size cannot be queried (tests, pipes).
pub const FALLBACK_SIZE: Size = Size::new(24, 80);

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    if result == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
        Some(Size::new(ws.ws_row, ws.ws_col))
    } else {
        None
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

#[cfg(unix)]
#[must_use]
pub fn stdin_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(unix)]
#[must_use]
pub fn stdout_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn stdin_is_tty() -> bool {
    false
}

#[cfg(not(unix))]
#[must_use]
pub fn stdout_is_tty() -> bool {
    false
}

// ─── SIGWINCH ───────────────────────────────────────────────────────────────

static RESIZE_PENDING: AtomicBool = AtomicBool::new(false);
static RESIZE_HANDLER_INSTALLED: Once = Once::new();

/// Install a SIGWINCH handler that flags a pending resize.
///
/// The handler only stores to an atomic, which is async-signal-safe.
pub fn install_resize_handler() {
    RESIZE_HANDLER_INSTALLED.call_once(|| {
        #[cfg(unix)]
        unsafe {
            let mut sa: libc::sigaction = std::mem::zeroed();
            sa.sa_sigaction = sigwinch_handler as *const () as usize;
            sa.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&raw mut sa.sa_mask);
            libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
        }
    });
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    RESIZE_PENDING.store(true, Ordering::Relaxed);
}

/// Whether a resize was signalled since the last call.
pub fn take_resize() -> bool {
    RESIZE_PENDING.swap(false, Ordering::Relaxed)
}

// ─── Panic-Safe Terminal Restore ────────────────────────────────────────────

/// Original termios for the panic hook, which cannot reach the `Terminal`.
#[cfg(unix)]
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

#[cfg(unix)]
fn restore_termios_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, original);
            }
        }
    }
}

/// Everything `leave` would write, for use from the panic hook.
///
/// Alternate screen exit is last so the shell content comes back clean.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[?2026l\
    \x1b[?1000l\x1b[?1003l\x1b[?1006l\x1b[?1015l\
    \x1b[?2004l\
    \x1b[?1004l\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

static PANIC_HOOK_INSTALLED: Once = Once::new();

fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            emergency_restore();

            #[cfg(unix)]
            restore_termios_from_backup();

            original(info);
        }));
    });
}

fn emergency_restore() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let _ = io::stdout().write_all(EMERGENCY_RESTORE);
        let _ = io::stdout().flush();
    }
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Screen and input reports to turn on while the terminal is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modes {
    /// Switch to the alternate screen. Off for inline rendering.
    pub alt_screen: bool,
    pub mouse: bool,
    pub bracketed_paste: bool,
    pub focus_reporting: bool,
}

impl Default for Modes {
    fn default() -> Self {
        Self {
            alt_screen: true,
            mouse: true,
            bracketed_paste: true,
            focus_reporting: true,
        }
    }
}

/// Terminal handle with RAII cleanup.
///
/// ```no_run
/// use grove_term::terminal::{Modes, Terminal};
///
/// let mut term = Terminal::acquire()?;
/// term.enter(Modes::default())?;
/// // ... render frames, handle input ...
/// // Restored on drop.
/// # Ok::<(), grove_term::Error>(())
/// ```
pub struct Terminal {
    #[cfg(unix)]
    original_termios: Option<libc::termios>,
    size: Size,
    modes: Modes,
    active: bool,
}

impl Terminal {
    /// A handle that tolerates a missing tty, falling back to 24×80.
    ///
    /// Raw mode is skipped when stdin is not a terminal, so this works in
    /// tests and pipes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            original_termios: None,
            size: get_size().unwrap_or(FALLBACK_SIZE),
            modes: Modes::default(),
            active: false,
        }
    }

    /// A handle on a real interactive terminal.
    ///
    /// # Errors
    ///
    /// [`Error::NotATty`] if stdin or stdout is redirected, and
    /// [`Error::UnknownSize`] if the size query fails.
    pub fn acquire() -> Result<Self> {
        if !stdin_is_tty() {
            return Err(Error::NotATty("stdin"));
        }
        if !stdout_is_tty() {
            return Err(Error::NotATty("stdout"));
        }
        let size = get_size().ok_or(Error::UnknownSize)?;
        let mut term = Self::new();
        term.size = size;
        Ok(term)
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the size after SIGWINCH. Keeps the cached size on failure.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(s) = get_size() {
            self.size = s;
        }
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Raw mode and a hidden cursor, the alternate screen (cleared) if
    /// `modes.alt_screen`, plus the input reports selected by `modes`.
    /// No-op while already active.
    ///
    /// # Errors
    ///
    /// Returns an error if raw mode or terminal output fails.
    pub fn enter(&mut self, modes: Modes) -> Result<()> {
        if self.active {
            return Ok(());
        }

        install_panic_hook();
        self.enable_raw_mode()?;

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        Self::write_enter(&mut lock, modes)?;
        lock.flush()?;

        debug!(?modes, size = ?self.size, "entered terminal");
        self.modes = modes;
        self.active = true;
        Ok(())
    }

    /// Undo [`enter`](Self::enter). No-op while inactive.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal output or termios restore fails.
    pub fn leave(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }

        let stdout = io::stdout();
        let mut lock = stdout.lock();
        Self::write_leave(&mut lock, self.modes)?;
        lock.flush()?;
        drop(lock);

        self.disable_raw_mode()?;
        self.active = false;
        debug!("left terminal");
        Ok(())
    }

    fn write_enter(w: &mut impl Write, modes: Modes) -> io::Result<()> {
        if modes.alt_screen {
            ansi::enter_alt_screen(w)?;
        }
        ansi::cursor_hide(w)?;
        if modes.alt_screen {
            ansi::clear_screen(w)?;
        }
        if modes.mouse {
            ansi::enable_mouse(w)?;
        }
        if modes.bracketed_paste {
            ansi::enable_bracketed_paste(w)?;
        }
        if modes.focus_reporting {
            ansi::enable_focus_reporting(w)?;
        }
        Ok(())
    }

    fn write_leave(w: &mut impl Write, modes: Modes) -> io::Result<()> {
        ansi::end_sync(w)?;
        if modes.focus_reporting {
            ansi::disable_focus_reporting(w)?;
        }
        if modes.bracketed_paste {
            ansi::disable_bracketed_paste(w)?;
        }
        if modes.mouse {
            ansi::disable_mouse(w)?;
        }
        ansi::reset(w)?;
        ansi::cursor_show(w)?;
        if modes.alt_screen {
            ansi::exit_alt_screen(w)
        } else {
            ansi::erase_below(w)
        }
    }

    // ── Raw Mode (termios) ──────────────────────────────────────────

    #[cfg(unix)]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        use std::os::unix::io::AsRawFd;

        if !stdin_is_tty() {
            return Ok(());
        }

        let fd = io::stdin().as_raw_fd();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(fd, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original_termios = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // cfmakeraw equivalent.
            termios.c_iflag &= !(libc::IGNBRK
                | libc::BRKINT
                | libc::PARMRK
                | libc::ISTRIP
                | libc::INLCR
                | libc::IGNCR
                | libc::ICRNL
                | libc::IXON);
            termios.c_oflag &= !libc::OPOST;
            termios.c_lflag &=
                !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
            termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
            termios.c_cflag |= libc::CS8;
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(fd, libc::TCSAFLUSH, &raw const termios) != 0 {
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn enable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        if let Some(ref original) = self.original_termios {
            use std::os::unix::io::AsRawFd;
            let fd = io::stdin().as_raw_fd();

            unsafe {
                if libc::tcsetattr(fd, libc::TCSAFLUSH, original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }

            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.original_termios = None;
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn disable_raw_mode(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if self.active {
            let _ = self.leave();
        }
    }
}
