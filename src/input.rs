//! Keyboard input and the bounded wait between ticks.

#[cfg(target_os = "linux")]
use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::Result;
#[cfg(target_os = "linux")]
use crate::signals::Geometry;
use crate::signals::Signals;

/// Longest single poll, so a SIGINT during a long delay is seen promptly.
const POLL_SLICE: Duration = Duration::from_millis(250);

/// What ended a wait for input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// The delay elapsed with no input.
    Timeout,
    /// A character key was pressed.
    Key(char),
    /// The terminal was resized.
    Resized,
    /// Ctrl+C, or SIGINT observed during the wait.
    Interrupted,
    /// Input is exhausted (Ctrl+D or a closed input stream).
    EndOfInput,
}

/// Translates terminal key events.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputHandler;

impl InputHandler {
    /// Creates a new input handler.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Maps a key event, or `None` for keys the monitor ignores.
    #[must_use]
    pub fn handle_key(&self, event: KeyEvent) -> Option<InputEvent> {
        if event.kind != KeyEventKind::Press {
            return None;
        }

        if event.modifiers.contains(KeyModifiers::CONTROL) {
            return match event.code {
                KeyCode::Char('c') => Some(InputEvent::Interrupted),
                KeyCode::Char('d') => Some(InputEvent::EndOfInput),
                _ => None,
            };
        }

        match event.code {
            KeyCode::Char(c) => Some(InputEvent::Key(c)),
            _ => None,
        }
    }
}

/// Something the sampling loop can wait on for a keypress.
pub trait InputSource {
    /// Blocks for at most `timeout` and reports what ended the wait.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails; end of input is an event,
    /// not an error.
    fn wait(&mut self, timeout: Duration) -> Result<InputEvent>;
}

/// Reads keys from the terminal through crossterm.
#[derive(Debug)]
pub struct TerminalInput<'a> {
    handler: InputHandler,
    signals: &'a Signals,
}

impl<'a> TerminalInput<'a> {
    /// Creates a reader that records resizes into `signals`.
    #[must_use]
    pub fn new(signals: &'a Signals) -> Self {
        Self { handler: InputHandler::new(), signals }
    }
}

/// Deadline for a wait; `None` when `timeout` is beyond what `Instant` holds.
fn deadline_after(timeout: Duration) -> Option<Instant> {
    Instant::now().checked_add(timeout)
}

/// Next poll length, or `None` once the deadline has passed.
fn next_slice(deadline: Option<Instant>) -> Option<Duration> {
    match deadline {
        Some(deadline) => {
            let remaining = deadline.saturating_duration_since(Instant::now());
            (!remaining.is_zero()).then(|| remaining.min(POLL_SLICE))
        }
        None => Some(POLL_SLICE),
    }
}

impl InputSource for TerminalInput<'_> {
    fn wait(&mut self, timeout: Duration) -> Result<InputEvent> {
        let deadline = deadline_after(timeout);

        loop {
            if self.signals.stop_requested() {
                return Ok(InputEvent::Interrupted);
            }

            let Some(slice) = next_slice(deadline) else {
                return Ok(InputEvent::Timeout);
            };
            if !event::poll(slice)? {
                continue;
            }

            match event::read()? {
                Event::Key(key) => {
                    if let Some(input) = self.handler.handle_key(key) {
                        return Ok(input);
                    }
                }
                Event::Resize(cols, rows) => {
                    self.signals.record_resize(cols, rows);
                    return Ok(InputEvent::Resized);
                }
                _ => {}
            }
        }
    }
}

/// Reads single bytes from a non-terminal descriptor such as piped stdin.
///
/// A zero-byte read is end of input. Since crossterm only watches the
/// controlling terminal, resizes are picked up by polling its size between
/// reads when `track_resize` is on.
#[cfg(target_os = "linux")]
#[derive(Debug)]
pub struct FdInput<'a> {
    fd: std::os::fd::RawFd,
    signals: &'a Signals,
    track_resize: bool,
}

#[cfg(target_os = "linux")]
impl<'a> FdInput<'a> {
    /// Reads from stdin and follows terminal resizes.
    #[must_use]
    pub fn stdin(signals: &'a Signals) -> Self {
        Self { fd: libc::STDIN_FILENO, signals, track_resize: true }
    }

    /// Reads from `fd`, which must stay open for the life of this value.
    #[must_use]
    pub fn new(fd: std::os::fd::RawFd, signals: &'a Signals) -> Self {
        Self { fd, signals, track_resize: false }
    }

    fn resized(&self) -> bool {
        if !self.track_resize {
            return false;
        }
        match crossterm::terminal::size() {
            Ok((cols, rows)) if Geometry::sanitized(cols, rows) != self.signals.geometry() => {
                self.signals.record_resize(cols, rows);
                true
            }
            _ => false,
        }
    }

    /// Waits up to `slice` for the descriptor to become readable.
    #[allow(unsafe_code)]
    fn poll_readable(&self, slice: Duration) -> io::Result<bool> {
        let mut pollfd = libc::pollfd { fd: self.fd, events: libc::POLLIN, revents: 0 };
        let millis = libc::c_int::try_from(slice.as_millis()).unwrap_or(libc::c_int::MAX);
        // SAFETY: one valid pollfd, and the count passed matches.
        let ready = unsafe { libc::poll(&mut pollfd, 1, millis) };
        if ready < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(err);
        }
        Ok(ready > 0)
    }

    /// Reads one byte; `None` at end of input.
    #[allow(unsafe_code)]
    fn read_byte(&self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        loop {
            // SAFETY: reads at most one byte into a live local.
            let n = unsafe { libc::read(self.fd, std::ptr::addr_of_mut!(byte).cast(), 1) };
            match n {
                0 => return Ok(None),
                1 => return Ok(Some(byte)),
                _ => {
                    let err = io::Error::last_os_error();
                    if err.kind() != io::ErrorKind::Interrupted {
                        return Err(err);
                    }
                }
            }
        }
    }
}

#[cfg(target_os = "linux")]
impl InputSource for FdInput<'_> {
    fn wait(&mut self, timeout: Duration) -> Result<InputEvent> {
        let deadline = deadline_after(timeout);

        loop {
            if self.signals.stop_requested() {
                return Ok(InputEvent::Interrupted);
            }
            if self.resized() {
                return Ok(InputEvent::Resized);
            }

            let Some(slice) = next_slice(deadline) else {
                return Ok(InputEvent::Timeout);
            };
            if !self.poll_readable(slice)? {
                continue;
            }

            return Ok(match self.read_byte()? {
                None => InputEvent::EndOfInput,
                Some(byte) => InputEvent::Key(char::from(byte)),
            });
        }
    }
}

/// Input for sessions that never wait, such as batch mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl InputSource for NoInput {
    fn wait(&mut self, _timeout: Duration) -> Result<InputEvent> {
        Ok(InputEvent::EndOfInput)
    }
}
