//! Display session lifecycle and the output sinks.
//!
//! [`PlainScreen`] writes frames as plain lines.
//! [`DisplaySession`] owns the terminal in interactive mode: it saves the
//! terminal attributes, switches to a raw full-screen view, and restores
//! everything on [`Session::close`] or drop. In batch mode it forwards frames
//! to a [`PlainScreen`] on stdout.

use std::io::{self, IsTerminal, Stdout, Write};

use crossterm::terminal::{
    self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use crate::error::{Result, SlabError};
use crate::render::Frame;
use crate::signals::{self, Geometry, Signals};

/// Fixed at startup for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Full-screen, refreshing view.
    Interactive,
    /// One plain-text snapshot, then exit.
    Batch,
}

/// Output sink for rendered frames.
pub trait Screen {
    /// Current size, or `None` when output is not height-bound.
    fn geometry(&self) -> Option<Geometry>;

    /// Re-establishes the drawing area if the size changed since the last call.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be resized.
    fn redraw_if_geometry_changed(&mut self) -> Result<()>;

    /// Shows a frame.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the output fails.
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// A [`Screen`] with a setup and teardown around the run.
pub trait Session: Screen {
    /// Takes over the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be prepared. [`Self::close`]
    /// must still be called to undo partial setup.
    fn enter(&mut self) -> Result<()>;

    /// Gives the output back. Safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns the first error hit while restoring.
    fn close(&mut self) -> Result<()>;
}

/// Writes frames as newline-terminated lines.
#[derive(Debug)]
pub struct PlainScreen<W: Write> {
    out: W,
}

impl<W: Write> PlainScreen<W> {
    /// Wraps a writer.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Screen for PlainScreen<W> {
    fn geometry(&self) -> Option<Geometry> {
        None
    }

    fn redraw_if_geometry_changed(&mut self) -> Result<()> {
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        for line in frame.lines() {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Lifecycle state of a [`DisplaySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Closed,
}

/// Terminal ownership for one run.
///
/// In batch mode every operation only moves the state along.
pub struct DisplaySession<'a> {
    mode: SessionMode,
    state: SessionState,
    signals: &'a Signals,
    saved_tty: Option<SavedTty>,
    raw_mode: bool,
    alternate_screen: bool,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    applied: Geometry,
}

impl<'a> DisplaySession<'a> {
    /// Creates an uninitialized session.
    #[must_use]
    pub fn new(mode: SessionMode, signals: &'a Signals) -> Self {
        Self {
            mode,
            state: SessionState::Uninitialized,
            signals,
            saved_tty: None,
            raw_mode: false,
            alternate_screen: false,
            terminal: None,
            applied: Geometry::FALLBACK,
        }
    }

    /// The lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn terminal_mut(&mut self) -> Result<&mut Terminal<CrosstermBackend<Stdout>>> {
        self.terminal.as_mut().ok_or(SlabError::SessionInactive)
    }
}

impl Session for DisplaySession<'_> {
    /// Takes over the terminal (interactive mode only).
    ///
    /// Failure to read the terminal attributes is reported on stderr and the
    /// session continues without restoring them later.
    fn enter(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Ok(());
        }
        if self.mode == SessionMode::Batch {
            self.state = SessionState::Active;
            return Ok(());
        }

        self.saved_tty = match SavedTty::capture() {
            Ok(saved) => saved,
            Err(e) => {
                eprintln!("slabtop: terminal setting retrieval: {e}");
                crate::warn!("session", "tcgetattr failed: {}", e);
                None
            }
        };

        let (cols, rows) = terminal::size().unwrap_or((0, 0));
        self.signals.record_resize(cols, rows);
        self.signals.take_resized();
        self.applied = self.signals.geometry();

        self.state = SessionState::Active;
        enable_raw_mode()?;
        self.raw_mode = true;
        io::stdout().execute(EnterAlternateScreen)?;
        self.alternate_screen = true;

        let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        terminal.hide_cursor()?;
        terminal.clear()?;
        self.terminal = Some(terminal);

        signals::install_interrupt_handler()?;

        crate::info!("session", "entered full-screen mode at {}x{}", self.applied.cols, self.applied.rows);
        Ok(())
    }

    /// Restores the terminal.
    ///
    /// Every restore step runs even if an earlier one fails.
    fn close(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        self.state = SessionState::Closed;

        let mut first_error: Option<io::Error> = None;
        let mut record = |result: io::Result<()>| {
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        };

        if let Some(mut terminal) = self.terminal.take() {
            record(terminal.show_cursor());
        }
        if self.raw_mode {
            record(disable_raw_mode());
            self.raw_mode = false;
        }
        if self.alternate_screen {
            record(io::stdout().execute(LeaveAlternateScreen).map(|_| ()));
            self.alternate_screen = false;
        }
        if let Some(saved) = self.saved_tty.take() {
            record(saved.restore());
        }

        crate::info!("session", "terminal restored");
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

impl Screen for DisplaySession<'_> {
    fn geometry(&self) -> Option<Geometry> {
        match self.mode {
            SessionMode::Interactive => Some(self.signals.geometry()),
            SessionMode::Batch => None,
        }
    }

    fn redraw_if_geometry_changed(&mut self) -> Result<()> {
        if self.mode == SessionMode::Batch {
            return Ok(());
        }
        let current = self.signals.geometry();
        if current == self.applied {
            return Ok(());
        }

        let terminal = self.terminal_mut()?;
        terminal.resize(Rect::new(0, 0, current.cols, current.rows))?;
        terminal.clear()?;
        self.applied = current;
        crate::debug!("session", "resized to {}x{}", current.cols, current.rows);
        Ok(())
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        if self.mode == SessionMode::Batch {
            return PlainScreen::new(io::stdout().lock()).present(frame);
        }

        let mut lines: Vec<Line> = frame.summary.iter().map(|l| Line::raw(l.as_str())).collect();
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            frame.header.as_str(),
            Style::default().add_modifier(Modifier::REVERSED),
        ));
        lines.extend(frame.rows.iter().map(|r| Line::raw(r.as_str())));

        let terminal = self.terminal_mut()?;
        terminal.draw(|f| {
            let area = f.area();
            f.render_widget(Paragraph::new(lines), area);
        })?;
        Ok(())
    }
}

impl Drop for DisplaySession<'_> {
    fn drop(&mut self) {
        let _ = Session::close(self);
    }
}

/// Terminal attributes captured before raw mode, for exact restoration.
struct SavedTty {
    #[cfg(target_os = "linux")]
    attrs: libc::termios,
}

impl SavedTty {
    /// Captures stdin's attributes; `Ok(None)` when stdin is not a terminal.
    #[cfg(target_os = "linux")]
    #[allow(unsafe_code)]
    fn capture() -> io::Result<Option<Self>> {
        if !io::stdin().is_terminal() {
            return Ok(None);
        }
        // SAFETY: termios is plain data; tcgetattr fills it or fails.
        let mut attrs: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(libc::STDIN_FILENO, &mut attrs) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(Some(Self { attrs }))
    }

    #[cfg(target_os = "linux")]
    #[allow(unsafe_code)]
    fn restore(&self) -> io::Result<()> {
        // SAFETY: attrs came from a successful tcgetattr on the same fd.
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &self.attrs) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    #[cfg(not(target_os = "linux"))]
    fn capture() -> io::Result<Option<Self>> {
        Ok(None)
    }

    #[cfg(not(target_os = "linux"))]
    fn restore(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CacheNode, Snapshot, SummaryStats};

    fn frame() -> Frame {
        let node = CacheNode { name: "dentry".to_string(), objects: 10, ..CacheNode::default() };
        Frame::compose(&Snapshot::new(vec![node], SummaryStats::default()), None)
    }

    #[test]
    fn test_plain_screen_writes_all_lines() {
        let mut screen = PlainScreen::new(Vec::new());
        screen.present(&frame()).unwrap();

        let text = String::from_utf8(screen.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[5], "");
        assert!(lines[6].starts_with("  OBJS ACTIVE"));
        assert!(lines[7].contains("dentry"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_plain_screen_is_unbounded() {
        let mut screen = PlainScreen::new(Vec::new());
        assert_eq!(screen.geometry(), None);
        assert!(screen.redraw_if_geometry_changed().is_ok());
    }

    #[test]
    fn test_batch_session_lifecycle() {
        let signals = Signals::new();
        let mut session = DisplaySession::new(SessionMode::Batch, &signals);
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.enter().unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.geometry(), None);
        assert!(session.redraw_if_geometry_changed().is_ok());

        session.close().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
        session.close().unwrap();
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_interactive_present_needs_enter() {
        let signals = Signals::new();
        let mut session = DisplaySession::new(SessionMode::Interactive, &signals);

        assert!(matches!(session.present(&frame()), Err(SlabError::SessionInactive)));
    }

    #[test]
    fn test_close_without_enter() {
        let signals = Signals::new();
        let mut session = DisplaySession::new(SessionMode::Interactive, &signals);
        assert!(session.close().is_ok());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[test]
    fn test_interactive_geometry_reads_signals() {
        let signals = Signals::new();
        signals.record_resize(120, 40);
        let session = DisplaySession::new(SessionMode::Interactive, &signals);
        assert_eq!(session.geometry(), Some(Geometry { cols: 120, rows: 40 }));
    }
}
