//! Flags shared between the sampling loop and asynchronous notifications.
//!
//! Writers (the SIGINT handler, the resize path in [`crate::input`]) only
//! store scalars here. The loop reads them at the top of each tick. No locks.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};

/// Terminal size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub cols: u16,
    pub rows: u16,
}

impl Geometry {
    /// Size assumed when the terminal reports something unusable.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };

    /// Accepts a reported size, falling back to 80x24 for 10 rows or fewer.
    #[must_use]
    pub fn sanitized(cols: u16, rows: u16) -> Self {
        if rows > 10 {
            Self { cols, rows }
        } else {
            Self::FALLBACK
        }
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Stop request, resize notification and the latest geometry.
#[derive(Debug)]
pub struct Signals {
    stop: AtomicBool,
    resized: AtomicBool,
    cols: AtomicU16,
    rows: AtomicU16,
}

/// Process-wide instance the SIGINT handler writes to.
pub static SIGNALS: Signals = Signals::new();

impl Signals {
    /// Creates a cleared set of flags with the fallback geometry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            resized: AtomicBool::new(false),
            cols: AtomicU16::new(Geometry::FALLBACK.cols),
            rows: AtomicU16::new(Geometry::FALLBACK.rows),
        }
    }

    /// Asks the loop to stop at its next checkpoint.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// True once a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Records a new terminal size and marks the geometry dirty.
    pub fn record_resize(&self, cols: u16, rows: u16) {
        let geometry = Geometry::sanitized(cols, rows);
        self.cols.store(geometry.cols, Ordering::SeqCst);
        self.rows.store(geometry.rows, Ordering::SeqCst);
        self.resized.store(true, Ordering::SeqCst);
    }

    /// Clears and returns the dirty flag.
    pub fn take_resized(&self) -> bool {
        self.resized.swap(false, Ordering::SeqCst)
    }

    /// Latest recorded geometry.
    pub fn geometry(&self) -> Geometry {
        Geometry { cols: self.cols.load(Ordering::SeqCst), rows: self.rows.load(Ordering::SeqCst) }
    }
}

impl Default for Signals {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "linux")]
extern "C" fn on_interrupt(_signal: libc::c_int) {
    SIGNALS.request_stop();
}

/// Routes SIGINT to [`SIGNALS`]'s stop flag.
///
/// # Errors
///
/// Returns the OS error if the handler cannot be installed.
#[cfg(target_os = "linux")]
#[allow(unsafe_code)]
pub fn install_interrupt_handler() -> std::io::Result<()> {
    let handler = on_interrupt as extern "C" fn(libc::c_int);
    // SAFETY: the handler only performs an atomic store.
    let previous = unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) };
    if previous == libc::SIG_ERR {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

/// Routes SIGINT to [`SIGNALS`]'s stop flag.
///
/// # Errors
///
/// Never fails on this platform; raw mode delivers Ctrl+C as a key instead.
#[cfg(not(target_os = "linux"))]
pub fn install_interrupt_handler() -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_signals_are_clear() {
        let signals = Signals::new();
        assert!(!signals.stop_requested());
        assert!(!signals.take_resized());
        assert_eq!(signals.geometry(), Geometry::FALLBACK);
    }

    #[test]
    fn test_request_stop_is_sticky() {
        let signals = Signals::new();
        signals.request_stop();
        assert!(signals.stop_requested());
        assert!(signals.stop_requested());
    }

    #[test]
    fn test_resize_sets_and_clears_dirty_flag() {
        let signals = Signals::new();
        signals.record_resize(132, 50);

        assert_eq!(signals.geometry(), Geometry { cols: 132, rows: 50 });
        assert!(signals.take_resized());
        assert!(!signals.take_resized());
    }

    #[test]
    fn test_tiny_terminal_falls_back() {
        assert_eq!(Geometry::sanitized(40, 10), Geometry::FALLBACK);
        assert_eq!(Geometry::sanitized(40, 11), Geometry { cols: 40, rows: 11 });
    }
}
