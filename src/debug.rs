//! Opt-in debug logging.
//!
//! Lines go to stderr as `[+0000ms] [LEVEL] [component] message`. Logging is
//! off unless `--debug` is passed or `SLABTOP_DEBUG` is set to a non-empty
//! value other than `0`; the interactive screen owns the terminal, so redirect
//! stderr when enabling it there.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// Environment variable that switches debug logging on.
pub const ENV_VAR: &str = "SLABTOP_DEBUG";

static ENABLED: AtomicBool = AtomicBool::new(false);

/// Timestamps are relative to the first time logging was switched on.
static STARTED: OnceLock<Instant> = OnceLock::new();

/// Switches logging on or off for the whole process.
pub fn set_enabled(on: bool) {
    if on {
        STARTED.get_or_init(Instant::now);
    }
    ENABLED.store(on, Ordering::SeqCst);
}

/// Returns true if debug logging is enabled.
#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Enables logging when `flag` is set or [`ENV_VAR`] asks for it.
pub fn init(flag: bool) {
    let from_env = std::env::var(ENV_VAR).is_ok_and(|v| env_value_enables(&v));
    set_enabled(flag || from_env);
}

fn env_value_enables(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0"
}

fn elapsed_ms() -> u128 {
    STARTED.get().map_or(0, |start| start.elapsed().as_millis())
}

/// Severity of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }

    /// ANSI color for the level tag.
    fn color(self) -> &'static str {
        match self {
            Level::Debug => "\x1b[36m",
            Level::Info => "\x1b[32m",
            Level::Warn => "\x1b[33m",
            Level::Error => "\x1b[31m",
        }
    }
}

/// Formats one line without the color codes.
fn format_line(elapsed_ms: u128, level: Level, component: &str, message: &str) -> String {
    format!("[+{elapsed_ms:04}ms] [{:5}] [{component}] {message}", level.label())
}

/// Writes one log line if debug logging is enabled.
pub fn log(level: Level, component: &str, message: &str) {
    if !is_enabled() {
        return;
    }
    let _ = writeln!(
        io::stderr().lock(),
        "{}{}\x1b[0m",
        level.color(),
        format_line(elapsed_ms(), level, component, message)
    );
}

/// Logs with format arguments; the message is only built when enabled.
#[macro_export]
macro_rules! debug_log {
    ($level:expr, $component:expr, $($arg:tt)*) => {
        if $crate::debug::is_enabled() {
            $crate::debug::log($level, $component, &format!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! debug {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Debug, $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Info, $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Warn, $component, $($arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($component:expr, $($arg:tt)*) => {
        $crate::debug_log!($crate::debug::Level::Error, $component, $($arg)*)
    };
}

/// Logs how long its scope took when dropped.
pub struct TimingGuard {
    component: &'static str,
    operation: &'static str,
    start: Instant,
}

impl TimingGuard {
    pub fn new(component: &'static str, operation: &'static str) -> Self {
        Self { component, operation, start: Instant::now() }
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        if is_enabled() {
            let ms = self.start.elapsed().as_secs_f64() * 1000.0;
            log(Level::Debug, self.component, &format!("{} took {ms:.2}ms", self.operation));
        }
    }
}

/// Times the rest of the enclosing scope.
#[macro_export]
macro_rules! time_scope {
    ($component:expr, $operation:expr) => {
        let _timing = $crate::debug::TimingGuard::new($component, $operation);
    };
}
