//! The sampling loop: fetch, sort, render, wait, repeat.

use std::io::{self, IsTerminal};
use std::time::Duration;

use crate::config::Settings;
use crate::error::{Result, SlabError};
#[cfg(target_os = "linux")]
use crate::input::FdInput;
use crate::input::{InputEvent, InputSource, NoInput, TerminalInput};
use crate::render::{self, Frame};
use crate::session::{DisplaySession, Screen, Session, SessionMode};
use crate::signals::{Signals, SIGNALS};
use crate::sort::SortCriterion;
use crate::types::SlabProvider;

/// Loop lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    /// A quit or interrupt was seen; the current tick is the last.
    Stopping,
    Stopped,
}

/// Why a run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Batch mode printed its single snapshot.
    Completed,
    /// The user pressed `q`.
    Quit,
    /// SIGINT or Ctrl+C.
    Interrupted,
    /// Input was exhausted.
    EndOfInput,
}

/// Drives a [`SlabProvider`] onto a [`Screen`].
pub struct SamplingLoop<'a, P: SlabProvider> {
    provider: P,
    mode: SessionMode,
    delay: Duration,
    max_nodes: usize,
    criterion: SortCriterion,
    signals: &'a Signals,
    state: LoopState,
    ticks: u64,
}

impl<'a, P: SlabProvider> SamplingLoop<'a, P> {
    /// Creates a loop that has not started yet.
    pub fn new(provider: P, settings: &Settings, signals: &'a Signals) -> Self {
        Self {
            provider,
            mode: settings.mode,
            delay: settings.delay,
            max_nodes: settings.max_nodes,
            criterion: settings.criterion,
            signals,
            state: LoopState::Stopped,
            ticks: 0,
        }
    }

    /// Criterion the next fetch will use.
    pub fn criterion(&self) -> SortCriterion {
        self.criterion
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Snapshots fetched so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The wrapped provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Runs until quit, interrupt, end of input, or (batch) one snapshot.
    ///
    /// # Errors
    ///
    /// A provider failure or an output/input error stops the loop and is
    /// returned unchanged; nothing is retried.
    pub fn run<S, I>(&mut self, screen: &mut S, input: &mut I) -> Result<Outcome>
    where
        S: Screen + ?Sized,
        I: InputSource + ?Sized,
    {
        self.state = LoopState::Running;
        let result = loop {
            match self.tick(screen, input) {
                Ok(None) => continue,
                Ok(Some(outcome)) => break Ok(outcome),
                Err(e) => break Err(e),
            }
        };
        self.state = LoopState::Stopped;

        match &result {
            Ok(outcome) => {
                crate::info!("loop", "stopped after {} ticks: {:?}", self.ticks, outcome);
            }
            Err(e) => {
                crate::error!("loop", "stopped after {} ticks: {}", self.ticks, e);
            }
        }
        result
    }

    /// Runs one iteration; `Some` means the loop is done.
    fn tick<S, I>(&mut self, screen: &mut S, input: &mut I) -> Result<Option<Outcome>>
    where
        S: Screen + ?Sized,
        I: InputSource + ?Sized,
    {
        if self.signals.stop_requested() {
            self.state = LoopState::Stopping;
            return Ok(Some(Outcome::Interrupted));
        }

        if self.mode == SessionMode::Interactive && self.signals.take_resized() {
            screen.redraw_if_geometry_changed()?;
        }

        let snapshot = self.provider.fetch_snapshot(self.max_nodes, self.criterion)?;
        self.ticks += 1;

        let row_limit = match self.mode {
            SessionMode::Interactive => screen.geometry().map(|g| render::available_rows(g.rows)),
            SessionMode::Batch => None,
        };
        screen.present(&Frame::compose(&snapshot, row_limit))?;

        if self.mode == SessionMode::Batch {
            self.state = LoopState::Stopping;
            return Ok(Some(Outcome::Completed));
        }

        match input.wait(self.delay)? {
            InputEvent::Timeout | InputEvent::Resized => Ok(None),
            InputEvent::Key(c) if c.eq_ignore_ascii_case(&'q') => {
                self.state = LoopState::Stopping;
                Ok(Some(Outcome::Quit))
            }
            InputEvent::Key(c) => {
                self.criterion = SortCriterion::resolve(c);
                crate::debug!("loop", "key {:?} -> sort by {:?}", c, self.criterion);
                Ok(None)
            }
            InputEvent::Interrupted => {
                self.signals.request_stop();
                Ok(None)
            }
            InputEvent::EndOfInput => {
                self.state = LoopState::Stopping;
                Ok(Some(Outcome::EndOfInput))
            }
        }
    }
}

/// Runs slabtop with `settings` against `provider` on the real terminal.
///
/// Keys come from the terminal when stdin is one, otherwise from stdin
/// itself so piped input and end of file behave as typed input would.
///
/// # Errors
///
/// See [`run_with`].
pub fn run<P: SlabProvider>(settings: &Settings, provider: P) -> Result<Outcome> {
    let sampler = SamplingLoop::new(provider, settings, &SIGNALS);
    let mut session = DisplaySession::new(settings.mode, &SIGNALS);

    match settings.mode {
        SessionMode::Batch => run_with(sampler, &mut session, &mut NoInput),
        SessionMode::Interactive if io::stdin().is_terminal() => {
            run_with(sampler, &mut session, &mut TerminalInput::new(&SIGNALS))
        }
        #[cfg(target_os = "linux")]
        SessionMode::Interactive => run_with(sampler, &mut session, &mut FdInput::stdin(&SIGNALS)),
        #[cfg(not(target_os = "linux"))]
        SessionMode::Interactive => {
            run_with(sampler, &mut session, &mut TerminalInput::new(&SIGNALS))
        }
    }
}

/// Runs `sampler` inside `session`, closing the session on every exit path
/// before the result is returned.
///
/// # Errors
///
/// Returns [`SlabError::ProviderUnavailable`] before touching the session
/// when the provider has no data source, otherwise session setup errors,
/// provider failures and I/O errors. A loop error wins over a close error.
pub fn run_with<P, S, I>(mut sampler: SamplingLoop<'_, P>, session: &mut S, input: &mut I) -> Result<Outcome>
where
    P: SlabProvider,
    S: Session + ?Sized,
    I: InputSource + ?Sized,
{
    if !sampler.provider().is_available() {
        return Err(SlabError::ProviderUnavailable { provider: sampler.provider().id() });
    }

    if let Err(e) = session.enter() {
        let _ = session.close();
        return Err(e);
    }
    let result = sampler.run(&mut *session, &mut *input);
    let closed = session.close();

    let outcome = result?;
    closed?;
    Ok(outcome)
}
