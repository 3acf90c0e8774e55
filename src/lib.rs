//! slabtop library - live kernel slab cache monitor
//!
//! This module exposes the core components for testing and embedding.
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::field_reassign_with_default))]
//!
//! ## Architecture
//!
//! - **types**: cache records, summary statistics and the [`SlabProvider`] trait
//! - **collectors**: providers; [`ProcSlabinfo`] reads `/proc/slabinfo`
//! - **sort**: sort criteria and their key bindings
//! - **render**: fixed-width text for the summary block, header and rows
//! - **session**: terminal setup/teardown behind the [`Session`] and [`Screen`] seams
//! - **input**: bounded key waits on the terminal or piped stdin
//! - **signals**: interrupt and resize flags
//! - **app**: the sampling loop tying them together
//!
//! ## Example
//!
//! ```no_run
//! use slabtop::{app, Config, ProcSlabinfo, Settings};
//! use slabtop::cli::Cli;
//!
//! let cli = Cli { once: true, ..Cli::default() };
//! let settings = Settings::resolve(&cli, &Config::default())?;
//! let outcome = app::run(&settings, ProcSlabinfo::new())?;
//! println!("{outcome:?}");
//! # Ok::<(), slabtop::SlabError>(())
//! ```

pub mod app;
pub mod cli;
pub mod collectors;
pub mod config;
pub mod debug;
pub mod error;
pub mod input;
pub mod render;
pub mod session;
pub mod signals;
pub mod sort;
pub mod types;

// Re-export key types for convenience
pub use app::{run_with, LoopState, Outcome, SamplingLoop};
pub use collectors::ProcSlabinfo;
pub use config::{Config, Settings};
pub use error::{Result, SlabError};
pub use input::{InputEvent, InputSource};
pub use render::Frame;
pub use session::{DisplaySession, PlainScreen, Screen, Session, SessionMode};
pub use signals::{Geometry, Signals};
pub use sort::SortCriterion;
pub use types::{CacheNode, SlabProvider, Snapshot, SummaryStats};
