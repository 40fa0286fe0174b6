//! instinct - session self-observation and pattern mining library
//!
//! Records every tool invocation of a coding-assistant session into an
//! append-only log, then mines the history for recurring tool sequences
//! and persists them as confidence-scored instincts.
//!
//! Two processes share this library:
//! - `instinct observe` runs once per tool-use hook and appends one
//!   observation, echoing the hook payload through unchanged.
//! - `instinct learn` runs at session end and reconciles qualifying
//!   patterns against the instinct store, merging repeated evidence.

pub mod cli;
pub mod config;
pub mod learning;
pub mod observation;

pub use config::{Paths, Settings};
pub use learning::{Instinct, InstinctStore, LearningEngine, PatternDetector};
pub use observation::{Capture, HookEvent, Observation, ObservationStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
