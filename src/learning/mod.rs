//! Pattern mining and instinct synthesis
//!
//! Turns the observation history into persisted, confidence-scored
//! instincts: the detector finds recurring tool-sequence windows, the
//! synthesizer converts them into instinct records, and the store merges
//! repeated evidence across analysis runs.

pub mod detector;
pub mod engine;
pub mod instinct;
pub mod store;

pub use detector::{Analysis, PatternDetector, PatternMatch};
pub use engine::{CycleReport, LearningEngine};
pub use instinct::Instinct;
pub use store::InstinctStore;
