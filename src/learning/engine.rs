//! Learning Engine - session-end analysis cycle
//!
//! Reads the full observation history, mines it for recurring tool
//! sequences, and persists one instinct per qualifying pattern. Thin
//! enough to run as a short-lived process on every session end.

use anyhow::Result;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::observation::ObservationStore;

use super::detector::PatternDetector;
use super::instinct::Instinct;
use super::store::InstinctStore;

/// Outcome of one analysis cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    pub observations_seen: usize,
    /// Instincts as persisted (post-merge confidence)
    pub instincts_saved: Vec<Instinct>,
    pub tool_counts: HashMap<String, u32>,
}

/// Drives detector, synthesis, and persistence over the two stores
pub struct LearningEngine {
    observations: ObservationStore,
    instincts: InstinctStore,
    detector: PatternDetector,
    min_observations: usize,
}

impl LearningEngine {
    pub fn new(
        observations: ObservationStore,
        instincts: InstinctStore,
        detector: PatternDetector,
        min_observations: usize,
    ) -> Self {
        Self {
            observations,
            instincts,
            detector,
            min_observations,
        }
    }

    /// Run one full cycle. "Not enough data" and "no patterns" are
    /// successful no-ops, not errors.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        info!("Starting pattern analysis");

        let observations = self.observations.load_all()?;
        let mut report = CycleReport {
            observations_seen: observations.len(),
            ..Default::default()
        };

        if observations.len() < self.min_observations {
            info!(
                "Not enough observations ({}), skipping analysis",
                observations.len()
            );
            return Ok(report);
        }

        info!("Analyzing {} observations", observations.len());
        let analysis = self.detector.analyze(&observations);
        report.tool_counts = analysis.tool_counts;

        if analysis.qualifying.is_empty() {
            info!("No significant patterns detected");
            self.log_tool_summary(&report.tool_counts);
            return Ok(report);
        }

        info!("Found {} patterns", analysis.qualifying.len());

        for pattern in &analysis.qualifying {
            let candidate = Instinct::from_pattern(pattern);
            match self.instincts.save(&candidate) {
                Ok(saved) => report.instincts_saved.push(saved),
                Err(e) => warn!("Failed to save instinct {}: {}", candidate.id, e),
            }
        }

        self.log_tool_summary(&report.tool_counts);
        Ok(report)
    }

    /// Top five tools by invocation count, for the session summary
    fn log_tool_summary(&self, tool_counts: &HashMap<String, u32>) {
        if tool_counts.is_empty() {
            return;
        }
        let mut sorted: Vec<(&String, &u32)> = tool_counts.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        info!("Tool usage summary:");
        for (tool, count) in sorted.into_iter().take(5) {
            info!("  - {}: {} times", tool, count);
        }
    }
}
