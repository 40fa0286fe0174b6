//! Sequence Pattern Detector - windowed repetition mining
//!
//! Scans the tool_start stream oldest-first, collecting fixed-length
//! windows that overlap by all but one entry, then counts identical
//! windows across the whole history. Windows are not reset at session
//! boundaries; see DESIGN.md.

use std::collections::HashMap;

use crate::config::Settings;
use crate::observation::{HookEvent, Observation};

/// A recurring tool sequence and how often it was seen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternMatch {
    /// Tokens joined with " -> ", the identity used for counting
    pub key: String,
    pub tools: Vec<String>,
    pub count: u32,
}

/// Result of one analysis pass over the observation history
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    /// Patterns at or above the promotion threshold, most frequent first
    pub qualifying: Vec<PatternMatch>,
    /// Raw per-tool invocation counts, for reporting only
    pub tool_counts: HashMap<String, u32>,
}

/// Fixed-window detector over the tool-name stream
pub struct PatternDetector {
    window: usize,
    min_count: u32,
}

impl PatternDetector {
    pub fn new(window: usize, min_count: u32) -> Self {
        Self {
            // A zero-length window would never complete; clamp it
            window: window.max(1),
            min_count,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.pattern_window, settings.min_pattern_count)
    }

    /// Collect every completed window over the tool_start stream. After the
    /// first snapshot each window advances by exactly one tool, so
    /// consecutive windows overlap by window - 1 entries.
    pub fn windows(&self, observations: &[Observation]) -> Vec<Vec<String>> {
        let mut windows = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for obs in observations {
            if obs.event != HookEvent::ToolStart {
                continue;
            }
            current.push(obs.tool.clone());
            if current.len() >= self.window {
                windows.push(current.clone());
                current = current[current.len() - (self.window - 1)..].to_vec();
            }
        }

        windows
    }

    /// Run the full pass: window collection, counting, and the promotion
    /// filter, plus the per-tool frequency table.
    pub fn analyze(&self, observations: &[Observation]) -> Analysis {
        let mut tool_counts: HashMap<String, u32> = HashMap::new();
        for obs in observations {
            if obs.event == HookEvent::ToolStart {
                *tool_counts.entry(obs.tool.clone()).or_insert(0) += 1;
            }
        }

        let mut window_counts: HashMap<String, (Vec<String>, u32)> = HashMap::new();
        for window in self.windows(observations) {
            let key = window.join(" -> ");
            window_counts
                .entry(key)
                .and_modify(|(_, count)| *count += 1)
                .or_insert((window, 1));
        }

        let mut qualifying: Vec<PatternMatch> = window_counts
            .into_iter()
            .filter(|(_, (_, count))| *count >= self.min_count)
            .map(|(key, (tools, count))| PatternMatch { key, tools, count })
            .collect();
        // Deterministic order: most frequent first, key as tiebreaker
        qualifying.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));

        Analysis {
            qualifying,
            tool_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts(tools: &[&str]) -> Vec<Observation> {
        tools
            .iter()
            .map(|t| Observation::start(t.to_string(), "s1".to_string(), None))
            .collect()
    }

    #[test]
    fn test_overlapping_windows() {
        let detector = PatternDetector::new(3, 3);
        let observations = starts(&["A", "B", "C", "A", "B", "C", "A", "B", "C"]);

        let windows = detector.windows(&observations);
        let keys: Vec<String> = windows.iter().map(|w| w.join(",")).collect();
        assert_eq!(keys, vec!["A,B,C", "B,C,A", "C,A,B", "A,B,C"]);
    }

    #[test]
    fn test_three_repeats_do_not_qualify() {
        let detector = PatternDetector::new(3, 3);
        // A,B,C three times yields only two A,B,C windows
        let observations = starts(&["A", "B", "C", "A", "B", "C", "A", "B", "C"]);

        let analysis = detector.analyze(&observations);
        assert!(analysis.qualifying.is_empty());
    }

    #[test]
    fn test_four_repeats_qualify() {
        let detector = PatternDetector::new(3, 3);
        let observations = starts(&[
            "A", "B", "C", "A", "B", "C", "A", "B", "C", "A", "B", "C",
        ]);

        let analysis = detector.analyze(&observations);
        let abc = analysis
            .qualifying
            .iter()
            .find(|p| p.key == "A -> B -> C")
            .expect("A -> B -> C should qualify");
        assert_eq!(abc.count, 4);
        assert_eq!(abc.tools, vec!["A", "B", "C"]);

        // The interleaved rotations also reach the threshold here
        let bca = analysis.qualifying.iter().find(|p| p.key == "B -> C -> A");
        assert_eq!(bca.map(|p| p.count), Some(3));

        // Most frequent pattern sorts first
        assert_eq!(analysis.qualifying[0].key, "A -> B -> C");
    }

    #[test]
    fn test_only_tool_start_events_counted() {
        let detector = PatternDetector::new(3, 1);
        let mut observations = starts(&["A", "B"]);
        observations.push(Observation::complete(
            "C".to_string(),
            "s1".to_string(),
            None,
        ));
        observations.push(Observation::parse_error(
            "bad".to_string(),
            "raw".to_string(),
        ));
        observations.extend(starts(&["C"]));

        let windows = detector.windows(&observations);
        assert_eq!(windows, vec![vec!["A", "B", "C"]]);

        let analysis = detector.analyze(&observations);
        assert_eq!(analysis.tool_counts.len(), 3);
        assert_eq!(analysis.tool_counts["A"], 1);
        assert!(!analysis.tool_counts.contains_key("unknown"));
    }

    #[test]
    fn test_windows_span_sessions() {
        // Intentional: the stream is global, not per session
        let detector = PatternDetector::new(3, 1);
        let mut observations = vec![
            Observation::start("A".to_string(), "session-1".to_string(), None),
            Observation::start("B".to_string(), "session-1".to_string(), None),
        ];
        observations.push(Observation::start(
            "C".to_string(),
            "session-2".to_string(),
            None,
        ));

        let windows = detector.windows(&observations);
        assert_eq!(windows, vec![vec!["A", "B", "C"]]);
    }

    #[test]
    fn test_short_stream_yields_nothing() {
        let detector = PatternDetector::new(3, 3);
        let observations = starts(&["A", "B"]);
        assert!(detector.windows(&observations).is_empty());
        assert!(detector.analyze(&observations).qualifying.is_empty());
    }

    #[test]
    fn test_tool_frequency_table() {
        let detector = PatternDetector::new(3, 3);
        let observations = starts(&["A", "A", "B", "A", "C", "B"]);

        let analysis = detector.analyze(&observations);
        assert_eq!(analysis.tool_counts["A"], 3);
        assert_eq!(analysis.tool_counts["B"], 2);
        assert_eq!(analysis.tool_counts["C"], 1);
    }
}
