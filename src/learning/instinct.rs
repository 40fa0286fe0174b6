//! Instinct records - persisted, confidence-scored workflow suggestions
//!
//! An instinct is synthesized from one qualifying pattern. Its identity is
//! derived deterministically from the pattern tokens, so independent
//! analysis runs over the same habit land on the same file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::detector::PatternMatch;

/// Instinct domain tag for tool-sequence patterns
pub const DOMAIN_WORKFLOW: &str = "workflow";
/// Source tag for instincts mined from the observation log
pub const SOURCE_AUTO_OBSERVATION: &str = "auto-observation";

/// Confidence floor for a freshly synthesized instinct
const BASE_CONFIDENCE: f64 = 0.3;
/// Confidence gained per observed occurrence
const CONFIDENCE_PER_OCCURRENCE: f64 = 0.1;
/// Cap applied on first synthesis
const SYNTHESIS_CAP: f64 = 0.9;

/// A persisted behavioral suggestion derived from repeated tool sequences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instinct {
    pub id: String,
    pub trigger: String,
    pub action: String,
    /// Stored on disk as a 2-decimal string, e.g. "0.60"
    #[serde(with = "confidence_format")]
    pub confidence: f64,
    pub domain: String,
    pub source: String,
    #[serde(default)]
    pub evidence: Vec<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Instinct {
    /// Synthesize an instinct from a qualifying pattern. Pure apart from
    /// the creation timestamp.
    pub fn from_pattern(pattern: &PatternMatch) -> Self {
        let id = format!("workflow-{}", pattern.tools.join("-").to_lowercase());
        let confidence =
            (BASE_CONFIDENCE + CONFIDENCE_PER_OCCURRENCE * pattern.count as f64).min(SYNTHESIS_CAP);
        let first_tool = pattern
            .tools
            .first()
            .map(String::as_str)
            .unwrap_or("unknown");

        Self {
            id,
            trigger: format!("When starting {} task", first_tool),
            action: format!("Follow sequence: {}", pattern.key),
            confidence,
            domain: DOMAIN_WORKFLOW.to_string(),
            source: SOURCE_AUTO_OBSERVATION.to_string(),
            evidence: vec![format!("Observed {} times in session", pattern.count)],
            created_at: Utc::now(),
        }
    }

    /// Confidence rendered the way it is persisted
    pub fn confidence_label(&self) -> String {
        format!("{:.2}", self.confidence)
    }
}

/// Serialize confidence as a 2-decimal string; accept either a string or a
/// bare number when reading, so hand-edited files still load.
mod confidence_format {
    use serde::de::{self, Deserializer, Visitor};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:.2}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        struct ConfidenceVisitor;

        impl<'de> Visitor<'de> for ConfidenceVisitor {
            type Value = f64;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a confidence value as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                v.parse::<f64>().map_err(de::Error::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }
        }

        deserializer.deserialize_any(ConfidenceVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(tools: &[&str], count: u32) -> PatternMatch {
        PatternMatch {
            key: tools.join(" -> "),
            tools: tools.iter().map(|t| t.to_string()).collect(),
            count,
        }
    }

    #[test]
    fn test_id_derivation() {
        let instinct = Instinct::from_pattern(&pattern(&["Read", "Edit", "Bash"], 3));
        assert_eq!(instinct.id, "workflow-read-edit-bash");
    }

    #[test]
    fn test_confidence_scaling() {
        let at = |count| Instinct::from_pattern(&pattern(&["A", "B", "C"], count));
        assert_eq!(at(3).confidence_label(), "0.60");
        assert_eq!(at(4).confidence_label(), "0.70");
        assert_eq!(at(6).confidence_label(), "0.90");
        // Capped at 0.90 on synthesis regardless of count
        assert_eq!(at(50).confidence_label(), "0.90");
    }

    #[test]
    fn test_descriptive_fields() {
        let instinct = Instinct::from_pattern(&pattern(&["read_file", "edit_file", "bash"], 3));
        assert_eq!(instinct.trigger, "When starting read_file task");
        assert_eq!(
            instinct.action,
            "Follow sequence: read_file -> edit_file -> bash"
        );
        assert_eq!(instinct.domain, "workflow");
        assert_eq!(instinct.source, "auto-observation");
        assert_eq!(instinct.evidence, vec!["Observed 3 times in session"]);
    }

    #[test]
    fn test_determinism_excluding_timestamp() {
        let a = Instinct::from_pattern(&pattern(&["A", "B", "C"], 5));
        let b = Instinct::from_pattern(&pattern(&["A", "B", "C"], 5));
        assert_eq!(a.id, b.id);
        assert_eq!(a.trigger, b.trigger);
        assert_eq!(a.action, b.action);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.evidence, b.evidence);
    }

    #[test]
    fn test_wire_format() {
        let instinct = Instinct::from_pattern(&pattern(&["A", "B", "C"], 3));
        let json = serde_json::to_string_pretty(&instinct).unwrap();
        assert!(json.contains("\"confidence\": \"0.60\""), "json: {}", json);
        assert!(json.contains("\"createdAt\""), "json: {}", json);

        let back: Instinct = serde_json::from_str(&json).unwrap();
        assert!((back.confidence - 0.60).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_accepts_bare_numbers() {
        let json = r#"{
            "id": "workflow-a-b-c",
            "trigger": "When starting A task",
            "action": "Follow sequence: A -> B -> C",
            "confidence": 0.75,
            "domain": "workflow",
            "source": "auto-observation",
            "evidence": [],
            "createdAt": "2026-08-07T10:00:00Z"
        }"#;
        let instinct: Instinct = serde_json::from_str(json).unwrap();
        assert!((instinct.confidence - 0.75).abs() < 1e-9);
    }
}
