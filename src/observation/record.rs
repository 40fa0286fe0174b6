//! Observation records - one normalized entry per tool invocation event

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle stage a hook event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    ToolStart,
    ToolComplete,
    ParseError,
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::ToolStart => write!(f, "tool_start"),
            HookEvent::ToolComplete => write!(f, "tool_complete"),
            HookEvent::ParseError => write!(f, "parse_error"),
        }
    }
}

/// A single observation, serialized as one JSONL line in the store.
/// Immutable once written; append order equals chronological order within
/// a single log file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub event: HookEvent,
    #[serde(default = "unknown")]
    pub tool: String,
    #[serde(default = "unknown")]
    pub session: String,
    /// Truncated serialized tool input (tool_start only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Truncated serialized tool output (tool_complete only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Parse failure message (parse_error only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Truncated raw input that failed to parse (parse_error only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

fn unknown() -> String {
    "unknown".to_string()
}

impl Observation {
    /// A tool invocation beginning
    pub fn start(tool: String, session: String, input: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event: HookEvent::ToolStart,
            tool,
            session,
            input,
            output: None,
            error: None,
            raw: None,
        }
    }

    /// A tool invocation finishing
    pub fn complete(tool: String, session: String, output: Option<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            event: HookEvent::ToolComplete,
            tool,
            session,
            input: None,
            output,
            error: None,
            raw: None,
        }
    }

    /// A payload that could not be parsed as JSON
    pub fn parse_error(error: String, raw: String) -> Self {
        Self {
            timestamp: Utc::now(),
            event: HookEvent::ParseError,
            tool: unknown(),
            session: unknown(),
            input: None,
            output: None,
            error: Some(error),
            raw: Some(raw),
        }
    }
}
