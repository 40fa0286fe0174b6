//! Observation Capture - normalizes one hook event into the store
//!
//! The host invokes this once per tool call with the payload on stdin.
//! Capture is a side channel: it must never alter, block, or fail the
//! host's tool-execution flow. Payloads that fail to parse are recorded
//! as parse_error observations instead of being dropped silently.

use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use crate::config::Settings;

use super::record::Observation;
use super::store::ObservationStore;

/// Environment variable consulted when the payload carries no session id
pub const SESSION_ENV_VAR: &str = "INSTINCT_SESSION_ID";

/// Builds observation records from raw hook invocations
pub struct Capture {
    store: ObservationStore,
    max_payload_len: usize,
    max_raw_len: usize,
}

impl Capture {
    pub fn new(store: ObservationStore, settings: &Settings) -> Self {
        Self {
            store,
            max_payload_len: settings.max_payload_len,
            max_raw_len: settings.max_raw_len,
        }
    }

    /// Record one hook invocation. Returns the appended observation, or
    /// None for blank input (nothing to observe).
    pub fn observe(&self, hook_kind: Option<&str>, raw_input: &str) -> Result<Option<Observation>> {
        if raw_input.trim().is_empty() {
            return Ok(None);
        }

        let observation = match serde_json::from_str::<Value>(raw_input) {
            Ok(payload) => self.normalize(hook_kind, &payload),
            Err(e) => {
                debug!("Hook payload failed to parse: {}", e);
                Observation::parse_error(e.to_string(), truncate(raw_input, self.max_raw_len))
            }
        };

        self.store.append(&observation)?;
        Ok(Some(observation))
    }

    /// Build the observation for a parseable payload. Field lookups are
    /// lenient: a non-object payload simply yields the fallbacks.
    fn normalize(&self, hook_kind: Option<&str>, payload: &Value) -> Observation {
        let kind = hook_kind
            .map(str::to_string)
            .or_else(|| string_field(payload, "hook_type"))
            .unwrap_or_else(|| "unknown".to_string());
        // Anything with "pre" in the hook kind marks the start of a tool call
        let is_start = kind.to_lowercase().contains("pre");

        let tool = string_field(payload, "tool_name")
            .or_else(|| string_field(payload, "tool"))
            .unwrap_or_else(|| "unknown".to_string());
        let session = string_field(payload, "session_id")
            .or_else(|| std::env::var(SESSION_ENV_VAR).ok())
            .unwrap_or_else(|| "unknown".to_string());

        if is_start {
            let input = payload
                .get("tool_input")
                .map(|v| self.truncate_payload(v));
            Observation::start(tool, session, input)
        } else {
            let output = payload
                .get("tool_output")
                .map(|v| self.truncate_payload(v));
            Observation::complete(tool, session, output)
        }
    }

    /// Serialize a payload value compactly and bound its length
    fn truncate_payload(&self, value: &Value) -> String {
        let serialized = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        truncate(&serialized, self.max_payload_len)
    }
}

fn string_field(payload: &Value, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Truncate to at most max_len characters, respecting char boundaries
fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
