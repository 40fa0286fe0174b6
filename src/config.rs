//! Configuration management
//!
//! Resolves the on-disk layout for observations and instincts, and loads
//! tunable limits from an optional config.toml. Components receive their
//! paths explicitly at construction so tests can point everything at a
//! temporary directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunable limits, loaded from config.toml when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Observation log size that triggers rotation into the archive
    #[serde(default = "default_max_log_size_bytes")]
    pub max_log_size_bytes: u64,
    /// Length of the sliding tool-sequence window
    #[serde(default = "default_pattern_window")]
    pub pattern_window: usize,
    /// Minimum occurrences before a window becomes an instinct
    #[serde(default = "default_min_pattern_count")]
    pub min_pattern_count: u32,
    /// Minimum total observations before analysis runs at all
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    /// Maximum stored length for tool input/output payloads
    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,
    /// Maximum stored length for raw input on parse errors
    #[serde(default = "default_max_raw_len")]
    pub max_raw_len: usize,
}

fn default_max_log_size_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_pattern_window() -> usize {
    3
}

fn default_min_pattern_count() -> u32 {
    3
}

fn default_min_observations() -> usize {
    10
}

fn default_max_payload_len() -> usize {
    5000
}

fn default_max_raw_len() -> usize {
    500
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_log_size_bytes: default_max_log_size_bytes(),
            pattern_window: default_pattern_window(),
            min_pattern_count: default_min_pattern_count(),
            min_observations: default_min_observations(),
            max_payload_len: default_max_payload_len(),
            max_raw_len: default_max_raw_len(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(settings)
    }

    /// Save settings as pretty TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Fixed file layout under the instinct data directory.
#[derive(Debug, Clone)]
pub struct Paths {
    root: PathBuf,
}

impl Paths {
    /// Resolve the platform data directory
    pub fn resolve() -> Result<Self> {
        let base = directories::ProjectDirs::from("com", "instinct", "instinct")
            .context("Failed to get project directories")?;
        Ok(Self {
            root: base.data_dir().to_path_buf(),
        })
    }

    /// Use an explicit root directory (tests, alternate homes)
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The append-only observation log
    pub fn observations_file(&self) -> PathBuf {
        self.root.join("observations.jsonl")
    }

    /// Archive directory for rotated observation logs
    pub fn archive_dir(&self) -> PathBuf {
        self.root.join("observations.archive")
    }

    /// Directory holding one JSON file per instinct
    pub fn instincts_dir(&self) -> PathBuf {
        self.root.join("instincts").join("personal")
    }

    /// Reserved target for instincts promoted into full skills
    pub fn learned_skills_dir(&self) -> PathBuf {
        self.root.join("skills").join("learned")
    }

    /// Sentinel file that switches observation capture off
    pub fn disabled_marker(&self) -> PathBuf {
        self.root.join("disabled")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled_marker().exists()
    }

    /// Create or remove the disabled sentinel
    pub fn set_disabled(&self, disabled: bool) -> Result<()> {
        let marker = self.disabled_marker();
        if disabled {
            std::fs::create_dir_all(&self.root)
                .with_context(|| format!("Failed to create {}", self.root.display()))?;
            std::fs::write(&marker, "")
                .with_context(|| format!("Failed to write {}", marker.display()))?;
        } else if marker.exists() {
            std::fs::remove_file(&marker)
                .with_context(|| format!("Failed to remove {}", marker.display()))?;
        }
        Ok(())
    }
}
