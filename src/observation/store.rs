//! Observation Store - append-only JSONL log with size-bounded rotation
//!
//! Records are never modified or deleted in place; once the log crosses
//! the size threshold the whole file is renamed into the archive directory
//! and a fresh log starts on the next append.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{Paths, Settings};

use super::record::Observation;

/// Append-only store for observation records
pub struct ObservationStore {
    log_file: PathBuf,
    archive_dir: PathBuf,
    max_size_bytes: u64,
}

impl ObservationStore {
    /// Create a store over the standard layout
    pub fn new(paths: &Paths, settings: &Settings) -> Self {
        Self {
            log_file: paths.observations_file(),
            archive_dir: paths.archive_dir(),
            max_size_bytes: settings.max_log_size_bytes,
        }
    }

    /// Create a store over explicit paths
    pub fn with_paths(log_file: PathBuf, archive_dir: PathBuf, max_size_bytes: u64) -> Self {
        Self {
            log_file,
            archive_dir,
            max_size_bytes,
        }
    }

    /// Append one record as a newline-terminated JSON line. The rotation
    /// check runs before every append.
    pub fn append(&self, observation: &Observation) -> Result<()> {
        self.rotate_if_needed()?;

        if let Some(parent) = self.log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let line = serde_json::to_string(observation).context("Failed to serialize observation")?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open {}", self.log_file.display()))?;
        writeln!(file, "{}", line)
            .with_context(|| format!("Failed to append to {}", self.log_file.display()))?;
        Ok(())
    }

    /// Move the log into the archive once it reaches the size threshold.
    /// Rename, not copy, so records are carried over verbatim.
    fn rotate_if_needed(&self) -> Result<()> {
        let size = match std::fs::metadata(&self.log_file) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };
        if size < self.max_size_bytes {
            return Ok(());
        }

        std::fs::create_dir_all(&self.archive_dir)
            .with_context(|| format!("Failed to create {}", self.archive_dir.display()))?;

        let stamp = Utc::now()
            .to_rfc3339_opts(SecondsFormat::Secs, true)
            .replace([':', '.'], "-");
        let target = self.archive_dir.join(format!("observations-{}.jsonl", stamp));
        std::fs::rename(&self.log_file, &target)
            .with_context(|| format!("Failed to archive {}", self.log_file.display()))?;

        info!("Rotated observation log to {}", target.display());
        Ok(())
    }

    /// Load every observation, oldest first. Lines that fail to parse are
    /// dropped individually; one bad line never aborts the read.
    pub fn load_all(&self) -> Result<Vec<Observation>> {
        if !self.log_file.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.log_file)
            .with_context(|| format!("Failed to read {}", self.log_file.display()))?;

        let mut observations = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Observation>(line) {
                Ok(obs) => observations.push(obs),
                Err(e) => debug!("Skipping unparseable observation line: {}", e),
            }
        }
        Ok(observations)
    }

    /// Number of readable observations in the current log
    pub fn count(&self) -> usize {
        self.load_all().map(|o| o.len()).unwrap_or(0)
    }

    /// Number of archived log files
    pub fn archive_count(&self) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.archive_dir) else {
            return 0;
        };
        entries
            .flatten()
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "jsonl"))
            .count()
    }

    pub fn log_file(&self) -> &PathBuf {
        &self.log_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::record::HookEvent;

    fn store_in(dir: &std::path::Path, max_size: u64) -> ObservationStore {
        ObservationStore::with_paths(
            dir.join("observations.jsonl"),
            dir.join("observations.archive"),
            max_size,
        )
    }

    fn start_obs(tool: &str) -> Observation {
        Observation::start(tool.to_string(), "s1".to_string(), None)
    }

    #[test]
    fn test_append_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 10 * 1024 * 1024);

        store.append(&start_obs("read_file")).unwrap();
        store.append(&start_obs("edit_file")).unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].tool, "read_file");
        assert_eq!(all[1].tool, "edit_file");
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 1024);
        assert!(store.load_all().unwrap().is_empty());
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_unparseable_lines_dropped_individually() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 10 * 1024 * 1024);

        store.append(&start_obs("read_file")).unwrap();
        // Corrupt line in the middle
        {
            let mut file = std::fs::OpenOptions::new()
                .append(true)
                .open(store.log_file())
                .unwrap();
            writeln!(file, "{{not valid json").unwrap();
        }
        store.append(&start_obs("execute_command")).unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].tool, "read_file");
        assert_eq!(all[1].tool, "execute_command");
    }

    #[test]
    fn test_rotation_at_threshold() {
        let dir = tempfile::tempdir().unwrap();
        // Tiny threshold so the second append rotates
        let store = store_in(dir.path(), 64);

        store.append(&start_obs("read_file")).unwrap();
        assert!(store.log_file().exists());

        // First record alone exceeds 64 bytes, so this append archives it
        store.append(&start_obs("edit_file")).unwrap();

        let archived: Vec<_> = std::fs::read_dir(dir.path().join("observations.archive"))
            .unwrap()
            .flatten()
            .collect();
        assert_eq!(archived.len(), 1);
        let name = archived[0].file_name().to_string_lossy().to_string();
        assert!(name.starts_with("observations-"), "bad archive name: {}", name);
        assert!(name.ends_with(".jsonl"));
        assert!(!name.contains(':'), "unsafe char in archive name: {}", name);

        // Old content moved verbatim, fresh log holds only the new record
        let archived_content = std::fs::read_to_string(archived[0].path()).unwrap();
        assert!(archived_content.contains("read_file"));
        let fresh = store.load_all().unwrap();
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].tool, "edit_file");
        assert_eq!(store.archive_count(), 1);
    }

    #[test]
    fn test_no_rotation_below_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 10 * 1024 * 1024);

        for _ in 0..5 {
            store.append(&start_obs("read_file")).unwrap();
        }
        assert_eq!(store.archive_count(), 0);
        assert_eq!(store.count(), 5);
    }

    #[test]
    fn test_append_preserves_event_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), 10 * 1024 * 1024);

        store.append(&start_obs("read_file")).unwrap();
        store
            .append(&Observation::complete(
                "read_file".to_string(),
                "s1".to_string(),
                Some("contents".to_string()),
            ))
            .unwrap();
        store
            .append(&Observation::parse_error(
                "expected value".to_string(),
                "garbage".to_string(),
            ))
            .unwrap();

        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].event, HookEvent::ToolStart);
        assert_eq!(all[1].event, HookEvent::ToolComplete);
        assert_eq!(all[2].event, HookEvent::ParseError);
        assert_eq!(all[1].output.as_deref(), Some("contents"));
    }
}
