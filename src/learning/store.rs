//! Instinct Store - one JSON file per instinct id, merge-on-write
//!
//! Saving an instinct whose id already exists merges evidence instead of
//! overwriting: stored confidence is boosted by a fixed increment (the
//! candidate's own confidence is ignored) and evidence lists are
//! concatenated. Writes go through a temp file and an atomic rename.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

use super::instinct::Instinct;

/// Confidence boost applied when an instinct is re-confirmed by a merge
const MERGE_INCREMENT: f64 = 0.05;
/// Upper bound confidence can ever reach across merges
const MERGE_CAP: f64 = 0.95;

/// Persistent store for instinct records
pub struct InstinctStore {
    base_dir: PathBuf,
}

impl InstinctStore {
    /// Create a store under the given directory, creating it as needed
    pub fn with_dir(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)
            .with_context(|| format!("Failed to create {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", id))
    }

    /// Save a candidate instinct, merging with any prior record of the
    /// same id. Returns the record as persisted.
    pub fn save(&self, candidate: &Instinct) -> Result<Instinct> {
        let record = match self.load(&candidate.id)? {
            Some(prior) => merge(&prior, candidate),
            None => candidate.clone(),
        };
        self.write_atomic(&record)?;
        info!(
            "Saved instinct {} (confidence: {})",
            record.id,
            record.confidence_label()
        );
        Ok(record)
    }

    /// Load one instinct by id
    pub fn load(&self, id: &str) -> Result<Option<Instinct>> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let instinct = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(instinct))
    }

    /// Load every instinct, strongest first. Unreadable files are skipped
    /// with a warning.
    pub fn list(&self) -> Result<Vec<Instinct>> {
        let mut instincts = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read {}", self.base_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match serde_json::from_str::<Instinct>(&contents) {
                Ok(instinct) => instincts.push(instinct),
                Err(e) => warn!("Skipping unreadable instinct {}: {}", path.display(), e),
            }
        }
        instincts.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(instincts)
    }

    pub fn count(&self) -> usize {
        self.list().map(|i| i.len()).unwrap_or(0)
    }

    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Replace the instinct file in full via temp file + rename, so a
    /// concurrent reader never sees a half-written record.
    fn write_atomic(&self, instinct: &Instinct) -> Result<()> {
        let path = self.path_for(&instinct.id);
        let json =
            serde_json::to_string_pretty(instinct).context("Failed to serialize instinct")?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

/// Merge rule: boosted confidence and concatenated evidence carry history;
/// everything else comes from the candidate.
fn merge(prior: &Instinct, candidate: &Instinct) -> Instinct {
    let mut merged = candidate.clone();
    merged.confidence = (prior.confidence + MERGE_INCREMENT).min(MERGE_CAP);
    merged.evidence = prior
        .evidence
        .iter()
        .chain(candidate.evidence.iter())
        .cloned()
        .collect();
    merged
}
