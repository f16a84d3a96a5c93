//! Offline snapshots: configuration and progress saved as one JSON file

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sitetrack_core::{ProgressRecord, ProjectConfig};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// RFC 3339 time the snapshot was taken
    pub taken_at: String,
    pub config: ProjectConfig,
    pub records: Vec<ProgressRecord>,
}

impl Snapshot {
    pub fn new(config: ProjectConfig, records: Vec<ProgressRecord>) -> Self {
        Self {
            taken_at: chrono::Utc::now().to_rfc3339(),
            config,
            records,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        let snapshot: Self = serde_json::from_str(&text)
            .with_context(|| format!("invalid snapshot {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            taken_at = %snapshot.taken_at,
            records = snapshot.records.len(),
            "loaded snapshot"
        );
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to encode snapshot")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write snapshot {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        let snapshot = Snapshot::new(
            ProjectConfig::new("Obra").tower("A", 2).activity("Paint"),
            vec![ProgressRecord::new("A", 1, "Paint", 40).at("2025-01-01").by("ana")],
        );

        snapshot.save(&path).unwrap();
        assert_eq!(Snapshot::load(&path).unwrap(), snapshot);
    }

    #[test]
    fn garbage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snap.json");
        std::fs::write(&path, "{").unwrap();
        assert!(Snapshot::load(&path).is_err());
    }
}
