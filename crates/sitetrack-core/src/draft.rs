//! Editable drafts for project configuration and progress batches
//!
//! Drafts hold user input until it is complete enough to send to the gateway.
//! Every mutation validates immediately so callers can show the error next to
//! the offending field.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ProgressEntry, ProjectConfig};

/// Rejected draft input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Tower name cannot be empty")]
    EmptyTowerName,

    #[error("Tower already exists: {0}")]
    DuplicateTower(String),

    #[error("Unknown tower: {0}")]
    UnknownTower(String),

    #[error("Activity name cannot be empty")]
    EmptyActivityName,

    #[error("Activity already exists: {0}")]
    DuplicateActivity(String),

    #[error("Unknown activity: {0}")]
    UnknownActivity(String),

    #[error("Tower {tower} needs at least one floor (got {floors})")]
    InvalidFloorCount { tower: String, floors: u32 },

    #[error("Floor {floor} is outside tower {tower} (1-{floors})")]
    FloorOutOfRange { tower: String, floor: u32, floors: u32 },

    #[error("Progress must be between 0 and 100 (got {0})")]
    PercentOutOfRange(u8),

    #[error("User name cannot be empty")]
    EmptyUser,

    #[error("A project needs a name, at least one tower and at least one activity")]
    IncompleteConfig,

    #[error("There are no entries to save")]
    EmptyBatch,

    #[error("No entry at position {0}")]
    NoSuchEntry(usize),
}

// ============================================================================
// Config Draft
// ============================================================================

/// Editor state for a project configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDraft {
    config: ProjectConfig,
}

impl ConfigDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing from an existing configuration
    pub fn from_config(config: ProjectConfig) -> Self {
        Self { config }
    }

    pub fn set_name(&mut self, name: &str) {
        self.config.name = name.trim().to_string();
    }

    /// Add a tower with a single floor
    pub fn add_tower(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyTowerName);
        }
        if self.config.has_tower(name) {
            return Err(ValidationError::DuplicateTower(name.to_string()));
        }
        self.config.towers.push(name.to_string());
        self.config.floors.insert(name.to_string(), 1);
        Ok(())
    }

    /// Remove a tower together with its floors and planned tables
    pub fn remove_tower(&mut self, name: &str) {
        self.config.towers.retain(|t| t != name);
        self.config.floors.remove(name);
        self.config.scheduled_progress.remove(name);
        self.config.scheduled_timeline.remove(name);
    }

    pub fn set_floors(&mut self, tower: &str, floors: u32) -> Result<(), ValidationError> {
        if !self.config.has_tower(tower) {
            return Err(ValidationError::UnknownTower(tower.to_string()));
        }
        if floors == 0 {
            return Err(ValidationError::InvalidFloorCount {
                tower: tower.to_string(),
                floors,
            });
        }
        self.config.floors.insert(tower.to_string(), floors);
        Ok(())
    }

    pub fn add_activity(&mut self, name: &str) -> Result<(), ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyActivityName);
        }
        if self.config.has_activity(name) {
            return Err(ValidationError::DuplicateActivity(name.to_string()));
        }
        self.config.activities.push(name.to_string());
        Ok(())
    }

    pub fn remove_activity(&mut self, name: &str) {
        self.config.activities.retain(|a| a != name);
    }

    /// Current state, complete or not
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Validate and hand over the configuration
    pub fn finish(self) -> Result<ProjectConfig, ValidationError> {
        validate_config(&self.config)?;
        Ok(self.config)
    }
}

/// Check that a configuration is complete and internally consistent
pub fn validate_config(config: &ProjectConfig) -> Result<(), ValidationError> {
    if !config.is_configured() || config.towers.is_empty() || config.activities.is_empty() {
        return Err(ValidationError::IncompleteConfig);
    }

    for (i, tower) in config.towers.iter().enumerate() {
        if tower.trim().is_empty() {
            return Err(ValidationError::EmptyTowerName);
        }
        if config.towers[..i].contains(tower) {
            return Err(ValidationError::DuplicateTower(tower.clone()));
        }
        if config.floors.get(tower) == Some(&0) {
            return Err(ValidationError::InvalidFloorCount {
                tower: tower.clone(),
                floors: 0,
            });
        }
    }

    for (i, activity) in config.activities.iter().enumerate() {
        if activity.trim().is_empty() {
            return Err(ValidationError::EmptyActivityName);
        }
        if config.activities[..i].contains(activity) {
            return Err(ValidationError::DuplicateActivity(activity.clone()));
        }
    }

    Ok(())
}

// ============================================================================
// Progress Batch
// ============================================================================

/// Progress entries collected before a single save
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressBatch {
    entries: Vec<ProgressEntry>,
}

impl ProgressBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate an entry against the configuration and queue it
    pub fn push(&mut self, entry: ProgressEntry, config: &ProjectConfig) -> Result<(), ValidationError> {
        let entry = validate_entry(entry, config)?;
        self.entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<ProgressEntry, ValidationError> {
        if index >= self.entries.len() {
            return Err(ValidationError::NoSuchEntry(index));
        }
        Ok(self.entries.remove(index))
    }

    pub fn entries(&self) -> &[ProgressEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand over the entries for saving. Empty batches are refused.
    pub fn into_entries(self) -> Result<Vec<ProgressEntry>, ValidationError> {
        if self.entries.is_empty() {
            return Err(ValidationError::EmptyBatch);
        }
        Ok(self.entries)
    }
}

/// Normalize and check a single entry
pub fn validate_entry(
    mut entry: ProgressEntry,
    config: &ProjectConfig,
) -> Result<ProgressEntry, ValidationError> {
    entry.user = entry.user.trim().to_string();
    if entry.user.is_empty() {
        return Err(ValidationError::EmptyUser);
    }
    if !config.has_tower(&entry.tower) {
        return Err(ValidationError::UnknownTower(entry.tower));
    }
    if !config.has_activity(&entry.activity) {
        return Err(ValidationError::UnknownActivity(entry.activity));
    }

    let floors = config.floor_count(&entry.tower);
    if entry.floor == 0 || entry.floor > floors {
        return Err(ValidationError::FloorOutOfRange {
            tower: entry.tower,
            floor: entry.floor,
            floors,
        });
    }
    if entry.percent > 100 {
        return Err(ValidationError::PercentOutOfRange(entry.percent));
    }

    entry.note = entry
        .note
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    Ok(entry)
}
