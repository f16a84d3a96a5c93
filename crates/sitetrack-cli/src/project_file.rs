//! Project definition files for `sitetrack configure`
//!
//! TOML (or JSON with a `.json` extension):
//!
//! ```toml
//! name = "Residencial Norte"
//! activities = ["Masonry", "Paint"]
//!
//! [[towers]]
//! name = "A"
//! floors = 12
//!
//! [[plan]]
//! tower = "A"
//! activity = "Paint"
//! floor = 3        # omit to plan every floor of the tower
//! percent = 100
//!
//! [[checkpoints]]
//! tower = "A"
//! activity = "Paint"
//! date = "2025-06-30"
//! progress = 50
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use sitetrack_core::{parse_timestamp, ConfigDraft, ProjectConfig, ValidationError};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    pub name: String,
    pub towers: Vec<TowerDef>,
    pub activities: Vec<String>,
    #[serde(default)]
    pub plan: Vec<PlanDef>,
    #[serde(default)]
    pub checkpoints: Vec<CheckpointDef>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TowerDef {
    pub name: String,
    #[serde(default = "one_floor")]
    pub floors: u32,
}

fn one_floor() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanDef {
    pub tower: String,
    pub activity: String,
    pub floor: Option<u32>,
    pub percent: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointDef {
    pub tower: String,
    pub activity: String,
    pub date: String,
    pub progress: u8,
}

impl ProjectFile {
    pub fn parse_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            serde_json::from_str(&text).with_context(|| format!("invalid project file {}", path.display()))
        } else {
            Self::parse_toml(&text).with_context(|| format!("invalid project file {}", path.display()))
        }
    }

    /// Build and validate the configuration
    pub fn into_config(self) -> Result<ProjectConfig, ValidationError> {
        let mut draft = ConfigDraft::new();
        draft.set_name(&self.name);
        for tower in &self.towers {
            draft.add_tower(&tower.name)?;
            draft.set_floors(tower.name.trim(), tower.floors)?;
        }
        for activity in &self.activities {
            draft.add_activity(activity)?;
        }
        let mut config = draft.finish()?;

        for plan in self.plan {
            check_pair(&config, &plan.tower, &plan.activity)?;
            check_percent(plan.percent)?;
            let floors = config.floor_count(&plan.tower);
            let targets = match plan.floor {
                Some(floor) if floor == 0 || floor > floors => {
                    return Err(ValidationError::FloorOutOfRange {
                        tower: plan.tower,
                        floor,
                        floors,
                    });
                }
                Some(floor) => vec![floor],
                None => (1..=floors).collect(),
            };
            for floor in targets {
                config = config.plan(&plan.tower, &plan.activity, floor, plan.percent);
            }
        }

        for checkpoint in self.checkpoints {
            check_pair(&config, &checkpoint.tower, &checkpoint.activity)?;
            check_percent(checkpoint.progress)?;
            if parse_timestamp(&checkpoint.date).is_none() {
                tracing::warn!(
                    tower = %checkpoint.tower,
                    activity = %checkpoint.activity,
                    date = %checkpoint.date,
                    "checkpoint date is not recognized and will not be charted"
                );
            }
            config = config.checkpoint(
                &checkpoint.tower,
                &checkpoint.activity,
                &checkpoint.date,
                checkpoint.progress,
            );
        }

        Ok(config)
    }
}

fn check_pair(config: &ProjectConfig, tower: &str, activity: &str) -> Result<(), ValidationError> {
    if !config.has_tower(tower) {
        return Err(ValidationError::UnknownTower(tower.to_string()));
    }
    if !config.has_activity(activity) {
        return Err(ValidationError::UnknownActivity(activity.to_string()));
    }
    Ok(())
}

fn check_percent(percent: u8) -> Result<(), ValidationError> {
    if percent > 100 {
        return Err(ValidationError::PercentOutOfRange(percent));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"
        name = "Residencial Norte"
        activities = ["Masonry", "Paint"]

        [[towers]]
        name = "A"
        floors = 3

        [[towers]]
        name = "B"

        [[plan]]
        tower = "A"
        activity = "Paint"
        percent = 40

        [[plan]]
        tower = "A"
        activity = "Paint"
        floor = 3
        percent = 100

        [[checkpoints]]
        tower = "A"
        activity = "Paint"
        date = "2025-06-30"
        progress = 50
    "#;

    #[test]
    fn sample_builds() {
        let config = ProjectFile::parse_toml(SAMPLE).unwrap().into_config().unwrap();

        assert_eq!(config.name, "Residencial Norte");
        assert_eq!(config.towers, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(config.floor_count("B"), 1);
        assert_eq!(config.planned("A", "Paint", 1), Some(40));
        assert_eq!(config.planned("A", "Paint", 3), Some(100));
        assert_eq!(config.planned("A", "Masonry", 1), None);
        assert_eq!(config.timeline("A", "Paint").len(), 1);
    }

    #[test]
    fn plan_floor_outside_tower() {
        let text = SAMPLE.replace("floor = 3", "floor = 9");
        let err = ProjectFile::parse_toml(&text).unwrap().into_config().unwrap_err();
        assert_eq!(
            err,
            ValidationError::FloorOutOfRange {
                tower: "A".into(),
                floor: 9,
                floors: 3
            }
        );
    }

    #[test]
    fn unknown_activity_in_checkpoint() {
        let text = SAMPLE.replace("activity = \"Paint\"\n        date", "activity = \"Roof\"\n        date");
        let err = ProjectFile::parse_toml(&text).unwrap().into_config().unwrap_err();
        assert_eq!(err, ValidationError::UnknownActivity("Roof".into()));
    }

    #[test]
    fn duplicate_tower() {
        let text = SAMPLE.replace("name = \"B\"", "name = \"A\"");
        let err = ProjectFile::parse_toml(&text).unwrap().into_config().unwrap_err();
        assert_eq!(err, ValidationError::DuplicateTower("A".into()));
    }

    #[test]
    fn json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        std::fs::write(
            &path,
            r#"{"name": "Obra", "towers": [{"name": "T1", "floors": 2}], "activities": ["Paint"]}"#,
        )
        .unwrap();

        let config = ProjectFile::read(&path).unwrap().into_config().unwrap();
        assert_eq!(config.floor_count("T1"), 2);
    }
}
