//! `sitetrack.toml` settings
//!
//! ```toml
//! endpoint = "https://script.google.com/macros/s/.../exec"
//! timeout_secs = 30
//! reset_passphrase = "borrar todo"
//! default_tower = "A"
//! output_dir = "reports"
//! export_formats = ["html", "pdf", "xlsx"]
//! ```
//!
//! Looked up from `--config` / `SITETRACK_CONFIG`, then `./sitetrack.toml`.
//! Every field is optional.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Settings file looked up in the working directory
pub const SETTINGS_FILE: &str = "sitetrack.toml";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Backend endpoint URL
    pub endpoint: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Passphrase that confirms `reset`; reset is refused without one
    pub reset_passphrase: Option<String>,
    /// Tower used when a command does not name one
    pub default_tower: Option<String>,
    /// Directory for exported reports
    pub output_dir: Option<PathBuf>,
    /// Report formats this installation can produce; empty means all
    pub export_formats: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            reset_passphrase: None,
            default_tower: None,
            output_dir: None,
            export_formats: Vec::new(),
        }
    }
}

impl Settings {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load from `explicit` if given, else `./sitetrack.toml` if present,
    /// else defaults. Returns the file that was read.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let local = PathBuf::from(SETTINGS_FILE);
                if !local.is_file() {
                    tracing::debug!("no settings file, using defaults");
                    return Ok((Self::default(), None));
                }
                local
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        let settings = Self::from_toml(&text)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok((settings, Some(path)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn full_file() {
        let settings = Settings::from_toml(
            r#"
            endpoint = "https://example.com/exec"
            timeout_secs = 5
            reset_passphrase = "borrar"
            default_tower = "B"
            output_dir = "out"
            export_formats = ["svg"]
            "#,
        )
        .unwrap();

        assert_eq!(settings.endpoint.as_deref(), Some("https://example.com/exec"));
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(settings.reset_passphrase.as_deref(), Some("borrar"));
        assert_eq!(settings.default_tower.as_deref(), Some("B"));
        assert_eq!(settings.output_dir, Some(PathBuf::from("out")));
        assert_eq!(settings.export_formats, vec!["svg".to_string()]);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Settings::from_toml("endpont = \"x\"").is_err());
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load(Some(&missing)).is_err());

        let present = dir.path().join("site.toml");
        std::fs::write(&present, "default_tower = \"A\"\n").unwrap();
        let (settings, path) = Settings::load(Some(&present)).unwrap();
        assert_eq!(settings.default_tower.as_deref(), Some("A"));
        assert_eq!(path, Some(present));
    }
}
