//! Subcommand implementations

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use sitetrack_aggregate::Aggregator;
use sitetrack_core::{ActivityId, ProgressBatch, ProgressEntry, ProgressRecord, ProjectConfig, Renderer};
use sitetrack_gateway::{Gateway, ResetGate};
use sitetrack_render::{ChartSvgRenderer, ExportFormat, ExportToolkit, MatrixSvgRenderer, TextRenderer};

use crate::project_file::ProjectFile;
use crate::settings::Settings;
use crate::snapshot::Snapshot;

// ============================================================================
// Arguments
// ============================================================================

/// Output of a view
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ViewFormat {
    Text,
    Svg,
    Json,
}

/// Output of the summary
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormat {
    Text,
    Json,
}

/// Where read commands get their data
#[derive(Args, Debug)]
pub struct Source {
    /// Read from a snapshot file instead of the backend
    #[arg(long, value_name = "FILE")]
    snapshot: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    source: Source,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: SummaryFormat,
}

#[derive(Args, Debug)]
pub struct MatrixArgs {
    #[command(flatten)]
    source: Source,

    /// Tower to show (default: `default_tower` setting, then the first tower)
    #[arg(short, long)]
    tower: Option<String>,

    /// Restrict to these activities (repeatable; default: all)
    #[arg(short, long = "activity", value_name = "ACTIVITY")]
    activities: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ViewFormat,

    /// Show the planned percentage next to the real one
    #[arg(long)]
    planned: bool,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    source: Source,

    /// Tower to analyze (default: `default_tower` setting, then the first tower)
    #[arg(short, long)]
    tower: Option<String>,

    /// Activity to analyze
    #[arg(short, long)]
    activity: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ViewFormat,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Who is reporting
    #[arg(long, required_unless_present = "batch")]
    user: Option<String>,

    #[arg(long, required_unless_present = "batch")]
    tower: Option<String>,

    #[arg(long, required_unless_present = "batch")]
    floor: Option<u32>,

    #[arg(long, required_unless_present = "batch")]
    activity: Option<String>,

    /// Completion, 0-100
    #[arg(long, required_unless_present = "batch")]
    percent: Option<u8>,

    #[arg(long)]
    note: Option<String>,

    /// JSON array of entries to save in a single request
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with_all = ["user", "tower", "floor", "activity", "percent", "note"]
    )]
    batch: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Project file (TOML, or JSON with a .json extension)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Validate and print the configuration without saving it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ResetArgs {
    /// Must match `reset_passphrase` in the settings file
    #[arg(long)]
    passphrase: String,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    source: Source,

    /// Tower to export (default: `default_tower` setting, then the first tower)
    #[arg(short, long)]
    tower: Option<String>,

    /// Restrict to these activities (repeatable; default: all)
    #[arg(short, long = "activity", value_name = "ACTIVITY")]
    activities: Vec<String>,

    /// Report format (html, pdf, svg, xlsx)
    #[arg(short, long, default_value = "html")]
    format: String,

    /// Output directory (default: `output_dir` setting, then the current directory)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Snapshot file to write
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

// ============================================================================
// Session
// ============================================================================

/// State shared by every command of one invocation
pub struct Session {
    settings: Settings,
    endpoint: Option<String>,
    toolkit: ExportToolkit,
    aggregator: Aggregator,
}

/// Export capability from the `export_formats` setting
pub fn build_toolkit(settings: &Settings) -> Result<ExportToolkit> {
    if settings.export_formats.is_empty() {
        return Ok(ExportToolkit::new());
    }
    let formats = settings
        .export_formats
        .iter()
        .map(|f| f.parse::<ExportFormat>())
        .collect::<Result<Vec<_>, _>>()
        .context("invalid `export_formats` setting")?;
    Ok(ExportToolkit::with_formats(formats))
}

impl Session {
    pub fn new(settings: Settings, endpoint: Option<String>) -> Result<Self> {
        let toolkit = build_toolkit(&settings)?;
        tracing::debug!(formats = ?toolkit.formats(), "export toolkit ready");
        Ok(Self {
            settings,
            endpoint,
            toolkit,
            aggregator: Aggregator::new(),
        })
    }

    fn gateway(&self) -> Result<Gateway> {
        let Some(endpoint) = self.endpoint.as_deref().or(self.settings.endpoint.as_deref()) else {
            bail!("no backend endpoint configured (use --endpoint, SITETRACK_ENDPOINT or `endpoint` in sitetrack.toml)");
        };
        Ok(Gateway::connect(endpoint, self.settings.timeout())?)
    }

    async fn load(&self, source: &Source) -> Result<(ProjectConfig, Vec<ProgressRecord>)> {
        if let Some(path) = &source.snapshot {
            let snapshot = Snapshot::load(path)?;
            return Ok((snapshot.config, snapshot.records));
        }

        let gateway = self.gateway()?;
        let (config, records) = tokio::try_join!(gateway.fetch_config(), gateway.fetch_progress())
            .context("failed to load project data")?;
        tracing::info!(project = %config.name, records = records.len(), "loaded project data");
        Ok((config, records))
    }

    fn pick_tower(&self, requested: Option<&str>, config: &ProjectConfig) -> Result<String> {
        let tower = requested
            .or(self.settings.default_tower.as_deref())
            .or(config.towers.first().map(String::as_str));
        match tower {
            Some(tower) if config.has_tower(tower) => Ok(tower.to_string()),
            Some(tower) => bail!(
                "unknown tower '{tower}' (towers: {})",
                config.towers.join(", ")
            ),
            None => bail!("the project has no towers"),
        }
    }

    // ------------------------------------------------------------------------
    // Read commands
    // ------------------------------------------------------------------------

    pub async fn summary(&mut self, args: SummaryArgs) -> Result<()> {
        let (config, records) = self.load(&args.source).await?;
        let summary = self.aggregator.summary(&records, &config);

        let out = match args.format {
            SummaryFormat::Text => TextRenderer::new().render(&config, &*summary)?,
            SummaryFormat::Json => serde_json::to_string_pretty(&*summary)?,
        };
        emit(None, out.as_bytes())
    }

    pub async fn matrix(&mut self, args: MatrixArgs) -> Result<()> {
        let (config, records) = self.load(&args.source).await?;
        ensure_configured(&config)?;
        let tower = self.pick_tower(args.tower.as_deref(), &config)?;
        let activities = select_activities(&config, &args.activities)?;
        let matrix = self.aggregator.matrix(&records, &config, &tower, &activities);

        let out = match args.format {
            ViewFormat::Text => {
                let mut renderer = TextRenderer::new();
                if args.planned {
                    renderer = renderer.with_planned();
                }
                renderer.render(&config, &*matrix)?
            }
            ViewFormat::Svg => {
                let mut renderer = MatrixSvgRenderer::new();
                if args.planned {
                    renderer = renderer.with_planned();
                }
                renderer.render(&config, &*matrix)?
            }
            ViewFormat::Json => serde_json::to_string_pretty(&*matrix)?,
        };
        emit(args.output.as_deref(), out.as_bytes())
    }

    pub async fn analyze(&mut self, args: AnalyzeArgs) -> Result<()> {
        let (config, records) = self.load(&args.source).await?;
        ensure_configured(&config)?;
        let tower = self.pick_tower(args.tower.as_deref(), &config)?;
        if !config.has_activity(&args.activity) {
            bail!(
                "unknown activity '{}' (activities: {})",
                args.activity,
                config.activities.join(", ")
            );
        }

        let now = chrono::Utc::now().naive_utc();
        let series = self.aggregator.series(&records, &config, &tower, &args.activity, now);

        let out = match args.format {
            ViewFormat::Text => TextRenderer::new().render(&config, &*series)?,
            ViewFormat::Svg => ChartSvgRenderer::new().render(&config, &*series)?,
            ViewFormat::Json => serde_json::to_string_pretty(&*series)?,
        };
        emit(args.output.as_deref(), out.as_bytes())
    }

    pub async fn export(&mut self, args: ExportArgs) -> Result<()> {
        let format: ExportFormat = args.format.parse()?;
        // Refuse before touching the backend
        if !self.toolkit.supports(format) {
            let available: Vec<&str> = self.toolkit.formats().iter().map(ExportFormat::extension).collect();
            bail!(
                "export format '{format}' is not available (available: {})",
                available.join(", ")
            );
        }

        let (config, records) = self.load(&args.source).await?;
        ensure_configured(&config)?;
        let tower = self.pick_tower(args.tower.as_deref(), &config)?;
        let activities = select_activities(&config, &args.activities)?;
        let matrix = self.aggregator.matrix(&records, &config, &tower, &activities);

        let today = chrono::Local::now().date_naive();
        let report = self.toolkit.export(&config, &matrix, format, today)?;

        let dir = args
            .output
            .or_else(|| self.settings.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let path = report
            .write_to(&dir)
            .with_context(|| format!("failed to write report to {}", dir.display()))?;
        println!("Exported {}", path.display());
        Ok(())
    }

    pub async fn snapshot(&mut self, args: SnapshotArgs) -> Result<()> {
        let (config, records) = self.load(&Source { snapshot: None }).await?;
        let snapshot = Snapshot::new(config, records);
        snapshot.save(&args.output)?;
        println!(
            "Snapshot written to {} ({} records)",
            args.output.display(),
            snapshot.records.len()
        );
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Write commands
    // ------------------------------------------------------------------------

    pub async fn add(&mut self, args: AddArgs) -> Result<()> {
        let entries = match &args.batch {
            Some(path) => read_batch(path)?,
            None => vec![single_entry(&args)?],
        };

        let gateway = self.gateway()?;
        let config = gateway
            .fetch_config()
            .await
            .context("failed to load project configuration")?;
        ensure_configured(&config)?;

        let mut batch = ProgressBatch::new();
        for (i, entry) in entries.into_iter().enumerate() {
            batch
                .push(entry, &config)
                .with_context(|| format!("entry {} is invalid", i + 1))?;
        }

        let count = batch.len();
        let receipt = gateway
            .save_progress(&batch.into_entries()?)
            .await
            .context("failed to save progress")?;
        tracing::info!(sent = count, saved = receipt.saved, "progress saved");
        println!("Saved {} record(s)", receipt.saved);
        Ok(())
    }

    pub async fn configure(&mut self, args: ConfigureArgs) -> Result<()> {
        let config = ProjectFile::read(&args.file)?
            .into_config()
            .with_context(|| format!("invalid project in {}", args.file.display()))?;

        println!(
            "Project '{}': {} tower(s), {} floor(s), {} activit{}",
            config.name,
            config.towers.len(),
            config.total_floors(),
            config.activities.len(),
            if config.activities.len() == 1 { "y" } else { "ies" }
        );

        if args.dry_run {
            println!("Dry run: configuration not saved");
            return Ok(());
        }

        self.gateway()?
            .save_config(&config)
            .await
            .context("failed to save configuration")?;
        println!("Configuration saved");
        Ok(())
    }

    pub async fn reset(&mut self, args: ResetArgs) -> Result<()> {
        let gate = ResetGate::new(self.settings.reset_passphrase.clone());
        let token = gate.confirm(&args.passphrase)?;

        self.gateway()?
            .reset_project(token)
            .await
            .context("failed to reset project")?;
        println!("Project reset: configuration and progress cleared");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn ensure_configured(config: &ProjectConfig) -> Result<()> {
    if !config.is_configured() {
        bail!("no project has been configured yet (run `sitetrack configure FILE`)");
    }
    Ok(())
}

/// Requested activities in project order; all when none are requested
fn select_activities(config: &ProjectConfig, requested: &[String]) -> Result<Vec<ActivityId>> {
    if requested.is_empty() {
        return Ok(config.activities.clone());
    }
    if let Some(unknown) = requested.iter().find(|a| !config.has_activity(a)) {
        bail!(
            "unknown activity '{unknown}' (activities: {})",
            config.activities.join(", ")
        );
    }
    Ok(config
        .activities
        .iter()
        .filter(|a| requested.contains(a))
        .cloned()
        .collect())
}

fn single_entry(args: &AddArgs) -> Result<ProgressEntry> {
    let (Some(user), Some(tower), Some(floor), Some(activity), Some(percent)) = (
        args.user.as_deref(),
        args.tower.as_deref(),
        args.floor,
        args.activity.as_deref(),
        args.percent,
    ) else {
        bail!("--user, --tower, --floor, --activity and --percent are required without --batch");
    };

    let mut entry = ProgressEntry::new(user, tower, floor, activity, percent);
    if let Some(note) = &args.note {
        entry = entry.note(note.as_str());
    }
    Ok(entry)
}

fn read_batch(path: &Path) -> Result<Vec<ProgressEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid batch {}", path.display()))
}

/// Write to `output`, or stdout
fn emit(output: Option<&Path>, content: &[u8]) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(content)?;
    if !content.ends_with(b"\n") {
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> ProjectConfig {
        ProjectConfig::new("Obra")
            .tower("A", 2)
            .tower("B", 1)
            .activity("Masonry")
            .activity("Paint")
            .activity("Tiles")
    }

    #[test]
    fn activities_keep_project_order() {
        let picked = select_activities(&config(), &["Tiles".into(), "Masonry".into()]).unwrap();
        assert_eq!(picked, vec!["Masonry".to_string(), "Tiles".to_string()]);
        assert_eq!(select_activities(&config(), &[]).unwrap().len(), 3);
        assert!(select_activities(&config(), &["Roof".into()]).is_err());
    }

    #[test]
    fn tower_fallbacks() {
        let session = Session::new(Settings::default(), None).unwrap();
        assert_eq!(session.pick_tower(None, &config()).unwrap(), "A");
        assert_eq!(session.pick_tower(Some("B"), &config()).unwrap(), "B");
        assert!(session.pick_tower(Some("Z"), &config()).is_err());

        let settings = Settings {
            default_tower: Some("B".into()),
            ..Settings::default()
        };
        let session = Session::new(settings, None).unwrap();
        assert_eq!(session.pick_tower(None, &config()).unwrap(), "B");
    }

    #[test]
    fn toolkit_follows_settings() {
        let all = build_toolkit(&Settings::default()).unwrap();
        assert_eq!(all.formats(), &ExportFormat::ALL);

        let settings = Settings {
            export_formats: vec!["svg".into(), "html".into()],
            ..Settings::default()
        };
        let some = build_toolkit(&settings).unwrap();
        assert!(some.supports(ExportFormat::Svg));
        assert!(!some.supports(ExportFormat::Xlsx));

        let settings = Settings {
            export_formats: vec!["docx".into()],
            ..Settings::default()
        };
        assert!(build_toolkit(&settings).is_err());
    }

    #[test]
    fn missing_endpoint_is_reported() {
        let session = Session::new(Settings::default(), None).unwrap();
        let err = session.gateway().err().unwrap();
        assert!(err.to_string().contains("no backend endpoint"));
    }

    #[test]
    fn single_entry_from_flags() {
        let args = AddArgs {
            user: Some("ana".into()),
            tower: Some("A".into()),
            floor: Some(2),
            activity: Some("Paint".into()),
            percent: Some(40),
            note: Some("north wall".into()),
            batch: None,
        };
        let entry = single_entry(&args).unwrap();
        assert_eq!(entry, ProgressEntry::new("ana", "A", 2, "Paint", 40).note("north wall"));
    }
}
