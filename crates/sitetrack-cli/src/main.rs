//! sitetrack CLI - Construction Progress Tracking
//!
//! Command-line interface for reporting, analyzing and exporting the
//! progress of a multi-tower construction project.

mod commands;
mod project_file;
mod settings;
mod snapshot;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{
    AddArgs, AnalyzeArgs, ConfigureArgs, ExportArgs, MatrixArgs, ResetArgs, Session, SnapshotArgs,
    SummaryArgs,
};
use settings::Settings;

#[derive(Parser)]
#[command(name = "sitetrack")]
#[command(author, version, about = "Construction progress tracking", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Settings file (default: ./sitetrack.toml)
    #[arg(long, global = true, env = "SITETRACK_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend endpoint URL
    #[arg(long, global = true, env = "SITETRACK_ENDPOINT", value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show project-wide progress
    Summary(SummaryArgs),

    /// Show the floors × activities matrix of a tower
    Matrix(MatrixArgs),

    /// Chart real against scheduled progress of one activity
    Analyze(AnalyzeArgs),

    /// Report progress (one entry, or a batch from a JSON file)
    Add(AddArgs),

    /// Replace the project configuration from a project file
    Configure(ConfigureArgs),

    /// Erase the configuration and every progress record
    Reset(ResetArgs),

    /// Export a tower report (html, pdf, svg, xlsx)
    Export(ExportArgs),

    /// Save configuration and progress to a file for offline use
    Snapshot(SnapshotArgs),
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        println!("sitetrack - Construction Progress Tracking");
        println!("Run with --help for usage information");
        return Ok(());
    };

    let (settings, source) = Settings::load(cli.config.as_deref())?;
    if let Some(path) = &source {
        tracing::info!(path = %path.display(), "using settings file");
    }
    let mut session = Session::new(settings, cli.endpoint)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        match command {
            Commands::Summary(args) => session.summary(args).await,
            Commands::Matrix(args) => session.matrix(args).await,
            Commands::Analyze(args) => session.analyze(args).await,
            Commands::Add(args) => session.add(args).await,
            Commands::Configure(args) => session.configure(args).await,
            Commands::Reset(args) => session.reset(args).await,
            Commands::Export(args) => session.export(args).await,
            Commands::Snapshot(args) => session.snapshot(args).await,
        }
    })
}
