use anyhow::{Context, Result};
use clap::Parser;
use sparkify_etl::config::{AppConfig, CliConfig, FileConfig};
use sparkify_etl::{Pipeline, PhaseReport, Warehouse};
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sparkify-etl")]
#[command(about = "Load song metadata and activity logs into the songplays warehouse")]
struct CliArgs {
    /// Path to a TOML config file. Its values override the CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite warehouse database file.
    #[clap(long)]
    pub database: Option<PathBuf>,

    /// Root directory of the song metadata files.
    #[clap(long)]
    pub song_data: Option<PathBuf>,

    /// Root directory of the activity log files.
    #[clap(long)]
    pub log_data: Option<PathBuf>,

    /// Drop and re-create all tables before loading.
    #[clap(long, default_value_t = false)]
    pub reset: bool,

    /// Skip files with malformed content instead of stopping.
    #[clap(long, default_value_t = false)]
    pub continue_on_malformed: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            database: self.database.clone(),
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            continue_on_malformed: self.continue_on_malformed,
        }
    }
}

fn log_phase(report: &PhaseReport) {
    info!(
        "{}: {}/{} files loaded",
        report.phase, report.files_loaded, report.files_found
    );
    for path in &report.skipped {
        warn!("  skipped {}", path.display());
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .init();

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening warehouse at {:?}...", config.database);
    let warehouse = if cli_args.reset {
        Warehouse::recreate(&config.database)?
    } else {
        Warehouse::open(&config.database)?
    };

    let mut pipeline = Pipeline::new(warehouse, config.pipeline_options());
    let report = pipeline.run().context("ETL run failed")?;

    info!("");
    info!("Load Summary");
    info!("============");
    log_phase(&report.songs);
    log_phase(&report.logs);
    let activity = &report.logs.activity;
    info!(
        "{} events, {} plays ({} matched a known song), {} users",
        activity.events, activity.plays, activity.resolved, activity.users
    );

    info!("");
    info!("Warehouse contains:");
    info!("  {} users", report.counts.users);
    info!("  {} artists", report.counts.artists);
    info!("  {} songs", report.counts.songs);
    info!("  {} time rows", report.counts.time);
    info!("  {} songplays", report.counts.songplays);

    Ok(())
}
