//! Drops every warehouse table and creates the schema again.

use anyhow::Result;
use clap::Parser;
use sparkify_etl::config::{AppConfig, CliConfig, FileConfig};
use sparkify_etl::Warehouse;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "sparkify-create-tables")]
#[command(about = "Drop and re-create the songplays warehouse tables")]
struct Args {
    /// Path to a TOML config file. Its values override the CLI arguments.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the SQLite warehouse database file.
    #[arg(long)]
    database: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let file_config = args.config.as_deref().map(FileConfig::load).transpose()?;
    let cli = CliConfig {
        database: args.database,
        ..Default::default()
    };
    let config = AppConfig::resolve(&cli, file_config)?;

    Warehouse::recreate(&config.database)?;
    info!("Warehouse tables created at {:?}", config.database);
    Ok(())
}
