mod file_config;

pub use file_config::FileConfig;

use crate::pipeline::PipelineOptions;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_DATABASE: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA: &str = "data/song_data";
pub const DEFAULT_LOG_DATA: &str = "data/log_data";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub database: Option<PathBuf>,
    pub song_data: Option<PathBuf>,
    pub log_data: Option<PathBuf>,
    pub continue_on_malformed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database: PathBuf,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub continue_on_malformed: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let database = file
            .database
            .map(PathBuf::from)
            .or_else(|| cli.database.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE));
        if database.is_dir() {
            bail!("database path is a directory: {:?}", database);
        }

        let song_data = file
            .song_data
            .map(PathBuf::from)
            .or_else(|| cli.song_data.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SONG_DATA));
        let log_data = file
            .log_data
            .map(PathBuf::from)
            .or_else(|| cli.log_data.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DATA));

        let continue_on_malformed = file
            .continue_on_malformed
            .unwrap_or(cli.continue_on_malformed);

        Ok(Self {
            database,
            song_data,
            log_data,
            continue_on_malformed,
        })
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            continue_on_malformed: self.continue_on_malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_defaults() {
        let config = AppConfig::resolve(&CliConfig::default(), None).unwrap();

        assert_eq!(config.database, PathBuf::from("sparkify.db"));
        assert_eq!(config.song_data, PathBuf::from("data/song_data"));
        assert_eq!(config.log_data, PathBuf::from("data/log_data"));
        assert!(!config.continue_on_malformed);
    }

    #[test]
    fn test_resolve_cli_only() {
        let cli = CliConfig {
            database: Some(PathBuf::from("/tmp/warehouse.db")),
            song_data: Some(PathBuf::from("/data/songs")),
            log_data: Some(PathBuf::from("/data/logs")),
            continue_on_malformed: true,
        };

        let config = AppConfig::resolve(&cli, None).unwrap();

        assert_eq!(config.database, PathBuf::from("/tmp/warehouse.db"));
        assert_eq!(config.song_data, PathBuf::from("/data/songs"));
        assert_eq!(config.log_data, PathBuf::from("/data/logs"));
        assert!(config.continue_on_malformed);
    }

    #[test]
    fn test_toml_overrides_cli() {
        let cli = CliConfig {
            database: Some(PathBuf::from("/tmp/cli.db")),
            song_data: Some(PathBuf::from("/cli/songs")),
            log_data: None,
            continue_on_malformed: true,
        };
        let file = FileConfig {
            database: Some("/tmp/toml.db".to_string()),
            song_data: None,
            log_data: Some("/toml/logs".to_string()),
            continue_on_malformed: Some(false),
        };

        let config = AppConfig::resolve(&cli, Some(file)).unwrap();

        assert_eq!(config.database, PathBuf::from("/tmp/toml.db"));
        assert_eq!(config.song_data, PathBuf::from("/cli/songs"));
        assert_eq!(config.log_data, PathBuf::from("/toml/logs"));
        assert!(!config.continue_on_malformed);
    }

    #[test]
    fn test_database_directory_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let cli = CliConfig {
            database: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        let result = AppConfig::resolve(&cli, None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("database path is a directory"));
    }

    #[test]
    fn test_pipeline_options() {
        let cli = CliConfig {
            song_data: Some(PathBuf::from("songs")),
            log_data: Some(PathBuf::from("logs")),
            continue_on_malformed: true,
            ..Default::default()
        };
        let options = AppConfig::resolve(&cli, None).unwrap().pipeline_options();

        assert_eq!(options.song_data, PathBuf::from("songs"));
        assert_eq!(options.log_data, PathBuf::from("logs"));
        assert!(options.continue_on_malformed);
    }
}
