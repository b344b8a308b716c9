//! Orchestration of the two load phases.
//!
//! Each phase discovers its files, then loads them one at a time. Every file
//! gets its own transaction: a file either lands completely or not at all,
//! and files committed before a failure stay committed.

use crate::activity::{load_activity_batch, ActivityBatch, ActivitySummary};
use crate::error::EtlError;
use crate::locator::{find_files, DATA_FILE_EXTENSION};
use crate::records::{parse_log_file, parse_song_file};
use crate::songs::load_song_record;
use crate::warehouse::{TableCounts, Warehouse};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Songs,
    Logs,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Songs => write!(f, "songs"),
            Phase::Logs => write!(f, "logs"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineOptions {
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    /// Skip files whose content is malformed instead of halting the run.
    pub continue_on_malformed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseReport {
    pub phase: Phase,
    pub files_found: usize,
    pub files_loaded: usize,
    pub skipped: Vec<PathBuf>,
    /// Always empty for the songs phase.
    pub activity: ActivitySummary,
}

impl PhaseReport {
    fn new(phase: Phase, files_found: usize) -> Self {
        PhaseReport {
            phase,
            files_found,
            files_loaded: 0,
            skipped: Vec::new(),
            activity: ActivitySummary::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub songs: PhaseReport,
    pub logs: PhaseReport,
    pub counts: TableCounts,
}

pub struct Pipeline {
    warehouse: Warehouse,
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(warehouse: Warehouse, options: PipelineOptions) -> Self {
        Pipeline { warehouse, options }
    }

    pub fn warehouse(&self) -> &Warehouse {
        &self.warehouse
    }

    fn root(&self, phase: Phase) -> &Path {
        match phase {
            Phase::Songs => &self.options.song_data,
            Phase::Logs => &self.options.log_data,
        }
    }

    /// Loads the song files, then the activity logs.
    pub fn run(&mut self) -> Result<RunReport, EtlError> {
        let songs = self.run_phase(Phase::Songs)?;
        let logs = self.run_phase(Phase::Logs)?;
        let counts = self.warehouse.counts()?;
        Ok(RunReport {
            songs,
            logs,
            counts,
        })
    }

    pub fn run_phase(&mut self, phase: Phase) -> Result<PhaseReport, EtlError> {
        let root = self.root(phase).to_path_buf();
        let files = find_files(&root, DATA_FILE_EXTENSION)?;
        let total = files.len();
        info!("{} files found in {}", total, root.display());

        let mut report = PhaseReport::new(phase, total);
        for (i, path) in files.iter().enumerate() {
            match self.load_file(phase, path) {
                Ok(activity) => {
                    report.files_loaded += 1;
                    report.activity += activity;
                }
                Err(e) if e.is_malformed_record() && self.options.continue_on_malformed => {
                    warn!("Skipping {}: {}", path.display(), e);
                    report.skipped.push(path.clone());
                }
                Err(e) => {
                    error!("Failed to load {}: {}", path.display(), e);
                    return Err(e);
                }
            }
            info!("{}/{} files processed.", i + 1, total);
        }

        info!(
            "Finished {} phase: {} loaded, {} skipped",
            phase,
            report.files_loaded,
            report.skipped.len()
        );
        Ok(report)
    }

    /// Parses and loads one file inside its own transaction. Any error drops
    /// the transaction before it is committed.
    fn load_file(&mut self, phase: Phase, path: &Path) -> Result<ActivitySummary, EtlError> {
        match phase {
            Phase::Songs => {
                let record = parse_song_file(path)?;
                let tx = self.warehouse.begin_file()?;
                load_song_record(&tx, &record)?;
                tx.commit()?;
                Ok(ActivitySummary::default())
            }
            Phase::Logs => {
                let events = parse_log_file(path)?;
                let batch =
                    ActivityBatch::from_events(&events).map_err(|e| EtlError::malformed(path, e))?;
                let tx = self.warehouse.begin_file()?;
                let summary = load_activity_batch(&tx, batch)?;
                tx.commit()?;
                Ok(summary)
            }
        }
    }
}
