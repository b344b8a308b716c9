//! Sparkify ETL Library
//!
//! Extracts song metadata and user activity logs from JSON files and loads
//! them into the `songplays` star schema. The binaries are thin wrappers
//! around [`Pipeline`] and [`Warehouse`].

pub mod activity;
pub mod config;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod records;
pub mod resolver;
pub mod songs;
pub mod sqlite_persistence;
pub mod warehouse;

// Re-export commonly used types for convenience
pub use error::{EtlError, RecordError};
pub use pipeline::{Phase, PhaseReport, Pipeline, PipelineOptions, RunReport};
pub use warehouse::{TableCounts, Warehouse};
