//! Decoding of the two input file families into typed records.

mod log_event;
mod song_record;

pub use log_event::{parse_log_file, parse_log_lines, LogEvent, NEXT_SONG_PAGE};
pub use song_record::{parse_song_file, parse_song_str, SongRecord};

use crate::error::EtlError;
use std::path::Path;

fn read_file(path: &Path) -> Result<String, EtlError> {
    std::fs::read_to_string(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })
}
