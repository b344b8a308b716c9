use super::read_file;
use crate::error::{EtlError, RecordError};
use crate::warehouse::{Artist, Song};
use serde::Deserialize;
use std::path::Path;

/// One song metadata file. Each file holds exactly one song.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SongRecord {
    pub num_songs: u32,
    pub artist_id: String,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub artist_location: String,
    pub artist_name: String,
    pub song_id: String,
    pub title: String,
    pub duration: f64,
    /// 0 when unknown.
    pub year: i32,
}

impl SongRecord {
    pub fn artist(&self) -> Artist {
        Artist {
            artist_id: self.artist_id.clone(),
            name: self.artist_name.clone(),
            location: self.artist_location.clone(),
            latitude: self.artist_latitude,
            longitude: self.artist_longitude,
        }
    }

    pub fn song(&self) -> Song {
        Song {
            song_id: self.song_id.clone(),
            title: self.title.clone(),
            artist_id: self.artist_id.clone(),
            year: self.year,
            duration: self.duration,
        }
    }
}

pub fn parse_song_str(content: &str) -> Result<SongRecord, RecordError> {
    serde_json::from_str(content.trim()).map_err(RecordError::InvalidJson)
}

pub fn parse_song_file(path: &Path) -> Result<SongRecord, EtlError> {
    let content = read_file(path)?;
    parse_song_str(&content).map_err(|e| EtlError::malformed(path, e))
}
