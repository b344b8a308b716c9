//! Seams between the pipeline stages and the store.

use super::models::{Artist, Song, SongRef, Songplay, TimeRow, UserRow};
use crate::error::EtlError;

/// Row-at-a-time writes into the warehouse.
///
/// Every call is one statement. Callers are responsible for ordering writes
/// so that referenced rows exist first.
pub trait WarehouseWriter {
    /// Insert or overwrite an artist.
    fn upsert_artist(&self, artist: &Artist) -> Result<(), EtlError>;

    /// Insert or overwrite a song. The artist must already exist.
    fn upsert_song(&self, song: &Song) -> Result<(), EtlError>;

    /// Insert or overwrite a user.
    fn upsert_user(&self, user: &UserRow) -> Result<(), EtlError>;

    /// Insert a time row unless one exists for the same start time.
    /// Returns whether a row was inserted.
    fn insert_time(&self, time: &TimeRow) -> Result<bool, EtlError>;

    /// Append a songplay and return its generated id.
    fn insert_songplay(&self, songplay: &Songplay) -> Result<i64, EtlError>;
}

/// Exact lookup of a song/artist pair from descriptive fields.
pub trait SongLookup {
    /// Returns the first song whose title, artist name and duration are all
    /// equal to the given values. Durations are compared exactly.
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongRef>, EtlError>;
}
