use crate::activity::PlayEvent;
use crate::error::EtlError;
use crate::warehouse::{SongLookup, SongRef};

/// Finds the song/artist pair a play refers to.
///
/// A miss is not an error: the play is still recorded, without references.
pub fn resolve_reference<L: SongLookup + ?Sized>(
    lookup: &L,
    play: &PlayEvent,
) -> Result<Option<SongRef>, EtlError> {
    lookup.find_song(&play.song, &play.artist, play.length)
}
