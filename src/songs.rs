//! Loading of song metadata into the artists and songs dimensions.

use crate::error::EtlError;
use crate::records::SongRecord;
use crate::warehouse::WarehouseWriter;

/// Writes the artist, then the song described by one song file.
///
/// Both writes are upserts, so loading the same record twice leaves the
/// dimensions unchanged and a later record for the same id wins.
pub fn load_song_record<W: WarehouseWriter + ?Sized>(
    writer: &W,
    record: &SongRecord,
) -> Result<(), EtlError> {
    writer.upsert_artist(&record.artist())?;
    writer.upsert_song(&record.song())?;
    Ok(())
}
