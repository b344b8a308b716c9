//! SQLite-backed warehouse.
//!
//! A [`Warehouse`] owns the single connection used for a whole run. Writes go
//! through a [`FileTransaction`], one per input file, which rolls back on drop
//! unless it was committed.

use super::models::*;
use super::schema::latest_schema;
use super::trait_def::{SongLookup, WarehouseWriter};
use crate::error::{EtlError, StorageResultExt};
use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;
use tracing::{debug, info};

const UPSERT_ARTIST_SQL: &str = "INSERT INTO artists (artist_id, name, location, latitude, longitude)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(artist_id) DO UPDATE SET
        name = excluded.name,
        location = excluded.location,
        latitude = excluded.latitude,
        longitude = excluded.longitude";

const UPSERT_SONG_SQL: &str = "INSERT INTO songs (song_id, title, artist_id, year, duration)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(song_id) DO UPDATE SET
        title = excluded.title,
        artist_id = excluded.artist_id,
        year = excluded.year,
        duration = excluded.duration";

const UPSERT_USER_SQL: &str = "INSERT INTO users (user_id, first_name, last_name, gender, level)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT(user_id) DO UPDATE SET
        first_name = excluded.first_name,
        last_name = excluded.last_name,
        gender = excluded.gender,
        level = excluded.level";

const INSERT_TIME_SQL: &str = "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT(start_time) DO NOTHING";

const INSERT_SONGPLAY_SQL: &str = "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const FIND_SONG_SQL: &str = "SELECT s.song_id, s.artist_id
     FROM songs s
     JOIN artists a ON a.artist_id = s.artist_id
     WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
     ORDER BY s.song_id
     LIMIT 1";

/// Text form of `start_time`. Milliseconds are always written so that
/// stored values sort and compare as text.
const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn start_time_text(start_time: &NaiveDateTime) -> String {
    start_time.format(START_TIME_FORMAT).to_string()
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Gender::from_db_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown gender {:?}", s).into()))
    }
}

impl FromSql for Level {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        Level::from_db_str(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown level {:?}", s).into()))
    }
}

/// The songplays warehouse, backed by a single SQLite connection.
pub struct Warehouse {
    conn: Connection,
}

fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open_with_flags(
        db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
            | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
            | rusqlite::OpenFlags::SQLITE_OPEN_URI
            | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open warehouse database {:?}", db_path))?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

fn prepare_schema(conn: &Connection) -> Result<()> {
    let schema = latest_schema();

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;
    if table_count == 0 {
        info!("Creating warehouse schema at version {}", schema.version);
        schema.create(conn)?;
        return Ok(());
    }

    let db_version: i64 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    if db_version != schema.db_version() as i64 {
        bail!(
            "Unknown warehouse database version {}, expected {}. Recreate the tables first.",
            db_version,
            schema.db_version()
        );
    }
    schema
        .validate(conn)
        .context("Warehouse schema validation failed")
}

impl Warehouse {
    /// Open (or create) the warehouse at `db_path`.
    ///
    /// An empty database gets the schema created. An existing one must be at
    /// the current schema version and match the table definitions.
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_connection(db_path.as_ref())?;
        prepare_schema(&conn)?;
        let warehouse = Warehouse { conn };
        warehouse.log_counts()?;
        Ok(warehouse)
    }

    /// Drop every warehouse table at `db_path` and create them again.
    pub fn recreate<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = open_connection(db_path.as_ref())?;
        let warehouse = Warehouse { conn };
        warehouse.reset()?;
        Ok(warehouse)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        prepare_schema(&conn)?;
        Ok(Warehouse { conn })
    }

    /// Drop all tables (dependents first) and create the latest schema.
    pub fn reset(&self) -> Result<()> {
        let schema = latest_schema();
        info!("Dropping warehouse tables...");
        schema.drop_all(&self.conn)?;
        info!("Creating warehouse schema at version {}", schema.version);
        schema.create(&self.conn)?;
        Ok(())
    }

    /// Start the transaction holding one file's writes.
    pub fn begin_file(&mut self) -> Result<FileTransaction<'_>, EtlError> {
        let tx = self
            .conn
            .transaction()
            .storage_context("begin file transaction")?;
        Ok(FileTransaction { tx })
    }

    pub fn counts(&self) -> Result<TableCounts, EtlError> {
        let count = |table: &str| -> Result<usize, EtlError> {
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| {
                    r.get::<_, i64>(0)
                })
                .map(|n| n as usize)
                .storage_context(format!("count {}", table))
        };
        Ok(TableCounts {
            users: count("users")?,
            artists: count("artists")?,
            songs: count("songs")?,
            time: count("time")?,
            songplays: count("songplays")?,
        })
    }

    pub fn get_user(&self, user_id: i64) -> Result<Option<UserRow>, EtlError> {
        self.conn
            .query_row(
                "SELECT user_id, first_name, last_name, gender, level FROM users WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(UserRow {
                        user_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        gender: row.get(3)?,
                        level: row.get(4)?,
                    })
                },
            )
            .optional()
            .storage_context(format!("get user {}", user_id))
    }

    pub fn get_artist(&self, artist_id: &str) -> Result<Option<Artist>, EtlError> {
        self.conn
            .query_row(
                "SELECT artist_id, name, location, latitude, longitude FROM artists WHERE artist_id = ?1",
                params![artist_id],
                |row| {
                    Ok(Artist {
                        artist_id: row.get(0)?,
                        name: row.get(1)?,
                        location: row.get(2)?,
                        latitude: row.get(3)?,
                        longitude: row.get(4)?,
                    })
                },
            )
            .optional()
            .storage_context(format!("get artist {}", artist_id))
    }

    fn log_counts(&self) -> Result<()> {
        let counts = self.counts()?;
        info!(
            "Opened warehouse: {} users, {} artists, {} songs, {} time rows, {} songplays",
            counts.users, counts.artists, counts.songs, counts.time, counts.songplays
        );
        Ok(())
    }
}

impl SongLookup for Warehouse {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongRef>, EtlError> {
        find_song(&self.conn, title, artist_name, duration)
    }
}

/// Writes belonging to one input file.
///
/// Dropping it without calling [`FileTransaction::commit`] rolls back every
/// write made through it.
pub struct FileTransaction<'conn> {
    tx: Transaction<'conn>,
}

impl FileTransaction<'_> {
    pub fn commit(self) -> Result<(), EtlError> {
        self.tx.commit().storage_context("commit file transaction")
    }
}

impl WarehouseWriter for FileTransaction<'_> {
    fn upsert_artist(&self, artist: &Artist) -> Result<(), EtlError> {
        self.tx
            .prepare_cached(UPSERT_ARTIST_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    artist.artist_id,
                    artist.name,
                    artist.location,
                    artist.latitude,
                    artist.longitude
                ])
            })
            .storage_context(format!("upsert artist {}", artist.artist_id))?;
        Ok(())
    }

    fn upsert_song(&self, song: &Song) -> Result<(), EtlError> {
        self.tx
            .prepare_cached(UPSERT_SONG_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    song.song_id,
                    song.title,
                    song.artist_id,
                    song.year,
                    song.duration
                ])
            })
            .storage_context(format!("upsert song {}", song.song_id))?;
        Ok(())
    }

    fn upsert_user(&self, user: &UserRow) -> Result<(), EtlError> {
        self.tx
            .prepare_cached(UPSERT_USER_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    user.user_id,
                    user.first_name,
                    user.last_name,
                    user.gender.map(|g| g.as_str()),
                    user.level.as_str()
                ])
            })
            .storage_context(format!("upsert user {}", user.user_id))?;
        Ok(())
    }

    fn insert_time(&self, time: &TimeRow) -> Result<bool, EtlError> {
        let inserted = self
            .tx
            .prepare_cached(INSERT_TIME_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    start_time_text(&time.start_time),
                    time.hour,
                    time.day,
                    time.week,
                    time.month,
                    time.year,
                    time.weekday
                ])
            })
            .storage_context(format!("insert time {}", time.start_time))?;
        Ok(inserted > 0)
    }

    fn insert_songplay(&self, songplay: &Songplay) -> Result<i64, EtlError> {
        let (song_id, artist_id) = match &songplay.song {
            Some(song) => (Some(song.song_id.as_str()), Some(song.artist_id.as_str())),
            None => (None, None),
        };
        self.tx
            .prepare_cached(INSERT_SONGPLAY_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    start_time_text(&songplay.start_time),
                    songplay.user_id,
                    songplay.level.as_str(),
                    song_id,
                    artist_id,
                    songplay.session_id,
                    songplay.location,
                    songplay.user_agent
                ])
            })
            .storage_context(format!(
                "insert songplay of user {} at {}",
                songplay.user_id, songplay.start_time
            ))?;
        Ok(self.tx.last_insert_rowid())
    }
}

impl SongLookup for FileTransaction<'_> {
    fn find_song(
        &self,
        title: &str,
        artist_name: &str,
        duration: f64,
    ) -> Result<Option<SongRef>, EtlError> {
        find_song(&self.tx, title, artist_name, duration)
    }
}

fn find_song(
    conn: &Connection,
    title: &str,
    artist_name: &str,
    duration: f64,
) -> Result<Option<SongRef>, EtlError> {
    let found = conn
        .prepare_cached(FIND_SONG_SQL)
        .and_then(|mut stmt| {
            stmt.query_row(params![title, artist_name, duration], |row| {
                Ok(SongRef {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            })
            .optional()
        })
        .storage_context(format!("find song {:?} by {:?}", title, artist_name))?;
    if found.is_none() {
        debug!(
            "No song matches {:?} by {:?} ({}s)",
            title, artist_name, duration
        );
    }
    Ok(found)
}
