use crate::error::{EtlError, RecordError};
use crate::records::LogEvent;
use crate::resolver::resolve_reference;
use crate::warehouse::{Level, SongLookup, Songplay, TimeRow, UserRow, WarehouseWriter};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::ops::AddAssign;
use tracing::debug;

use super::time::start_time_from_millis;

/// A `NextSong` event with every field a songplay needs.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayEvent {
    pub start_time: NaiveDateTime,
    pub user: UserRow,
    pub session_id: i64,
    pub song: String,
    pub artist: String,
    pub length: f64,
    pub location: String,
    pub user_agent: String,
}

fn required<T: Clone>(
    value: &Option<T>,
    event: usize,
    field: &'static str,
) -> Result<T, RecordError> {
    value
        .clone()
        .ok_or(RecordError::MissingField { event, field })
}

impl PlayEvent {
    /// Projects the `index`-th event (1-based) of a file into a play.
    pub fn from_event(index: usize, event: &LogEvent) -> Result<Self, RecordError> {
        let start_time = start_time_from_millis(event.ts).ok_or(
            RecordError::TimestampOutOfRange {
                event: index,
                ts: event.ts,
            },
        )?;
        let user = UserRow {
            user_id: required(&event.user_id, index, "userId")?,
            first_name: required(&event.first_name, index, "firstName")?,
            last_name: required(&event.last_name, index, "lastName")?,
            gender: event.gender,
            level: event.level,
        };
        Ok(PlayEvent {
            start_time,
            user,
            session_id: event.session_id,
            song: required(&event.song, index, "song")?,
            artist: required(&event.artist, index, "artist")?,
            length: required(&event.length, index, "length")?,
            location: required(&event.location, index, "location")?,
            user_agent: required(&event.user_agent, index, "userAgent")?,
        })
    }

    pub fn user_id(&self) -> i64 {
        self.user.user_id
    }

    pub fn level(&self) -> Level {
        self.user.level
    }
}

/// Rows derived from the plays of one activity log, ready to be resolved.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityBatch {
    /// Number of events in the log, plays or not.
    pub events: usize,
    /// One per play, in log order. Repeated start times are kept.
    pub time_rows: Vec<TimeRow>,
    /// One per user, carrying the values of the user's last play.
    pub user_rows: Vec<UserRow>,
    pub plays: Vec<PlayEvent>,
}

impl ActivityBatch {
    /// Keeps the `NextSong` events and derives the time and user rows from
    /// them. Other events never reach the user dimension.
    pub fn from_events(events: &[LogEvent]) -> Result<Self, RecordError> {
        let plays = events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.is_next_song())
            .map(|(idx, event)| PlayEvent::from_event(idx + 1, event))
            .collect::<Result<Vec<_>, _>>()?;

        let time_rows = plays
            .iter()
            .map(|play| TimeRow::from_start_time(play.start_time))
            .collect();

        Ok(ActivityBatch {
            events: events.len(),
            time_rows,
            user_rows: latest_user_rows(&plays),
            plays,
        })
    }

    /// Looks up the song and artist of every play.
    pub fn resolve<L: SongLookup + ?Sized>(self, lookup: &L) -> Result<ResolvedActivity, EtlError> {
        let mut songplays = Vec::with_capacity(self.plays.len());
        for play in &self.plays {
            let song = resolve_reference(lookup, play)?;
            songplays.push(Songplay {
                start_time: play.start_time,
                user_id: play.user_id(),
                level: play.level(),
                song,
                session_id: play.session_id,
                location: play.location.clone(),
                user_agent: play.user_agent.clone(),
            });
        }
        Ok(ResolvedActivity {
            events: self.events,
            time_rows: self.time_rows,
            user_rows: self.user_rows,
            songplays,
        })
    }
}

/// The last row seen for each user, ordered by that last occurrence.
fn latest_user_rows(plays: &[PlayEvent]) -> Vec<UserRow> {
    let mut seen = HashSet::new();
    let mut rows: Vec<UserRow> = plays
        .iter()
        .rev()
        .filter(|play| seen.insert(play.user_id()))
        .map(|play| play.user.clone())
        .collect();
    rows.reverse();
    rows
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedActivity {
    pub events: usize,
    pub time_rows: Vec<TimeRow>,
    pub user_rows: Vec<UserRow>,
    pub songplays: Vec<Songplay>,
}

impl ResolvedActivity {
    pub fn resolved_count(&self) -> usize {
        self.songplays.iter().filter(|p| p.song.is_some()).count()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActivitySummary {
    pub events: usize,
    pub plays: usize,
    pub users: usize,
    /// Plays matched to a known song.
    pub resolved: usize,
    /// Time rows that did not exist yet.
    pub times_inserted: usize,
}

impl AddAssign for ActivitySummary {
    fn add_assign(&mut self, other: Self) {
        self.events += other.events;
        self.plays += other.plays;
        self.users += other.users;
        self.resolved += other.resolved;
        self.times_inserted += other.times_inserted;
    }
}

/// Resolves and writes one batch: time rows, then users, then songplays.
pub fn load_activity_batch<W>(writer: &W, batch: ActivityBatch) -> Result<ActivitySummary, EtlError>
where
    W: WarehouseWriter + SongLookup + ?Sized,
{
    let resolved = batch.resolve(writer)?;

    let mut times_inserted = 0;
    for time in &resolved.time_rows {
        if writer.insert_time(time)? {
            times_inserted += 1;
        }
    }
    for user in &resolved.user_rows {
        writer.upsert_user(user)?;
    }
    for songplay in &resolved.songplays {
        let songplay_id = writer.insert_songplay(songplay)?;
        debug!(
            "Inserted songplay {} (user {}, resolved: {})",
            songplay_id,
            songplay.user_id,
            songplay.song.is_some()
        );
    }

    Ok(ActivitySummary {
        events: resolved.events,
        plays: resolved.songplays.len(),
        users: resolved.user_rows.len(),
        resolved: resolved.resolved_count(),
        times_inserted,
    })
}
