//! On-disk input trees for end-to-end tests
//!
//! Every fixture lives in its own temporary directory holding a `song_data`
//! root, a `log_data` root and the warehouse database path.

use super::constants::*;
use serde_json::{json, Value};
use sparkify_etl::PipelineOptions;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestData {
    pub dir: TempDir,
    pub song_data: PathBuf,
    pub log_data: PathBuf,
    pub db_path: PathBuf,
}

impl TestData {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let song_data = dir.path().join("song_data");
        let log_data = dir.path().join("log_data");
        fs::create_dir_all(&song_data).unwrap();
        fs::create_dir_all(&log_data).unwrap();
        let db_path = dir.path().join("sparkify.db");
        TestData {
            dir,
            song_data,
            log_data,
            db_path,
        }
    }

    pub fn options(&self) -> PipelineOptions {
        PipelineOptions {
            song_data: self.song_data.clone(),
            log_data: self.log_data.clone(),
            continue_on_malformed: false,
        }
    }

    /// Writes a song file under `song_data/<A>/<B>/<C>/`, like the real
    /// dataset does, using the first letters of the track id.
    pub fn write_song(&self, track_id: &str, song: &Value) -> PathBuf {
        let letters: Vec<String> = track_id.chars().skip(2).take(3).map(String::from).collect();
        let dir = letters
            .iter()
            .fold(self.song_data.clone(), |dir, letter| dir.join(letter));
        write_file(&dir, &format!("{}.json", track_id), &song.to_string())
    }

    pub fn write_log(&self, name: &str, events: &[Value]) -> PathBuf {
        let lines: Vec<String> = events.iter().map(Value::to_string).collect();
        self.write_raw_log(name, &lines.join("\n"))
    }

    pub fn write_raw_log(&self, name: &str, content: &str) -> PathBuf {
        write_file(&self.log_data.join("2018/11"), name, content)
    }
}

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn casual_song() -> Value {
    json!({
        "num_songs": 1,
        "artist_id": CASUAL_ARTIST_ID,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "California - LA",
        "artist_name": CASUAL_ARTIST_NAME,
        "song_id": CASUAL_SONG_ID,
        "title": CASUAL_SONG_TITLE,
        "duration": CASUAL_SONG_DURATION,
        "year": 0
    })
}

pub fn renaud_song() -> Value {
    json!({
        "num_songs": 1,
        "artist_id": RENAUD_ARTIST_ID,
        "artist_latitude": 35.14968,
        "artist_longitude": -90.04892,
        "artist_location": "Memphis, TN",
        "artist_name": "Line Renaud",
        "song_id": RENAUD_SONG_ID,
        "title": "Der Kleine Dompfaff",
        "duration": 152.92036,
        "year": 0
    })
}

/// A `NextSong` event by [`USER_ID`] playing the Casual song.
pub fn next_song_event(ts: i64, level: &str) -> Value {
    json!({
        "artist": CASUAL_ARTIST_NAME,
        "auth": "Logged In",
        "firstName": "Jacob",
        "gender": "M",
        "itemInSession": 0,
        "lastName": "Klein",
        "length": CASUAL_SONG_DURATION,
        "level": level,
        "location": "Tampa-St. Petersburg-Clearwater, FL",
        "method": "PUT",
        "page": "NextSong",
        "registration": 1540558108796.0,
        "sessionId": SESSION_ID,
        "song": CASUAL_SONG_TITLE,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)",
        "userId": USER_ID.to_string()
    })
}

/// A `NextSong` event for a song the warehouse does not know.
pub fn unknown_song_event(ts: i64, user_id: i64) -> Value {
    let mut event = next_song_event(ts, "free");
    event["song"] = json!("Not In The Catalog");
    event["artist"] = json!("Nobody");
    event["length"] = json!(123.45);
    event["userId"] = json!(user_id.to_string());
    event["firstName"] = json!("Lily");
    event["lastName"] = json!("Koch");
    event["gender"] = json!("F");
    event
}

pub fn home_event(ts: i64) -> Value {
    json!({
        "artist": null,
        "auth": "Logged Out",
        "firstName": null,
        "gender": null,
        "itemInSession": 0,
        "lastName": null,
        "length": null,
        "level": "free",
        "location": null,
        "method": "GET",
        "page": "Home",
        "registration": null,
        "sessionId": 33,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": null,
        "userId": ""
    })
}
