use super::read_file;
use crate::error::{EtlError, RecordError};
use crate::warehouse::{Gender, Level};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// Page value of events that represent a song being played.
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// One line of an activity log.
///
/// Only `NextSong` events are guaranteed to carry the song and user fields,
/// so those are optional here and checked when the event is projected.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LogEvent {
    pub artist: Option<String>,
    pub auth: String,
    pub first_name: Option<String>,
    pub gender: Option<Gender>,
    pub item_in_session: u32,
    pub last_name: Option<String>,
    pub length: Option<f64>,
    pub level: Level,
    pub location: Option<String>,
    pub method: String,
    pub page: String,
    pub registration: Option<f64>,
    pub session_id: i64,
    pub song: Option<String>,
    pub status: u16,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    pub user_agent: Option<String>,
    /// Empty for logged out sessions.
    #[serde(deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
}

impl LogEvent {
    pub fn is_next_song(&self) -> bool {
        self.page == NEXT_SONG_PAGE
    }
}

/// The logs carry user ids as strings, occasionally as numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Number(i64),
    Text(String),
}

fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawUserId>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawUserId::Number(n)) => Ok(Some(n)),
        Some(RawUserId::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid userId {:?}", s)))
        }
    }
}

/// Parses newline delimited events. Blank lines are skipped, any other line
/// that fails to decode fails the whole content.
pub fn parse_log_lines(content: &str) -> Result<Vec<LogEvent>, RecordError> {
    let mut events = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line)
            .map_err(|source| RecordError::InvalidLine { line: idx + 1, source })?;
        events.push(event);
    }
    Ok(events)
}

pub fn parse_log_file(path: &Path) -> Result<Vec<LogEvent>, EtlError> {
    let content = read_file(path)?;
    parse_log_lines(&content).map_err(|e| EtlError::malformed(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXT_SONG_EVENT: &str = r#"{"artist":"Casual","auth":"Logged In","firstName":"Jacob","gender":"M","itemInSession":0,"lastName":"Klein","length":218.93179,"level":"paid","location":"Tampa-St. Petersburg-Clearwater, FL","method":"PUT","page":"NextSong","registration":1540558108796.0,"sessionId":518,"song":"I Didn't Mean To","status":200,"ts":1541105830796,"userAgent":"\"Mozilla\/5.0 (Macintosh)\"","userId":"73"}"#;

    const HOME_EVENT: &str = r#"{"artist":null,"auth":"Logged Out","firstName":null,"gender":null,"itemInSession":0,"lastName":null,"length":null,"level":"free","location":null,"method":"GET","page":"Home","registration":null,"sessionId":33,"song":null,"status":200,"ts":1541106106796,"userAgent":null,"userId":""}"#;

    #[test]
    fn parses_next_song_event() {
        let events = parse_log_lines(NEXT_SONG_EVENT).unwrap();
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert!(event.is_next_song());
        assert_eq!(event.user_id, Some(73));
        assert_eq!(event.first_name.as_deref(), Some("Jacob"));
        assert_eq!(event.gender, Some(Gender::M));
        assert_eq!(event.level, Level::Paid);
        assert_eq!(event.session_id, 518);
        assert_eq!(event.length, Some(218.93179));
        assert_eq!(event.ts, 1541105830796);
        assert_eq!(event.user_agent.as_deref(), Some("\"Mozilla/5.0 (Macintosh)\""));
    }

    #[test]
    fn logged_out_event_has_no_user() {
        let events = parse_log_lines(HOME_EVENT).unwrap();
        assert!(!events[0].is_next_song());
        assert_eq!(events[0].user_id, None);
        assert_eq!(events[0].gender, None);
    }

    #[test]
    fn numeric_user_id_is_accepted() {
        let line = NEXT_SONG_EVENT.replace("\"userId\":\"73\"", "\"userId\":73");
        let events = parse_log_lines(&line).unwrap();
        assert_eq!(events[0].user_id, Some(73));
    }

    #[test]
    fn non_numeric_user_id_is_rejected() {
        let line = NEXT_SONG_EVENT.replace("\"userId\":\"73\"", "\"userId\":\"abc\"");
        assert!(parse_log_lines(&line).is_err());
    }

    #[test]
    fn keeps_line_order_and_skips_blank_lines() {
        let content = format!("{}\n\n{}\n", NEXT_SONG_EVENT, HOME_EVENT);
        let events = parse_log_lines(&content).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].page, "NextSong");
        assert_eq!(events[1].page, "Home");
    }

    #[test]
    fn reports_the_failing_line() {
        let content = format!("{}\n{{\"page\": \"Home\"}}\n", NEXT_SONG_EVENT);
        match parse_log_lines(&content) {
            Err(RecordError::InvalidLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected invalid line, got {:?}", other),
        }
    }

    #[test]
    fn unknown_level_is_rejected() {
        let line = NEXT_SONG_EVENT.replace("\"level\":\"paid\"", "\"level\":\"gold\"");
        assert!(parse_log_lines(&line).is_err());
    }

    #[test]
    fn empty_file_has_no_events() {
        assert!(parse_log_lines("").unwrap().is_empty());
        assert!(parse_log_lines("\n  \n").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let err = parse_log_file(&temp_dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, EtlError::Io { .. }));
    }
}
